//! Configuration resolution: explicit flag, then environment, then default.

use std::path::PathBuf;
use std::time::Duration;

pub const DOCS_ENV: &str = "CAPSTAN_DOCS";
pub const REQUEST_TIMEOUT_ENV: &str = "CAPSTAN_REQUEST_TIMEOUT";
pub const HTTP_TIMEOUT_ENV: &str = "CAPSTAN_HTTP_TIMEOUT";
pub const SESSION_IDLE_ENV: &str = "CAPSTAN_SESSION_IDLE_TIMEOUT";

pub const DEFAULT_DOCS_PATH: &str = "README.md";
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;

/// Everything the built-in capabilities and transports need at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Document served by `docs://readme`.
    pub docs_path: PathBuf,
    /// Deadline applied to each capability invocation.
    pub request_timeout: Duration,
    /// Timeout of the outbound client behind `http_request`.
    pub http_timeout: Duration,
    /// HTTP sessions with no traffic for this long are closed.
    pub session_idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            docs_path: PathBuf::from(DEFAULT_DOCS_PATH),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            session_idle_timeout: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
        }
    }
}

impl ServerConfig {
    pub fn resolve(docs: Option<&str>, request_timeout_secs: Option<u64>) -> Self {
        Self {
            docs_path: resolve_docs_path(docs),
            request_timeout: resolve_request_timeout(request_timeout_secs),
            http_timeout: resolve_http_timeout(),
            session_idle_timeout: resolve_session_idle_timeout(),
        }
    }
}

pub fn resolve_docs_path(explicit: Option<&str>) -> PathBuf {
    if let Some(path) = explicit {
        return PathBuf::from(path);
    }

    if let Ok(env_path) = std::env::var(DOCS_ENV) {
        if !env_path.is_empty() {
            return PathBuf::from(env_path);
        }
    }

    PathBuf::from(DEFAULT_DOCS_PATH)
}

/// A zero deadline would expire every call at its first await, so an explicit
/// `0` is ignored like a bad environment value.
pub fn resolve_request_timeout(explicit: Option<u64>) -> Duration {
    let secs = match explicit {
        Some(0) => {
            tracing::warn!("Ignoring request timeout of 0s");
            secs_from_env(REQUEST_TIMEOUT_ENV)
        }
        Some(secs) => secs,
        None => secs_from_env(REQUEST_TIMEOUT_ENV),
    };
    Duration::from_secs(secs)
}

pub fn resolve_http_timeout() -> Duration {
    Duration::from_secs(secs_from_env(HTTP_TIMEOUT_ENV))
}

pub fn resolve_session_idle_timeout() -> Duration {
    let raw = std::env::var(SESSION_IDLE_ENV).ok();
    Duration::from_secs(parse_secs_or(
        SESSION_IDLE_ENV,
        raw.as_deref(),
        DEFAULT_SESSION_IDLE_SECS,
    ))
}

fn secs_from_env(var: &str) -> u64 {
    parse_secs(var, std::env::var(var).ok().as_deref())
}

fn parse_secs(var: &str, raw: Option<&str>) -> u64 {
    parse_secs_or(var, raw, DEFAULT_TIMEOUT_SECS)
}

/// Zero and unparseable values fall back to `default`.
fn parse_secs_or(var: &str, raw: Option<&str>, default: u64) -> u64 {
    match raw.map(str::trim) {
        None | Some("") => default,
        Some(s) => match s.parse::<u64>() {
            Ok(secs) if secs > 0 => secs,
            _ => {
                tracing::warn!("Ignoring invalid {var}={s}, using {default}s");
                default
            }
        },
    }
}
