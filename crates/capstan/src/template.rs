//! URI templates with `{placeholder}` segments.
//!
//! Matching is segment-wise on `/`. A literal segment must match exactly; a
//! placeholder segment (`prefix{name}suffix`) matches any token with the same
//! prefix and suffix and a non-empty middle.

use std::collections::HashSet;
use std::fmt;

use crate::error::ConfigError;

/// Placeholder values captured from a URI, in template order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriParams(Vec<(String, String)>);

impl UriParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder {
        prefix: String,
        name: String,
        suffix: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    pattern: String,
    segments: Vec<Segment>,
}

impl UriTemplate {
    pub fn parse(pattern: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidTemplate {
            template: pattern.to_string(),
            reason: reason.to_string(),
        };

        let mut names = HashSet::new();
        let mut segments = Vec::new();

        for raw in pattern.split('/') {
            let open = raw.find('{');
            let close = raw.find('}');
            let segment = match (open, close) {
                (None, None) => Segment::Literal(raw.to_string()),
                (Some(open), Some(close)) if open < close => {
                    let name = &raw[open + 1..close];
                    let suffix = &raw[close + 1..];
                    if name.is_empty() {
                        return Err(invalid("empty placeholder name"));
                    }
                    if suffix.contains('{') || suffix.contains('}') || raw[..open].contains('}') {
                        return Err(invalid("at most one placeholder per segment"));
                    }
                    if !names.insert(name.to_string()) {
                        return Err(invalid("duplicate placeholder name"));
                    }
                    Segment::Placeholder {
                        prefix: raw[..open].to_string(),
                        name: name.to_string(),
                        suffix: suffix.to_string(),
                    }
                }
                _ => return Err(invalid("unbalanced braces")),
            };
            segments.push(segment);
        }

        if names.is_empty() {
            return Err(invalid("no placeholder"));
        }

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Match a concrete URI, returning the captured placeholder values.
    pub fn matches(&self, uri: &str) -> Option<UriParams> {
        let tokens: Vec<&str> = uri.split('/').collect();
        if tokens.len() != self.segments.len() {
            return None;
        }

        let mut params = Vec::new();
        for (segment, token) in self.segments.iter().zip(tokens) {
            match segment {
                Segment::Literal(lit) => {
                    if lit != token {
                        return None;
                    }
                }
                Segment::Placeholder {
                    prefix,
                    name,
                    suffix,
                } => {
                    let value = token.strip_prefix(prefix.as_str())?;
                    let value = value.strip_suffix(suffix.as_str())?;
                    if value.is_empty() {
                        return None;
                    }
                    params.push((name.clone(), value.to_string()));
                }
            }
        }

        Some(UriParams(params))
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dynamic_resource_match() {
        let t = UriTemplate::parse("test://dynamic/resource/{id}").unwrap();
        let params = t.matches("test://dynamic/resource/42").unwrap();
        assert_eq!(params.get("id"), Some("42"));
    }

    #[test]
    fn test_literal_prefix_must_match() {
        let t = UriTemplate::parse("test://dynamic/resource/{id}").unwrap();
        assert!(t.matches("other://dynamic/resource/42").is_none());
        assert!(t.matches("test://static/resource/42").is_none());
    }

    #[test]
    fn test_placeholder_must_be_non_empty() {
        let t = UriTemplate::parse("test://dynamic/resource/{id}").unwrap();
        assert!(t.matches("test://dynamic/resource/").is_none());
        assert!(t.matches("test://dynamic/resource").is_none());
    }

    #[test]
    fn test_extra_segments_do_not_match() {
        let t = UriTemplate::parse("test://dynamic/resource/{id}").unwrap();
        assert!(t.matches("test://dynamic/resource/42/extra").is_none());
    }

    #[test]
    fn test_placeholder_with_suffix() {
        let t = UriTemplate::parse("file:///documents/{name}.text").unwrap();
        let params = t.matches("file:///documents/notes.text").unwrap();
        assert_eq!(params.get("name"), Some("notes"));
        assert!(t.matches("file:///documents/.text").is_none());
        assert!(t.matches("file:///documents/notes.md").is_none());
    }

    #[test]
    fn test_multiple_placeholders() {
        let t = UriTemplate::parse("github://repos/{owner}/{repo}").unwrap();
        let params = t.matches("github://repos/org1/project1").unwrap();
        let captured: Vec<_> = params.iter().collect();
        assert_eq!(captured, vec![("owner", "org1"), ("repo", "project1")]);
    }

    #[test]
    fn test_invalid_templates() {
        assert!(UriTemplate::parse("test://plain").is_err());
        assert!(UriTemplate::parse("test://{unclosed").is_err());
        assert!(UriTemplate::parse("test://{}").is_err());
        assert!(UriTemplate::parse("test://{a}{b}").is_err());
        assert!(UriTemplate::parse("test://{a}/{a}").is_err());
    }
}
