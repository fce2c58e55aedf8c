//! Downstream target references.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

const LOCAL_PREFIX: &str = "local:";

/// Stable reference to a downstream handler.
///
/// Parsed from `local:<name>` or an `http://` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerRef {
    /// Handler registered in-process under this name.
    Local(String),
    /// Envelope endpoint reachable over HTTP.
    Http(Url),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("empty handler reference")]
    Empty,

    #[error("local handler reference has no name")]
    EmptyName,

    #[error("unsupported scheme '{0}' (expected 'local:' or 'http://')")]
    UnsupportedScheme(String),

    #[error("invalid handler URL: {0}")]
    InvalidUrl(String),
}

impl FromStr for HandlerRef {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TargetError::Empty);
        }

        if let Some(name) = s.strip_prefix(LOCAL_PREFIX) {
            if name.is_empty() {
                return Err(TargetError::EmptyName);
            }
            return Ok(HandlerRef::Local(name.to_string()));
        }

        let url = Url::parse(s).map_err(|e| TargetError::InvalidUrl(e.to_string()))?;
        if url.scheme() != "http" {
            return Err(TargetError::UnsupportedScheme(url.scheme().to_string()));
        }
        if url.host_str().is_none() {
            return Err(TargetError::InvalidUrl(format!("'{}' has no host", s)));
        }
        Ok(HandlerRef::Http(url))
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerRef::Local(name) => write!(f, "{}{}", LOCAL_PREFIX, name),
            HandlerRef::Http(url) => write!(f, "{}", url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local() {
        let target: HandlerRef = "local:greeting".parse().unwrap();
        assert_eq!(target, HandlerRef::Local("greeting".into()));
        assert_eq!(target.to_string(), "local:greeting");
    }

    #[test]
    fn test_parse_http() {
        let target: HandlerRef = "http://127.0.0.1:3000/_invoke".parse().unwrap();
        match &target {
            HandlerRef::Http(url) => assert_eq!(url.port(), Some(3000)),
            other => panic!("unexpected target {:?}", other),
        }
        assert_eq!(target.to_string(), "http://127.0.0.1:3000/_invoke");
    }

    #[test]
    fn test_rejects_bad_references() {
        assert_eq!("".parse::<HandlerRef>(), Err(TargetError::Empty));
        assert_eq!("local:".parse::<HandlerRef>(), Err(TargetError::EmptyName));
        assert_eq!(
            "https://example.com/".parse::<HandlerRef>(),
            Err(TargetError::UnsupportedScheme("https".into()))
        );
        assert!(matches!(
            "HelloHandler".parse::<HandlerRef>(),
            Err(TargetError::InvalidUrl(_))
        ));
    }
}
