//! Member and resource identity.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors for member key handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemberError {
    /// Composite key is missing the `request_id:session_id` separator
    #[error("Malformed member key (expected request_id:session_id): {0}")]
    MalformedKey(String),
}

/// One independently admission-controlled entity, e.g. one movie's queue.
///
/// Derived from the key namespace; there is no stored resource entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
    /// Kind of resource, e.g. "movie"
    pub resource_type: String,
    /// Identifier within the kind, e.g. "42"
    pub resource_id: String,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.resource_id)
    }
}

/// A waiting or active participant.
///
/// `request_id` is the stable identity used for addressed notifications;
/// `session_id` is an opaque client session token. On the wire and in the
/// store the pair is one composite key `request_id:session_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Member {
    pub request_id: String,
    pub session_id: String,
}

impl Member {
    pub fn new(request_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            session_id: session_id.into(),
        }
    }

    /// Composite store key, `request_id:session_id`.
    pub fn composite_key(&self) -> String {
        format!("{}:{}", self.request_id, self.session_id)
    }

    /// Parse a composite key. The first `:` splits the pair; session ids
    /// may themselves contain `:`.
    pub fn parse(composite: &str) -> Result<Self, MemberError> {
        match composite.split_once(':') {
            Some((request_id, session_id)) if !request_id.is_empty() => Ok(Self {
                request_id: request_id.to_string(),
                session_id: session_id.to_string(),
            }),
            _ => Err(MemberError::MalformedKey(composite.to_string())),
        }
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.request_id, self.session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_round_trip() {
        let member = Member::new("req-1", "sess-9");
        let parsed = Member::parse(&member.composite_key()).unwrap();
        assert_eq!(parsed, member);
    }

    #[test]
    fn session_id_may_contain_separator() {
        let parsed = Member::parse("req:a:b").unwrap();
        assert_eq!(parsed.request_id, "req");
        assert_eq!(parsed.session_id, "a:b");
    }

    #[test]
    fn missing_separator_is_malformed() {
        assert!(matches!(
            Member::parse("no-separator"),
            Err(MemberError::MalformedKey(_))
        ));
        assert!(matches!(
            Member::parse(":starts-with-separator"),
            Err(MemberError::MalformedKey(_))
        ));
    }
}
