//! Key namespace for admission state on the shared store.
//!
//! Layout:
//! - `turnstile:active:{type}:{id}`            unordered set of composite members
//! - `turnstile:waiting:{type}:{id}`           score-ordered waiting queue
//! - `turnstile:session:{type}:{id}:{member}`  TTL expiry marker per active member
//! - `turnstile:replica:{uuid}`                replica heartbeat record
//! - `turnstile:events`                        cross-replica admission event log
//!
//! Resources appear without prior registration, so sweeps enumerate by
//! pattern instead of consulting a central index.

use super::member::{Member, Resource};

/// Root namespace for every key this service writes.
pub const NAMESPACE: &str = "turnstile";

/// Active-set key for a resource.
pub fn active_set(resource: &Resource) -> String {
    format!(
        "{}:active:{}:{}",
        NAMESPACE, resource.resource_type, resource.resource_id
    )
}

/// Waiting-queue key for a resource.
pub fn waiting_queue(resource: &Resource) -> String {
    format!(
        "{}:waiting:{}:{}",
        NAMESPACE, resource.resource_type, resource.resource_id
    )
}

/// Expiry-marker key for one active member.
pub fn session_marker(resource: &Resource, member: &Member) -> String {
    format!(
        "{}:session:{}:{}:{}",
        NAMESPACE,
        resource.resource_type,
        resource.resource_id,
        member.composite_key()
    )
}

/// Heartbeat-record key for one replica.
pub fn replica_record(replica_id: &str) -> String {
    format!("{}:replica:{}", NAMESPACE, replica_id)
}

/// Cross-replica admission event log key.
pub fn event_log() -> String {
    format!("{}:events", NAMESPACE)
}

/// Scan pattern matching every active-set key.
pub fn active_pattern() -> String {
    format!("{}:active:*", NAMESPACE)
}

/// Scan pattern matching every waiting-queue key.
pub fn waiting_pattern() -> String {
    format!("{}:waiting:*", NAMESPACE)
}

/// Scan pattern matching every replica record.
pub fn replica_pattern() -> String {
    format!("{}:replica:*", NAMESPACE)
}

/// Recover the resource from an active-set or waiting-queue key.
///
/// Resource ids may contain `:`; only the type segment is separator-free.
pub fn parse_resource_key(key: &str) -> Option<Resource> {
    let rest = key
        .strip_prefix(&format!("{}:active:", NAMESPACE))
        .or_else(|| key.strip_prefix(&format!("{}:waiting:", NAMESPACE)))?;
    let (resource_type, resource_id) = rest.split_once(':')?;
    if resource_type.is_empty() || resource_id.is_empty() {
        return None;
    }
    Some(Resource::new(resource_type, resource_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_key_round_trip() {
        let resource = Resource::new("movie", "42");
        let parsed = parse_resource_key(&active_set(&resource)).unwrap();
        assert_eq!(parsed, resource);
        let parsed = parse_resource_key(&waiting_queue(&resource)).unwrap();
        assert_eq!(parsed, resource);
    }

    #[test]
    fn resource_id_with_separator_survives() {
        let resource = Resource::new("movie", "2026:showing:7");
        let parsed = parse_resource_key(&active_set(&resource)).unwrap();
        assert_eq!(parsed.resource_id, "2026:showing:7");
    }

    #[test]
    fn foreign_keys_do_not_parse() {
        assert!(parse_resource_key("turnstile:events").is_none());
        assert!(parse_resource_key("other:active:movie:1").is_none());
        assert!(parse_resource_key("turnstile:active:movie").is_none());
    }
}
