use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use uuid::Uuid;

/// Job identifier: `job_` followed by a UUIDv7, so ids sort by creation time.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn generate() -> Self {
        Self(format!("job_{}", Uuid::now_v7()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Isolation key for ordered execution. Carries no structure beyond equality.
///
/// In the ingestion path this is the episode's group id.
#[derive(Clone, Debug, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamespaceKey(String);

impl NamespaceKey {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the key is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for NamespaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NamespaceKey {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for NamespaceKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for NamespaceKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets registries keyed by `NamespaceKey` be queried with a plain `&str`.
impl Borrow<str> for NamespaceKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn job_id_has_prefix() {
        let id = JobId::generate();
        assert!(id.as_str().starts_with("job_"), "got: {id}");
    }

    #[test]
    fn job_ids_are_unique_and_monotonic() {
        let ids: Vec<JobId> = (0..100).map(|_| JobId::generate()).collect();
        for w in ids.windows(2) {
            assert!(w[0].as_str() < w[1].as_str(), "not monotonic: {} >= {}", w[0], w[1]);
        }
    }

    #[test]
    fn job_id_serializes_as_plain_string() {
        let id = JobId::generate();
        assert_eq!(serde_json::to_value(&id).unwrap(), id.as_str());
    }

    #[test]
    fn namespace_key_equality_only() {
        assert_eq!(NamespaceKey::from("main"), NamespaceKey::new("main".to_string()));
        assert_ne!(NamespaceKey::from("main"), NamespaceKey::from("Main"));
    }

    #[test]
    fn namespace_key_blank_detection() {
        assert!(NamespaceKey::from("").is_blank());
        assert!(NamespaceKey::from("  \t").is_blank());
        assert!(!NamespaceKey::from("tenant-a").is_blank());
    }

    #[test]
    fn namespace_key_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(NamespaceKey::from("alpha"), 1);
        assert_eq!(map.get("alpha"), Some(&1));
        assert_eq!(map.get("beta"), None);
    }

    #[test]
    fn namespace_key_serializes_as_plain_string() {
        let key = NamespaceKey::from("graph-1");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"graph-1\"");
    }
}
