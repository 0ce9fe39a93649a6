use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock};

/// Which backend a client currently talks to.
///
/// Only [`BackendSelector::Secondary`] turns translation on; every other
/// value, including names this crate does not know, means passthrough.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BackendSelector {
    #[default]
    Primary,
    Secondary,
    Other(String),
}

impl BackendSelector {
    pub fn translates(&self) -> bool {
        matches!(self, Self::Secondary)
    }
}

impl From<String> for BackendSelector {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "primary" => Self::Primary,
            "secondary" => Self::Secondary,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for BackendSelector {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<BackendSelector> for String {
    fn from(value: BackendSelector) -> Self {
        value.to_string()
    }
}

impl fmt::Display for BackendSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Secondary => f.write_str("secondary"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// Per-client selector shared between the wiring code and the dispatchers.
///
/// Dispatchers call [`SelectorHandle::snapshot`] once per request so a
/// concurrent [`SelectorHandle::set`] never splits one request between two
/// backends.
#[derive(Debug, Clone, Default)]
pub struct SelectorHandle(Arc<RwLock<BackendSelector>>);

impl SelectorHandle {
    pub fn new(selector: BackendSelector) -> Self {
        Self(Arc::new(RwLock::new(selector)))
    }

    pub fn snapshot(&self) -> BackendSelector {
        match self.0.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set(&self, selector: BackendSelector) {
        match self.0.write() {
            Ok(mut guard) => *guard = selector,
            Err(poisoned) => *poisoned.into_inner() = selector,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        assert_eq!(BackendSelector::from("Secondary"), BackendSelector::Secondary);
        assert_eq!(BackendSelector::from("primary"), BackendSelector::Primary);
        let other = BackendSelector::from("vertex");
        assert_eq!(other, BackendSelector::Other("vertex".to_string()));
        assert_eq!(other.to_string(), "vertex");
        assert!(!other.translates());
        assert!(BackendSelector::Secondary.translates());
    }

    #[test]
    fn test_serde_uses_plain_strings() {
        let json = serde_json::to_string(&BackendSelector::Secondary).unwrap();
        assert_eq!(json, "\"secondary\"");
        let parsed: BackendSelector = serde_json::from_str("\"local\"").unwrap();
        assert_eq!(parsed, BackendSelector::Other("local".to_string()));
    }

    #[test]
    fn test_snapshot_is_detached_from_later_updates() {
        let handle = SelectorHandle::new(BackendSelector::Secondary);
        let snapshot = handle.snapshot();
        handle.set(BackendSelector::Primary);
        assert_eq!(snapshot, BackendSelector::Secondary);
        assert_eq!(handle.snapshot(), BackendSelector::Primary);
    }
}
