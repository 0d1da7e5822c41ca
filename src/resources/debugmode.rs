//! Debug toggle resource and debug info datasets.
//!
//! The mere presence of [`DebugMode`] indicates that debug rendering and
//! diagnostics should be enabled. Remove it to disable debug behavior.
//! Objects that want to show up in the debug overlay implement
//! [`DebugPrintable`] and return a [`DebugInfo`].

use bevy_ecs::prelude::Resource;
use std::collections::BTreeMap;
use std::fmt;

/// Marker resource: when present, systems may draw overlays or print extra logs.
#[derive(Resource, Clone, Copy)]
pub struct DebugMode {}

/// Named values, listed in key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebugInfo {
    entries: BTreeMap<String, String>,
}

impl DebugInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl fmt::Display) {
        self.entries.insert(key.into(), value.to_string());
    }

    /// Builder flavour of [`DebugInfo::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for DebugInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in &self.entries {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{k}: {v}")?;
            first = false;
        }
        Ok(())
    }
}

pub trait DebugPrintable {
    fn debug_info(&self) -> DebugInfo;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_sorted_by_key() {
        let info = DebugInfo::new().with("zoom", 2.0).with("pos", "(1, 2)").with("fps", 60);
        let keys: Vec<&str> = info.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["fps", "pos", "zoom"]);
        assert_eq!(info.to_string(), "fps: 60, pos: (1, 2), zoom: 2");
        assert_eq!(info.get("zoom"), Some("2"));
    }
}
