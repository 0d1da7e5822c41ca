//! Name-keyed registry of values.
//!
//! Used to hold the asset types known to the [`AssetManager`], but generic
//! over anything that can report a name.
//!
//! [`AssetManager`]: crate::resources::assetmanager::AssetManager

use log::warn;
use rustc_hash::FxHashMap;

/// Something with a unique, human readable name.
pub trait Named {
    fn name(&self) -> &str;
}

impl<T: Named + ?Sized> Named for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Maps names to values. The first value registered under a name wins.
#[derive(Debug)]
pub struct Registry<T: Named> {
    kind: &'static str,
    entries: FxHashMap<String, T>,
}

impl<T: Named> Registry<T> {
    /// `kind` labels entries in log messages, e.g. "asset type".
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: FxHashMap::default(),
        }
    }

    /// Register values. A value whose name is already taken is dropped
    /// with a warning.
    pub fn add(&mut self, values: impl IntoIterator<Item = T>) {
        for value in values {
            let name = value.name().to_string();
            if self.entries.contains_key(&name) {
                warn!("{} '{}' is already registered, ignoring", self.kind, name);
                continue;
            }
            self.entries.insert(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Entry {
        name: &'static str,
        value: u32,
    }

    impl Named for Entry {
        fn name(&self) -> &str {
            self.name
        }
    }

    #[test]
    fn first_registration_wins() {
        let mut reg = Registry::new("entry");
        reg.add([Entry { name: "a", value: 1 }, Entry { name: "b", value: 2 }]);
        reg.add([Entry { name: "a", value: 3 }]);

        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get("a").map(|e| e.value), Some(1));
        assert_eq!(reg.get("b").map(|e| e.value), Some(2));
        assert!(reg.get("c").is_none());
        assert_eq!(reg.names(), vec!["a", "b"]);
    }

    #[test]
    fn boxed_trait_objects_keep_their_names() {
        let mut reg: Registry<Box<dyn Named>> = Registry::new("boxed");
        reg.add([Box::new(Entry { name: "x", value: 0 }) as Box<dyn Named>]);
        assert!(reg.contains("x"));
        assert!(!reg.is_empty());
    }
}
