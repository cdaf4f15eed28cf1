//! Reference resolution: locating asset descriptions by locator.

use std::sync::Arc;

use hashbrown::HashMap;

use crate::description::AssetDescription;
use crate::value::AssetLocator;

/// Resolves asset locators to shared descriptions.
///
/// Hosts implement this over their own storage; [`AssetDatabase`] is the
/// in-memory implementation. Instances compare the returned `Arc`s by
/// pointer to detect that a reference's target changed.
pub trait AssetResolver {
    fn resolve(&self, locator: &AssetLocator) -> Option<Arc<AssetDescription>>;
}

/// Owns the descriptions of a project, keyed by locator.
#[derive(Debug, Default)]
pub struct AssetDatabase {
    descriptions: HashMap<AssetLocator, Arc<AssetDescription>>,
}

impl AssetDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install (or replace) the description at `locator`, returning the shared handle.
    pub fn insert(
        &mut self,
        locator: impl Into<AssetLocator>,
        description: AssetDescription,
    ) -> Arc<AssetDescription> {
        let locator = locator.into();
        let shared = Arc::new(description);
        if self
            .descriptions
            .insert(locator.clone(), shared.clone())
            .is_some()
        {
            log::debug!("replaced asset description at '{locator}'");
        }
        shared
    }

    pub fn get(&self, locator: &AssetLocator) -> Option<&Arc<AssetDescription>> {
        self.descriptions.get(locator)
    }

    pub fn remove(&mut self, locator: &AssetLocator) -> Option<Arc<AssetDescription>> {
        self.descriptions.remove(locator)
    }

    pub fn len(&self) -> usize {
        self.descriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }

    pub fn locators(&self) -> impl Iterator<Item = &AssetLocator> {
        self.descriptions.keys()
    }
}

impl AssetResolver for AssetDatabase {
    fn resolve(&self, locator: &AssetLocator) -> Option<Arc<AssetDescription>> {
        self.descriptions.get(locator).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::AssetElement;

    #[test]
    fn replacing_installs_a_new_handle() {
        let mut db = AssetDatabase::new();
        let first = db.insert("props/crate", AssetDescription::new("crate", AssetElement::transform("root")));
        let again = db.resolve(&AssetLocator::from("props/crate")).unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        db.insert("props/crate", AssetDescription::new("crate v2", AssetElement::transform("root")));
        let replaced = db.resolve(&AssetLocator::from("props/crate")).unwrap();
        assert!(!Arc::ptr_eq(&first, &replaced));
        assert_eq!(db.len(), 1);
        assert!(db.resolve(&AssetLocator::from("missing")).is_none());
    }
}
