// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 The Brio Project Developers

//! Bounded, recency-ordered module cache.

use std::collections::HashMap;
use std::sync::Arc;

use crate::module_system::module::LoadedModule;
use crate::module_system::resolver::ModuleIdentity;
use crate::module_system::stack::LoadStack;

/// Default number of modules kept resident.
pub const DEFAULT_CAPACITY: usize = 100;

/// Maps module identities to their built modules, bounded by capacity with
/// least-recently-used eviction.
///
/// An identity still present on the active [`LoadStack`] is never evicted;
/// if every resident entry is pinned that way, occupancy transiently
/// exceeds capacity rather than corrupting an in-flight load.
pub struct ModuleCache {
    capacity: usize,
    entries: HashMap<ModuleIdentity, Arc<LoadedModule>>,
    // Front is least recently used.
    recency: Vec<ModuleIdentity>,
}

impl ModuleCache {
    /// Create a cache with [`DEFAULT_CAPACITY`].
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a cache bounded to `capacity` entries (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            recency: Vec::new(),
        }
    }

    /// Look up a module and mark it most recently used.
    pub fn get(&mut self, identity: &ModuleIdentity) -> Option<Arc<LoadedModule>> {
        let module = self.entries.get(identity).cloned()?;
        self.touch(identity);
        Some(module)
    }

    /// Whether a module is resident under this identity.
    pub fn contains(&self, identity: &ModuleIdentity) -> bool {
        self.entries.contains_key(identity)
    }

    /// Insert or overwrite a module, evicting least-recently-used entries
    /// not pinned by `stack` while over capacity.
    pub fn insert(
        &mut self,
        identity: ModuleIdentity,
        module: Arc<LoadedModule>,
        stack: &LoadStack,
    ) {
        self.entries.insert(identity.clone(), module);
        self.touch(&identity);

        while self.entries.len() > self.capacity {
            let victim = self
                .recency
                .iter()
                .find(|candidate| !stack.contains(candidate))
                .cloned();
            match victim {
                Some(victim) => {
                    tracing::debug!(module = %victim, "evicting least recently used module");
                    self.entries.remove(&victim);
                    self.recency.retain(|entry| *entry != victim);
                }
                // Everything resident is mid-load; let occupancy overshoot.
                None => break,
            }
        }
    }

    /// Drop every entry. Modules already bound into executing scopes stay
    /// valid; the next import of any identity builds a fresh instance.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    /// Number of resident modules.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no modules.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn touch(&mut self, identity: &ModuleIdentity) {
        self.recency.retain(|entry| entry != identity);
        self.recency.push(identity.clone());
    }
}

impl Default for ModuleCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_system::module::InterfaceKind;
    use std::path::PathBuf;

    fn identity(name: &str) -> ModuleIdentity {
        ModuleIdentity::Source(PathBuf::from(format!("/mods/{name}.brio")))
    }

    fn module(name: &str) -> Arc<LoadedModule> {
        Arc::new(LoadedModule::new(
            identity(name),
            name,
            format!("test module {name}"),
            InterfaceKind::Auto,
            Vec::new(),
        ))
    }

    #[test]
    fn get_returns_inserted_module() {
        let mut cache = ModuleCache::with_capacity(2);
        let stack = LoadStack::new();
        let m = module("a");

        cache.insert(identity("a"), m.clone(), &stack);
        let hit = cache.get(&identity("a")).unwrap();
        assert!(Arc::ptr_eq(&hit, &m));
    }

    #[test]
    fn evicts_least_recently_used_beyond_capacity() {
        let mut cache = ModuleCache::with_capacity(2);
        let stack = LoadStack::new();

        cache.insert(identity("x"), module("x"), &stack);
        cache.insert(identity("y"), module("y"), &stack);
        cache.insert(identity("z"), module("z"), &stack);

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&identity("x")));
        assert!(cache.contains(&identity("y")));
        assert!(cache.contains(&identity("z")));
    }

    #[test]
    fn get_refreshes_recency() {
        let mut cache = ModuleCache::with_capacity(2);
        let stack = LoadStack::new();

        cache.insert(identity("x"), module("x"), &stack);
        cache.insert(identity("y"), module("y"), &stack);
        // x becomes most recently used, so y is the eviction victim.
        cache.get(&identity("x")).unwrap();
        cache.insert(identity("z"), module("z"), &stack);

        assert!(cache.contains(&identity("x")));
        assert!(!cache.contains(&identity("y")));
    }

    #[test]
    fn pinned_entries_survive_eviction() {
        let mut cache = ModuleCache::with_capacity(1);
        let mut stack = LoadStack::new();
        stack.enter(&identity("pinned")).unwrap();

        cache.insert(identity("pinned"), module("pinned"), &stack);
        cache.insert(identity("other"), module("other"), &stack);

        // "pinned" is the LRU entry but mid-load; "other" goes instead.
        assert!(cache.contains(&identity("pinned")));
        assert!(!cache.contains(&identity("other")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn occupancy_overshoots_when_everything_is_pinned() {
        let mut cache = ModuleCache::with_capacity(1);
        let mut stack = LoadStack::new();
        stack.enter(&identity("a")).unwrap();
        stack.enter(&identity("b")).unwrap();

        cache.insert(identity("a"), module("a"), &stack);
        cache.insert(identity("b"), module("b"), &stack);

        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn clear_empties_the_cache() {
        let mut cache = ModuleCache::new();
        let stack = LoadStack::new();

        cache.insert(identity("a"), module("a"), &stack);
        let held = cache.get(&identity("a")).unwrap();
        cache.clear();

        assert!(cache.is_empty());
        // Live references stay valid after a clear.
        assert_eq!(held.name(), "a");
    }
}
