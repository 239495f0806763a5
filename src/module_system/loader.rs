// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 The Brio Project Developers

//! The loader service: resolution, cycle guard, cache and build under one
//! critical section.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::context::LoaderContext;
use crate::engine::{Evaluator, ForeignHost, NoForeignPackages};
use crate::error::Result;
use crate::module_system::builder;
use crate::module_system::cache::ModuleCache;
use crate::module_system::module::LoadedModule;
use crate::module_system::resolver::{ModuleReference, PathResolver};
use crate::module_system::stack::LoadStack;

/// Mutable loader state, guarded by the service mutex.
pub(crate) struct LoaderState {
    pub(crate) resolver: PathResolver,
    pub(crate) cache: ModuleCache,
    pub(crate) stack: LoadStack,
    pub(crate) builtins: HashMap<String, Arc<LoadedModule>>,
    pub(crate) evaluator: Arc<dyn Evaluator>,
    pub(crate) foreign: Arc<dyn ForeignHost>,
}

impl LoaderState {
    /// Resolve, cycle-check, and return the module for `reference`,
    /// building and caching it on a miss.
    ///
    /// Also the recursion point for nested imports: the builder calls back
    /// in here for each import declaration of the unit it is executing.
    pub(crate) fn import(
        &mut self,
        reference: &ModuleReference,
        context: &LoaderContext,
    ) -> Result<Arc<LoadedModule>> {
        let identity = self.resolver.resolve(
            reference,
            context,
            |name| self.builtins.contains_key(name),
            self.foreign.as_ref(),
        )?;

        self.stack.enter(&identity)?;

        if let Some(module) = self.cache.get(&identity) {
            tracing::debug!(module = %identity, "module cache hit");
            self.stack.exit(&identity);
            return Ok(module);
        }

        let built = builder::build_module(self, &identity, context);
        match built {
            Ok(module) => {
                self.cache
                    .insert(identity.clone(), Arc::clone(&module), &self.stack);
                self.stack.exit(&identity);
                tracing::debug!(module = %identity, "module loaded");
                Ok(module)
            }
            // The stack entry comes off on failure too, so a failed load
            // does not poison later imports of the same name.
            Err(err) => {
                self.stack.exit(&identity);
                Err(err)
            }
        }
    }
}

/// The module loader service of one Brio runtime.
///
/// Owns the path resolver, the module cache, the load stack and the builtin
/// registry. Every import runs as one atomic resolve/check/build/insert
/// sequence under an internal lock, so concurrent importers of the same
/// identity serialize: the second blocks until the first build completes,
/// then observes a cache hit. Source execution therefore happens at most
/// once per identity per cache lifetime.
pub struct ModuleLoader {
    state: Mutex<LoaderState>,
}

impl ModuleLoader {
    /// Create a loader around the runtime's evaluator, with search paths
    /// seeded from the environment and the default cache capacity.
    pub fn new(evaluator: Arc<dyn Evaluator>) -> Self {
        Self::with_config(
            evaluator,
            PathResolver::from_env(),
            super::cache::DEFAULT_CAPACITY,
        )
    }

    /// Create a loader with an explicit cache capacity.
    pub fn with_cache_capacity(evaluator: Arc<dyn Evaluator>, capacity: usize) -> Self {
        Self::with_config(evaluator, PathResolver::from_env(), capacity)
    }

    /// Create a fully configured loader; embedders that do not want
    /// environment-derived search paths pass their own resolver.
    pub fn with_config(
        evaluator: Arc<dyn Evaluator>,
        resolver: PathResolver,
        capacity: usize,
    ) -> Self {
        Self {
            state: Mutex::new(LoaderState {
                resolver,
                cache: ModuleCache::with_capacity(capacity),
                stack: LoadStack::new(),
                builtins: HashMap::new(),
                evaluator,
                foreign: Arc::new(NoForeignPackages),
            }),
        }
    }

    /// Install the provider of host-ecosystem packages.
    pub fn set_foreign_host(&self, host: Arc<dyn ForeignHost>) {
        self.state.lock().foreign = host;
    }

    /// Import the module `reference` denotes, relative to `context`.
    ///
    /// On a cache hit the already-built module is returned; otherwise the
    /// module is built, cached and returned. The caller binds the result
    /// into the importing scope under [`ModuleReference::binding_name`].
    pub fn import_module(
        &self,
        reference: &ModuleReference,
        context: &LoaderContext,
    ) -> Result<Arc<LoadedModule>> {
        self.state.lock().import(reference, context)
    }

    /// Import by bare specifier against the process-default context.
    pub fn import(&self, specifier: &str) -> Result<Arc<LoadedModule>> {
        self.import_module(
            &ModuleReference::new(specifier),
            &crate::context::loader_context(),
        )
    }

    /// Register a prebuilt standard-library module. Builtin names resolve
    /// before any filesystem search.
    pub fn register_builtin(&self, name: impl Into<String>, module: LoadedModule) {
        let name = name.into();
        self.state
            .lock()
            .builtins
            .insert(name, Arc::new(module));
    }

    /// Prepend a global module search path.
    pub fn add_module_path(&self, path: impl Into<PathBuf>) {
        self.state.lock().resolver.add_module_path(path);
    }

    /// The global module search paths, in search order.
    pub fn module_paths(&self) -> Vec<PathBuf> {
        self.state.lock().resolver.module_paths().to_vec()
    }

    /// Package names visible in the user package directory.
    pub fn installed_packages(&self) -> Vec<String> {
        self.state.lock().resolver.installed_packages()
    }

    /// Drop every cached module. Modules already bound into executing
    /// scopes remain valid; re-importing any identity builds a fresh
    /// instance.
    pub fn clear_cache(&self) {
        self.state.lock().cache.clear();
    }

    /// Number of currently cached modules.
    pub fn cached_modules(&self) -> usize {
        self.state.lock().cache.len()
    }
}
