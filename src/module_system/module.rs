// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 The Brio Project Developers

//! Loaded module values and their bindings.

use std::collections::HashMap;
use std::fmt;

use crate::engine::{ExecutionError, Value};
use crate::error::LoaderError;
use crate::module_system::registry::ExportRegistry;
use crate::module_system::resolver::ModuleIdentity;

/// How a module's exposed bindings were determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceKind {
    /// Every non-underscore top-level binding is exposed
    Auto,
    /// Bindings come entirely from the export registry the unit populated
    Explicit,
}

/// One exposed binding of a module.
#[derive(Clone)]
pub enum Binding {
    /// A callable export
    Function {
        /// The callable value; classified once at wrap time
        descriptor: Value,
        /// Exact positional argument count, or `None` for unchecked
        arity: Option<usize>,
        /// Human-readable description
        description: String,
    },
    /// A plain value export
    Constant {
        /// The exported value
        value: Value,
        /// Human-readable description
        description: String,
    },
}

impl Binding {
    /// Whether this binding is callable.
    pub fn is_function(&self) -> bool {
        matches!(self, Binding::Function { .. })
    }

    /// The binding's description.
    pub fn description(&self) -> &str {
        match self {
            Binding::Function { description, .. } | Binding::Constant { description, .. } => {
                description
            }
        }
    }

    /// The constant value, if this is a constant binding.
    pub fn constant(&self) -> Option<&Value> {
        match self {
            Binding::Constant { value, .. } => Some(value),
            Binding::Function { .. } => None,
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Function { arity, description, .. } => f
                .debug_struct("Function")
                .field("arity", arity)
                .field("description", description)
                .finish_non_exhaustive(),
            Binding::Constant { value, description } => f
                .debug_struct("Constant")
                .field("value", value)
                .field("description", description)
                .finish(),
        }
    }
}

/// Whether a top-level name crosses the auto-interface boundary.
///
/// Single-underscore names are private by convention; dunder names never
/// leave their unit at all. Both stay out of the auto interface.
pub(crate) fn auto_exposed(name: &str) -> bool {
    !name.starts_with('_')
}

/// Validate and invoke a function binding.
///
/// Shared by [`ExportRegistry::call`] and [`LoadedModule::call`]: a missing
/// or non-function binding is [`LoaderError::NameNotFound`]; a registered
/// arity is enforced exactly, `None` disables the check.
pub(crate) fn call_binding(
    module: &str,
    binding: Option<&Binding>,
    name: &str,
    args: &[Value],
) -> Result<Value, LoaderError> {
    let Some(Binding::Function { descriptor, arity, .. }) = binding else {
        return Err(LoaderError::NameNotFound {
            name: name.to_string(),
            module: module.to_string(),
        });
    };

    if let Some(expected) = *arity {
        if args.len() != expected {
            return Err(LoaderError::ArityMismatch {
                name: name.to_string(),
                expected,
                got: args.len(),
            });
        }
    }

    let Some(callable) = descriptor.as_callable() else {
        return Err(LoaderError::Execution(ExecutionError::new(format!(
            "function '{name}' in module '{module}' can only be called through the evaluator"
        ))));
    };
    callable(args).map_err(LoaderError::from)
}

/// A fully built module: the canonical identity plus the bindings it
/// exposes to importers.
///
/// Built at most once per identity per cache lifetime, then shared
/// read-only through `Arc` by every importer. Bindings never change after
/// construction.
pub struct LoadedModule {
    identity: ModuleIdentity,
    name: String,
    description: String,
    interface: InterfaceKind,
    order: Vec<String>,
    bindings: HashMap<String, Binding>,
}

impl LoadedModule {
    /// Assemble a module from ordered bindings.
    pub fn new(
        identity: ModuleIdentity,
        name: impl Into<String>,
        description: impl Into<String>,
        interface: InterfaceKind,
        bindings: Vec<(String, Binding)>,
    ) -> Self {
        let mut order = Vec::with_capacity(bindings.len());
        let mut table = HashMap::with_capacity(bindings.len());
        for (binding_name, binding) in bindings {
            if table.insert(binding_name.clone(), binding).is_none() {
                order.push(binding_name);
            }
        }
        Self {
            identity,
            name: name.into(),
            description: description.into(),
            interface,
            order,
            bindings: table,
        }
    }

    /// Build an explicit-interface module from a populated registry.
    pub fn from_registry(identity: ModuleIdentity, registry: &ExportRegistry) -> Self {
        Self::new(
            identity,
            registry.name().to_string(),
            registry.description().to_string(),
            InterfaceKind::Explicit,
            registry.snapshot(),
        )
    }

    /// The canonical identity this module was loaded under.
    pub fn identity(&self) -> &ModuleIdentity {
        &self.identity
    }

    /// The module's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The module's description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// How the exposed bindings were determined.
    pub fn interface_kind(&self) -> InterfaceKind {
        self.interface
    }

    /// Look up a binding by name.
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    /// The value of a constant binding, if present.
    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name).and_then(Binding::constant)
    }

    /// Call an exposed function with positional arguments, enforcing its
    /// registered arity.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, LoaderError> {
        call_binding(&self.name, self.bindings.get(name), name, args)
    }

    /// Exposed binding names, in declaration order.
    pub fn binding_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of exposed bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the module exposes no bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModule")
            .field("identity", &self.identity)
            .field("name", &self.name)
            .field("interface", &self.interface)
            .field("bindings", &self.order)
            .finish()
    }
}
