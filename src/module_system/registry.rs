// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 The Brio Project Developers

//! Explicit module interfaces.
//!
//! A source unit that wants full control over what it exposes constructs an
//! export registry, registers functions and constants into it, and leaves it
//! among its top-level bindings; the builder then exposes the registry's
//! contents and nothing else. Standard-library builtins are assembled the
//! same way from native code.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;

use crate::engine::{Callable, Value};
use crate::error::LoaderError;
use crate::module_system::module::{call_binding, Binding};

#[derive(Default)]
struct RegistryInner {
    order: Vec<String>,
    bindings: HashMap<String, Binding>,
}

/// Name → binding table with registration and call-time validation.
///
/// Shared as a [`Value::Registry`] so executing source code can populate
/// it; interior mutability ends once the builder snapshots it into a
/// [`LoadedModule`](crate::module_system::LoadedModule).
pub struct ExportRegistry {
    name: String,
    description: String,
    inner: RwLock<RegistryInner>,
}

impl ExportRegistry {
    /// Create an empty registry for the named module.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    /// The module name this registry describes.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The module description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Register a function.
    ///
    /// `arity` of `Some(n)` enforces exactly `n` positional arguments at
    /// call time; `None` disables the check for variadic or
    /// optional-parameter functions. Re-registering a name overwrites
    /// silently; the previous binding is returned so callers that care can
    /// tell.
    pub fn register_function(
        &self,
        name: impl Into<String>,
        callable: Callable,
        arity: Option<usize>,
        description: impl Into<String>,
    ) -> Option<Binding> {
        self.register(
            name.into(),
            Binding::Function {
                descriptor: Value::Function(callable),
                arity,
                description: description.into(),
            },
        )
    }

    /// Register a constant value. Re-registration overwrites, returning the
    /// previous binding.
    pub fn register_constant(
        &self,
        name: impl Into<String>,
        value: Value,
        description: impl Into<String>,
    ) -> Option<Binding> {
        self.register(
            name.into(),
            Binding::Constant {
                value,
                description: description.into(),
            },
        )
    }

    /// Call a registered function with positional arguments.
    ///
    /// Fails with [`LoaderError::NameNotFound`] when no function is
    /// registered under `name` and [`LoaderError::ArityMismatch`] when the
    /// argument count misses a registered exact arity.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, LoaderError> {
        let binding = self.get(name);
        call_binding(&self.name, binding.as_ref(), name, args)
    }

    /// Look up a binding by name.
    pub fn get(&self, name: &str) -> Option<Binding> {
        self.inner.read().bindings.get(name).cloned()
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.inner.read().order.clone()
    }

    /// Number of registered bindings.
    pub fn len(&self) -> usize {
        self.inner.read().bindings.len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.inner.read().bindings.is_empty()
    }

    /// Ordered copy of the binding table, for module assembly.
    pub(crate) fn snapshot(&self) -> Vec<(String, Binding)> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|name| {
                inner
                    .bindings
                    .get(name)
                    .map(|binding| (name.clone(), binding.clone()))
            })
            .collect()
    }

    fn register(&self, name: String, binding: Binding) -> Option<Binding> {
        let mut inner = self.inner.write();
        let previous = inner.bindings.insert(name.clone(), binding);
        if previous.is_none() {
            inner.order.push(name);
        }
        previous
    }
}

impl fmt::Debug for ExportRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportRegistry")
            .field("name", &self.name)
            .field("bindings", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn sum_callable() -> Callable {
        Arc::new(|args| {
            let mut total = 0;
            for arg in args {
                if let Value::Int(n) = arg {
                    total += n;
                }
            }
            Ok(Value::Int(total))
        })
    }

    #[test]
    fn call_enforces_exact_arity() {
        let registry = ExportRegistry::new("m", "");
        registry.register_function("f", sum_callable(), Some(2), "");

        let err = registry
            .call("f", &[Value::Int(1), Value::Int(2), Value::Int(3)])
            .unwrap_err();
        match err {
            LoaderError::ArityMismatch { name, expected, got } => {
                assert_eq!(name, "f");
                assert_eq!(expected, 2);
                assert_eq!(got, 3);
            }
            other => panic!("expected ArityMismatch, got {other:?}"),
        }

        assert_eq!(
            registry.call("f", &[Value::Int(1), Value::Int(2)]).unwrap(),
            Value::Int(3)
        );
    }

    #[test]
    fn none_arity_accepts_any_argument_count() {
        let registry = ExportRegistry::new("m", "");
        registry.register_function("f", sum_callable(), None, "");

        assert_eq!(registry.call("f", &[]).unwrap(), Value::Int(0));
        assert_eq!(
            registry
                .call("f", &[Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)])
                .unwrap(),
            Value::Int(10)
        );
    }

    #[test]
    fn unknown_name_is_name_not_found() {
        let registry = ExportRegistry::new("m", "");
        let err = registry.call("missing", &[]).unwrap_err();
        match err {
            LoaderError::NameNotFound { name, module } => {
                assert_eq!(name, "missing");
                assert_eq!(module, "m");
            }
            other => panic!("expected NameNotFound, got {other:?}"),
        }
    }

    #[test]
    fn constants_are_not_callable() {
        let registry = ExportRegistry::new("m", "");
        registry.register_constant("pi", Value::Float(3.14), "");
        assert!(matches!(
            registry.call("pi", &[]).unwrap_err(),
            LoaderError::NameNotFound { .. }
        ));
    }

    #[test]
    fn reregistration_overwrites_and_returns_previous() {
        let registry = ExportRegistry::new("m", "");
        assert!(registry
            .register_constant("version", Value::Int(1), "")
            .is_none());
        let previous = registry
            .register_constant("version", Value::Int(2), "")
            .unwrap();
        assert_eq!(previous.constant(), Some(&Value::Int(1)));
        assert_eq!(registry.get("version").unwrap().constant(), Some(&Value::Int(2)));
        assert_eq!(registry.names(), vec!["version"]);
    }

    #[test]
    fn snapshot_preserves_registration_order() {
        let registry = ExportRegistry::new("m", "");
        registry.register_constant("b", Value::Int(1), "");
        registry.register_constant("a", Value::Int(2), "");
        registry.register_function("c", sum_callable(), None, "");

        let names: Vec<String> = registry.snapshot().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }
}
