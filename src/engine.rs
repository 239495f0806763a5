// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 The Brio Project Developers

//! Boundary to the Brio evaluator and to the host ecosystem.
//!
//! The loader never lexes, parses or executes Brio source itself. It asks an
//! [`Evaluator`] to run a source unit and hand back the unit's top-level
//! bindings and import declarations, and it asks a [`ForeignHost`] for the
//! members of an already-available host package. Both collaborators exchange
//! values through the [`Value`] handle type defined here.

use std::any::Any;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::module_system::{ExportRegistry, LoadedModule};

/// Invokable handle for a function binding.
///
/// Evaluators and host adapters wrap their own callables (interpreted
/// functions, native builtins, host-ecosystem functions) into this shape so
/// the loader can store and invoke them uniformly.
pub type Callable = Arc<dyn Fn(&[Value]) -> std::result::Result<Value, ExecutionError> + Send + Sync>;

/// A Brio runtime value, as seen from the loader.
///
/// The loader treats values mostly opaquely; the variants it actually
/// inspects are [`Value::Function`] (callability), [`Value::Registry`]
/// (explicit-interface detection) and [`Value::Module`] (nested imports).
#[derive(Clone)]
pub enum Value {
    /// The absent value
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating-point number
    Float(f64),
    /// String
    Str(String),
    /// Ordered list of values
    List(Vec<Value>),
    /// An invokable function
    Function(Callable),
    /// An export registry a source unit populated to declare its interface
    Registry(Arc<ExportRegistry>),
    /// An imported module bound as a value
    Module(Arc<LoadedModule>),
    /// A host-ecosystem value the loader does not interpret
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Value {
    /// The invokable handle, if this value carries one.
    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Value::Function(callable) => Some(callable),
            _ => None,
        }
    }

    /// The export registry, if this value is one.
    pub fn as_registry(&self) -> Option<&Arc<ExportRegistry>> {
        match self {
            Value::Registry(registry) => Some(registry),
            _ => None,
        }
    }

    /// The loaded module, if this value is one.
    pub fn as_module(&self) -> Option<&Arc<LoadedModule>> {
        match self {
            Value::Module(module) => Some(module),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Float(n) => write!(f, "Float({n})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Function(_) => write!(f, "Function(..)"),
            Value::Registry(registry) => write!(f, "Registry({})", registry.name()),
            Value::Module(module) => write!(f, "Module({})", module.identity()),
            Value::Opaque(_) => write!(f, "Opaque(..)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Registry(a), Value::Registry(b)) => Arc::ptr_eq(a, b),
            (Value::Module(a), Value::Module(b)) => Arc::ptr_eq(a, b),
            (Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// An import declaration harvested from a source unit, in declaration order.
#[derive(Debug, Clone)]
pub struct ImportDeclaration {
    /// The module specifier as written (`"json"`, `"pkg.sub"`, `"./util"`)
    pub specifier: String,
    /// Binding alias, if the statement carried one
    pub alias: Option<String>,
}

/// Result of executing one source unit.
#[derive(Debug, Default)]
pub struct SourceUnit {
    /// Top-level bindings in declaration order
    pub bindings: Vec<(String, Value)>,
    /// Import declarations in declaration order
    pub imports: Vec<ImportDeclaration>,
}

/// Failure raised by the evaluator while executing a source unit.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ExecutionError {
    message: String,
}

impl ExecutionError {
    /// Create an execution error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure raised by a [`ForeignHost`] while enumerating a package.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ForeignError {
    message: String,
}

impl ForeignError {
    /// Create a foreign-host error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The expression/statement evaluator of the Brio runtime.
///
/// Implementations execute a source unit and report its resulting top-level
/// bindings together with the import declarations the parser surfaced; the
/// loader resolves those imports itself, depth-first and in declaration
/// order.
pub trait Evaluator: Send + Sync {
    /// Execute the source unit at `path` and return its top-level bindings
    /// and import declarations.
    fn execute_source_unit(&self, path: &Path) -> std::result::Result<SourceUnit, ExecutionError>;

    /// Whether `value` can be called.
    ///
    /// Used once per binding when auto-wrapping; the classification is never
    /// revisited afterwards. Engines with their own opaque callable types
    /// override this.
    fn is_callable(&self, value: &Value) -> bool {
        matches!(value, Value::Function(_))
    }
}

/// Provider of already-available host-ecosystem packages.
///
/// A host package is wrapped into the same module interface as a source
/// unit: its top-level members are enumerated once and classified into
/// function and constant bindings.
pub trait ForeignHost: Send + Sync {
    /// Whether a package with this name is available.
    fn is_installed(&self, name: &str) -> bool;

    /// The package's top-level members, in a stable order.
    fn members(&self, name: &str) -> std::result::Result<Vec<(String, Value)>, ForeignError>;
}

/// A [`ForeignHost`] with no packages; the default for loaders built
/// without host interop.
#[derive(Debug, Default)]
pub struct NoForeignPackages;

impl ForeignHost for NoForeignPackages {
    fn is_installed(&self, _name: &str) -> bool {
        false
    }

    fn members(&self, name: &str) -> std::result::Result<Vec<(String, Value)>, ForeignError> {
        Err(ForeignError::new(format!(
            "no host packages are available (requested '{name}')"
        )))
    }
}
