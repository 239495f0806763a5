// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 The Brio Project Developers

//! # brio-loader
//!
//! Module resolution, loading and caching for the Brio language runtime.
//!
//! For every `import` reference in a Brio program this crate decides which
//! physical unit the name denotes, executes that unit at most once, and
//! hands back the bindings it exposes:
//!
//! - ordered search paths with dotted-path-to-filesystem mapping and
//!   directory/index-file fallback
//! - a bounded, recency-ordered module cache
//! - cycle detection over an explicit load stack
//! - one interface over two module shapes: Brio source units and
//!   auto-wrapped host-ecosystem packages
//!
//! The lexer, parser and evaluator are external collaborators reached
//! through the [`engine::Evaluator`] and [`engine::ForeignHost`] traits.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use brio_loader::{loader_context, ModuleLoader, ModuleReference};
//!
//! let loader = ModuleLoader::new(Arc::new(MyEvaluator::new()));
//! loader.add_module_path("./lib");
//!
//! let context = loader_context();
//! context.set_current_file("./main.brio");
//!
//! let json = loader.import_module(&ModuleReference::new("json"), &context)?;
//! let parsed = json.call("parse", &[input])?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod engine;
pub mod error;
pub mod module_system;

// Re-exports
pub use context::{loader_context, LoaderContext};
pub use engine::{Callable, Evaluator, ForeignHost, SourceUnit, Value};
pub use error::{LoaderError, Result};
pub use module_system::{
    Binding, ExportRegistry, InterfaceKind, LoadedModule, ModuleIdentity, ModuleLoader,
    ModuleReference,
};

/// Version of the loader crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
