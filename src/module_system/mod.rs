// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 The Brio Project Developers

//! Brio module system implementation
//!
//! Turns `import` references into shared [`LoadedModule`] values:
//!
//! - [`PathResolver`] maps a reference to the canonical identity of one
//!   physical module
//! - [`LoadStack`] guards against import cycles
//! - [`ModuleCache`] keeps built modules resident, bounded with LRU
//!   eviction
//! - [`ExportRegistry`] backs explicitly declared module interfaces
//! - [`ModuleLoader`] ties the pieces together behind one lock

mod builder;
mod cache;
mod loader;
mod module;
mod registry;
mod resolver;
mod stack;

pub use cache::{ModuleCache, DEFAULT_CAPACITY};
pub use loader::ModuleLoader;
pub use module::{Binding, InterfaceKind, LoadedModule};
pub use registry::ExportRegistry;
pub use resolver::{
    default_package_dir, ModuleIdentity, ModuleReference, PathResolver, INDEX_FILES,
    MODULE_PATHS_ENV, SOURCE_EXTENSION,
};
pub use stack::{ImportChain, LoadStack};
