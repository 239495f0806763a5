// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 The Brio Project Developers

//! Error types for the module loader

use std::path::PathBuf;
use thiserror::Error;

use crate::engine::{ExecutionError, ForeignError};
use crate::module_system::ImportChain;

/// Result type for loader operations
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Errors that can occur while resolving, loading or calling into modules
#[derive(Debug, Error)]
pub enum LoaderError {
    /// No candidate location matched the reference
    #[error("cannot find module '{reference}'{}", attempted_list(.attempted))]
    ModuleNotFound {
        /// The import specifier as written
        reference: String,
        /// Every filesystem location tried, in search order
        attempted: Vec<PathBuf>,
    },

    /// The reference closed a cycle in the active load chain
    #[error("circular import detected: {chain}")]
    CircularImport {
        /// Ordered chain from the first occurrence through the repeat
        chain: ImportChain,
    },

    /// A registered function was called with the wrong argument count
    #[error("function '{name}' expects {expected} arguments, got {got}")]
    ArityMismatch {
        /// Name of the registered function
        name: String,
        /// Registered positional arity
        expected: usize,
        /// Number of arguments supplied
        got: usize,
    },

    /// No function is registered under the requested name
    #[error("function '{name}' not found in module '{module}'")]
    NameNotFound {
        /// The requested name
        name: String,
        /// Module whose interface was queried
        module: String,
    },

    /// Wrapping a host-ecosystem package failed
    #[error("failed to import host package '{package}'")]
    ForeignImport {
        /// Name of the host package
        package: String,
        /// Failure reported by the host
        #[source]
        source: ForeignError,
    },

    /// The evaluator failed while executing a source unit
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

fn attempted_list(attempted: &[PathBuf]) -> String {
    if attempted.is_empty() {
        return String::new();
    }
    let mut out = String::from(" (searched: ");
    for (i, path) in attempted.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&path.display().to_string());
    }
    out.push(')');
    out
}
