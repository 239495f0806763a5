// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 The Brio Project Developers

//! Loader context: the "current file" used for relative imports.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;

static DEFAULT_CONTEXT: LazyLock<LoaderContext> = LazyLock::new(LoaderContext::new);

/// The process-wide default context.
///
/// Convenient for the common single-script case. Callers running several
/// top-level scripts concurrently construct one [`LoaderContext`] per
/// execution instead, so "current file" state is never shared by accident.
pub fn loader_context() -> LoaderContext {
    DEFAULT_CONTEXT.clone()
}

/// Tracks the file currently being executed, so imports written relative to
/// it resolve against its directory.
///
/// Cloning a context shares its state; contexts created with
/// [`LoaderContext::new`] are fully independent.
#[derive(Clone, Debug, Default)]
pub struct LoaderContext {
    current_dir: Arc<Mutex<Option<PathBuf>>>,
}

impl LoaderContext {
    /// Create an isolated context with no current file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path` as the file being executed; relative imports will
    /// resolve against its parent directory.
    pub fn set_current_file(&self, path: impl AsRef<Path>) {
        let dir = path.as_ref().parent().map(Path::to_path_buf);
        *self.current_dir.lock() = dir;
    }

    /// Directory of the current file, if one is set.
    pub fn current_file_dir(&self) -> Option<PathBuf> {
        self.current_dir.lock().clone()
    }

    /// Forget the current file.
    pub fn clear(&self) {
        *self.current_dir.lock() = None;
    }

    /// Swap in a new current-file directory and return the previous one.
    ///
    /// The builder uses this to scope the context to the unit being built
    /// and restore the importer's state afterwards.
    pub(crate) fn swap_dir(&self, dir: Option<PathBuf>) -> Option<PathBuf> {
        std::mem::replace(&mut self.current_dir.lock(), dir)
    }
}
