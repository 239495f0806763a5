// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 The Brio Project Developers

//! Module path resolution.
//!
//! Maps an import reference to the canonical identity of one physical
//! module: a source file, a directory with an index file, a registered
//! builtin, or an installed host package.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::context::LoaderContext;
use crate::engine::ForeignHost;
use crate::error::LoaderError;

/// Extension of Brio source units.
pub const SOURCE_EXTENSION: &str = "brio";

/// Index filenames that stand in for a directory imported as a module, in
/// priority order.
pub const INDEX_FILES: [&str; 2] = ["__init__.brio", "index.brio"];

/// Environment variable seeding the global module search paths
/// (platform path-list syntax).
pub const MODULE_PATHS_ENV: &str = "BRIO_MODULE_PATHS";

/// One import statement's reference to a module.
#[derive(Debug, Clone)]
pub struct ModuleReference {
    specifier: String,
    alias: Option<String>,
    requesting_file: Option<PathBuf>,
}

impl ModuleReference {
    /// Create a reference from the specifier as written in source.
    ///
    /// Accepts dotted references (`json`, `pkg.sub.mod`) and path-style
    /// references (`./util`, `../shared/helpers`, absolute paths).
    pub fn new(specifier: impl Into<String>) -> Self {
        Self {
            specifier: specifier.into(),
            alias: None,
            requesting_file: None,
        }
    }

    /// Attach the binding alias from an `import ... as` statement.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Attach the file whose import statement produced this reference;
    /// relative resolution starts from its directory.
    pub fn with_requesting_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.requesting_file = Some(path.into());
        self
    }

    /// The specifier as written.
    pub fn specifier(&self) -> &str {
        &self.specifier
    }

    /// The alias, if the import statement carried one.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The file that issued the import, if known.
    pub fn requesting_file(&self) -> Option<&Path> {
        self.requesting_file.as_deref()
    }

    /// The name this module binds to in the importing scope: the alias if
    /// present, otherwise the final segment of the specifier.
    pub fn binding_name(&self) -> &str {
        if let Some(alias) = &self.alias {
            return alias;
        }
        let spec = self.specifier.as_str();
        if is_path_reference(spec) {
            spec.rsplit(['/', '\\']).next().unwrap_or(spec)
        } else {
            spec.rsplit('.').next().unwrap_or(spec)
        }
    }

    fn is_path(&self) -> bool {
        is_path_reference(&self.specifier)
    }

    fn segments(&self) -> Vec<&str> {
        self.specifier.split('.').collect()
    }
}

/// Canonical, deduplicated identity of one physical module.
///
/// Two references resolving to the same identity denote the same module and
/// share one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModuleIdentity {
    /// A source unit or directory module, keyed by canonical absolute path
    Source(PathBuf),
    /// A registered standard-library module
    Builtin(String),
    /// An auto-wrapped host-ecosystem package
    Foreign(String),
}

impl ModuleIdentity {
    /// Short name for binding and diagnostics: the file stem of a source
    /// identity (its directory name for index files), or the registered
    /// name otherwise.
    pub fn short_name(&self) -> String {
        match self {
            ModuleIdentity::Source(path) => {
                let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("module");
                if INDEX_FILES.iter().any(|index| index.starts_with(stem)) {
                    path.parent()
                        .and_then(Path::file_name)
                        .and_then(|s| s.to_str())
                        .unwrap_or(stem)
                        .to_string()
                } else {
                    stem.to_string()
                }
            }
            ModuleIdentity::Builtin(name) | ModuleIdentity::Foreign(name) => name.clone(),
        }
    }
}

impl fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleIdentity::Source(path) => write!(f, "{}", path.display()),
            ModuleIdentity::Builtin(name) | ModuleIdentity::Foreign(name) => write!(f, "{name}"),
        }
    }
}

/// Resolves import references to module identities.
///
/// Filesystem search order for a named reference: the directory of the
/// requesting file, the process working directory, each configured global
/// module path, then the user package directory. Within each base the
/// dotted segments map to nested directories and the final segment tries
/// `<seg>.brio`, `<seg>/__init__.brio`, `<seg>/index.brio` in that order.
pub struct PathResolver {
    module_paths: Vec<PathBuf>,
    package_dir: PathBuf,
}

impl PathResolver {
    /// Create a resolver with explicit search paths and package directory.
    pub fn new(module_paths: Vec<PathBuf>, package_dir: impl Into<PathBuf>) -> Self {
        Self {
            module_paths,
            package_dir: package_dir.into(),
        }
    }

    /// Create a resolver configured from the environment: search paths from
    /// `BRIO_MODULE_PATHS`, package directory from `BRIO_PACKAGES_DIR`,
    /// `BRIO_HOME`, or `~/.brio/packages`.
    pub fn from_env() -> Self {
        let module_paths = std::env::var_os(MODULE_PATHS_ENV)
            .map(|raw| std::env::split_paths(&raw).collect())
            .unwrap_or_default();
        Self::new(module_paths, default_package_dir())
    }

    /// Prepend a search path; most recently added paths take precedence.
    pub fn add_module_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.module_paths.contains(&path) {
            self.module_paths.insert(0, path);
        }
    }

    /// The configured global search paths, in search order.
    pub fn module_paths(&self) -> &[PathBuf] {
        &self.module_paths
    }

    /// The fixed user package directory.
    pub fn package_dir(&self) -> &Path {
        &self.package_dir
    }

    /// Names visible in the user package directory: module files by stem
    /// and package directories, underscore-prefixed entries excluded.
    pub fn installed_packages(&self) -> Vec<String> {
        let mut names = Vec::new();
        let Ok(entries) = std::fs::read_dir(&self.package_dir) else {
            return names;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if name.starts_with('_') {
                continue;
            }
            if path.is_dir() || path.extension().and_then(|e| e.to_str()) == Some(SOURCE_EXTENSION)
            {
                names.push(name.to_string());
            }
        }
        names.sort();
        names.dedup();
        names
    }

    /// Resolve `reference` to a module identity.
    ///
    /// Builtins win over the filesystem; a single-segment name with no
    /// filesystem match falls back to an installed host package. Fails with
    /// [`LoaderError::ModuleNotFound`] carrying every attempted path.
    pub fn resolve(
        &self,
        reference: &ModuleReference,
        context: &LoaderContext,
        is_builtin: impl Fn(&str) -> bool,
        foreign: &dyn ForeignHost,
    ) -> Result<ModuleIdentity, LoaderError> {
        if !reference.is_path() && is_builtin(reference.specifier()) {
            tracing::debug!(module = reference.specifier(), "resolved to builtin");
            return Ok(ModuleIdentity::Builtin(reference.specifier().to_string()));
        }

        let mut attempted = Vec::new();

        if reference.is_path() {
            if let Some(path) = self.resolve_path_reference(reference, context, &mut attempted) {
                return Ok(ModuleIdentity::Source(canonical(&path)));
            }
        } else {
            let segments = reference.segments();
            for base in self.base_dirs(reference, context) {
                if let Some(path) = try_candidates(&base, &segments, &mut attempted) {
                    tracing::debug!(
                        module = reference.specifier(),
                        path = %path.display(),
                        "resolved to source file"
                    );
                    return Ok(ModuleIdentity::Source(canonical(&path)));
                }
            }

            // Host packages only answer plain names; dotted references
            // always mean filesystem packages.
            if segments.len() == 1 && foreign.is_installed(reference.specifier()) {
                tracing::debug!(module = reference.specifier(), "resolved to host package");
                return Ok(ModuleIdentity::Foreign(reference.specifier().to_string()));
            }
        }

        Err(LoaderError::ModuleNotFound {
            reference: reference.specifier().to_string(),
            attempted,
        })
    }

    fn resolve_path_reference(
        &self,
        reference: &ModuleReference,
        context: &LoaderContext,
        attempted: &mut Vec<PathBuf>,
    ) -> Option<PathBuf> {
        let base = self
            .requesting_dir(reference, context)
            .or_else(|| std::env::current_dir().ok())?;
        let target = base.join(reference.specifier());
        try_final_segment(&target, attempted)
    }

    fn requesting_dir(
        &self,
        reference: &ModuleReference,
        context: &LoaderContext,
    ) -> Option<PathBuf> {
        reference
            .requesting_file()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .or_else(|| context.current_file_dir())
    }

    fn base_dirs(&self, reference: &ModuleReference, context: &LoaderContext) -> Vec<PathBuf> {
        let mut bases = Vec::with_capacity(self.module_paths.len() + 3);
        if let Some(dir) = self.requesting_dir(reference, context) {
            bases.push(dir);
        }
        if let Ok(cwd) = std::env::current_dir() {
            bases.push(cwd);
        }
        bases.extend(self.module_paths.iter().cloned());
        bases.push(self.package_dir.clone());
        bases
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Where user packages live when no environment override is set:
/// `$BRIO_PACKAGES_DIR`, else `$BRIO_HOME/packages`, else
/// `~/.brio/packages`.
pub fn default_package_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("BRIO_PACKAGES_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(home) = std::env::var_os("BRIO_HOME") {
        return PathBuf::from(home).join("packages");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".brio")
        .join("packages")
}

fn is_path_reference(specifier: &str) -> bool {
    specifier.contains('/')
        || specifier.contains('\\')
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn with_source_extension(path: &Path) -> PathBuf {
    let mut raw = path.as_os_str().to_os_string();
    raw.push(".");
    raw.push(SOURCE_EXTENSION);
    PathBuf::from(raw)
}

/// Map dotted segments under `base` and try the final-segment ladder.
fn try_candidates(base: &Path, segments: &[&str], attempted: &mut Vec<PathBuf>) -> Option<PathBuf> {
    let mut target = base.to_path_buf();
    for segment in segments {
        target.push(segment);
    }
    try_final_segment(&target, attempted)
}

/// The final-segment ladder: `<target>.brio`, then each index file inside
/// the `<target>` directory, in priority order.
fn try_final_segment(target: &Path, attempted: &mut Vec<PathBuf>) -> Option<PathBuf> {
    let file = with_source_extension(target);
    if file.is_file() {
        return Some(file);
    }
    attempted.push(file);

    for index in INDEX_FILES {
        let candidate = target.join(index);
        if candidate.is_file() {
            return Some(candidate);
        }
        attempted.push(candidate);
    }
    None
}
