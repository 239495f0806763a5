// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 The Brio Project Developers

//! Builds loaded modules from source units and host packages.

use std::path::Path;
use std::sync::Arc;

use crate::context::LoaderContext;
use crate::engine::Value;
use crate::error::LoaderError;
use crate::module_system::loader::LoaderState;
use crate::module_system::module::{auto_exposed, Binding, InterfaceKind, LoadedModule};
use crate::module_system::resolver::{ModuleIdentity, ModuleReference};

/// Build the module behind `identity`.
///
/// Runs inside the loader's critical section; nested imports recurse back
/// through [`LoaderState::import`] depth-first.
pub(crate) fn build_module(
    state: &mut LoaderState,
    identity: &ModuleIdentity,
    context: &LoaderContext,
) -> Result<Arc<LoadedModule>, LoaderError> {
    match identity {
        ModuleIdentity::Builtin(name) => {
            state
                .builtins
                .get(name)
                .cloned()
                // The resolver only yields builtin identities for registered
                // names, and registration is guarded by the same lock.
                .ok_or_else(|| LoaderError::ModuleNotFound {
                    reference: name.clone(),
                    attempted: Vec::new(),
                })
        }
        ModuleIdentity::Foreign(name) => wrap_host_package(state, name).map(Arc::new),
        ModuleIdentity::Source(path) => {
            let path = path.clone();
            build_source_unit(state, identity, &path, context).map(Arc::new)
        }
    }
}

/// Execute a source unit and assemble its module, scoping the context's
/// current file to the unit for the duration of the build.
fn build_source_unit(
    state: &mut LoaderState,
    identity: &ModuleIdentity,
    path: &Path,
    context: &LoaderContext,
) -> Result<LoadedModule, LoaderError> {
    tracing::debug!(module = %identity, "executing source unit");

    let previous = context.swap_dir(path.parent().map(Path::to_path_buf));
    let result = assemble_source_module(state, identity, path, context);
    context.swap_dir(previous);
    result
}

fn assemble_source_module(
    state: &mut LoaderState,
    identity: &ModuleIdentity,
    path: &Path,
    context: &LoaderContext,
) -> Result<LoadedModule, LoaderError> {
    let unit = state.evaluator.execute_source_unit(path)?;

    // Nested imports resolve depth-first, in declaration order, before the
    // module is assembled.
    let mut imported = Vec::with_capacity(unit.imports.len());
    for declaration in &unit.imports {
        let mut reference =
            ModuleReference::new(declaration.specifier.clone()).with_requesting_file(path);
        if let Some(alias) = &declaration.alias {
            reference = reference.with_alias(alias.clone());
        }
        let module = state.import(&reference, context)?;
        imported.push((reference.binding_name().to_string(), module));
    }

    // A registry among the bindings means the unit declared its interface
    // explicitly; it is exposed verbatim and nothing else is.
    if let Some(registry) = unit.bindings.iter().find_map(|(_, value)| value.as_registry()) {
        return Ok(LoadedModule::from_registry(identity.clone(), registry));
    }

    let name = identity.short_name();
    let mut bindings = Vec::with_capacity(unit.bindings.len() + imported.len());
    for (binding_name, value) in unit.bindings {
        if !auto_exposed(&binding_name) {
            continue;
        }
        bindings.push(classify(state, binding_name, value));
    }
    for (import_name, module) in imported {
        let description = format!("imported module: {import_name}");
        bindings.push((
            import_name,
            Binding::Constant {
                value: Value::Module(module),
                description,
            },
        ));
    }

    let description = format!("Brio module: {name}");
    Ok(LoadedModule::new(
        identity.clone(),
        name,
        description,
        InterfaceKind::Auto,
        bindings,
    ))
}

/// Enumerate a host package's members once and wrap them as an
/// auto-interface module.
fn wrap_host_package(state: &LoaderState, name: &str) -> Result<LoadedModule, LoaderError> {
    let members = match state.foreign.members(name) {
        Ok(members) => members,
        Err(source) => {
            tracing::warn!(package = name, error = %source, "failed to enumerate host package");
            return Err(LoaderError::ForeignImport {
                package: name.to_string(),
                source,
            });
        }
    };

    let mut bindings = Vec::with_capacity(members.len());
    for (member_name, value) in members {
        if !auto_exposed(&member_name) {
            continue;
        }
        bindings.push(classify(state, member_name, value));
    }

    tracing::debug!(package = name, members = bindings.len(), "wrapped host package");
    Ok(LoadedModule::new(
        ModuleIdentity::Foreign(name.to_string()),
        name,
        format!("host package: {name}"),
        InterfaceKind::Auto,
        bindings,
    ))
}

/// Classify one member by callability, once; the result is final.
fn classify(state: &LoaderState, name: String, value: Value) -> (String, Binding) {
    let binding = if state.evaluator.is_callable(&value) {
        Binding::Function {
            descriptor: value,
            arity: None,
            description: format!("function: {name}"),
        }
    } else {
        Binding::Constant {
            value,
            description: format!("constant: {name}"),
        }
    };
    (name, binding)
}
