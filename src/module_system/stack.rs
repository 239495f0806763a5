// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 The Brio Project Developers

//! Reentrancy guard over in-flight loads.

use std::fmt;

use crate::error::LoaderError;
use crate::module_system::resolver::ModuleIdentity;

/// The ordered chain of a detected import cycle, from the first occurrence
/// of the repeated identity through its repetition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportChain(
    /// The identities along the cycle, importer first
    pub Vec<ModuleIdentity>,
);

impl fmt::Display for ImportChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, identity) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{identity}")?;
        }
        Ok(())
    }
}

/// Ordered list of modules currently mid-load.
///
/// An explicit structure rather than call-stack recursion, so cycle
/// detection and diagnostics operate on inspectable data. Entries are pushed
/// when a resolution begins and must be removed on every exit path,
/// including failure; a stale entry would poison later imports of the same
/// name.
#[derive(Debug, Default)]
pub struct LoadStack {
    entries: Vec<ModuleIdentity>,
}

impl LoadStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `identity` onto the chain.
    ///
    /// Fails with [`LoaderError::CircularImport`] if the identity is already
    /// mid-load; the error carries the chain from its first occurrence
    /// through the repeat (`a -> b -> a`).
    pub fn enter(&mut self, identity: &ModuleIdentity) -> Result<(), LoaderError> {
        if let Some(first) = self.entries.iter().position(|entry| entry == identity) {
            let mut chain = self.entries[first..].to_vec();
            chain.push(identity.clone());
            return Err(LoaderError::CircularImport {
                chain: ImportChain(chain),
            });
        }
        self.entries.push(identity.clone());
        Ok(())
    }

    /// Remove the most recent occurrence of `identity`.
    pub fn exit(&mut self, identity: &ModuleIdentity) {
        if let Some(pos) = self.entries.iter().rposition(|entry| entry == identity) {
            self.entries.remove(pos);
        }
    }

    /// Whether `identity` is currently mid-load.
    pub fn contains(&self, identity: &ModuleIdentity) -> bool {
        self.entries.iter().any(|entry| entry == identity)
    }

    /// Number of in-flight loads.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no load is in flight.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn source(name: &str) -> ModuleIdentity {
        ModuleIdentity::Source(PathBuf::from(format!("/mods/{name}.brio")))
    }

    #[test]
    fn enter_and_exit_track_the_chain() {
        let mut stack = LoadStack::new();
        let a = source("a");
        let b = source("b");

        stack.enter(&a).unwrap();
        stack.enter(&b).unwrap();
        assert_eq!(stack.len(), 2);
        assert!(stack.contains(&a));

        stack.exit(&b);
        stack.exit(&a);
        assert!(stack.is_empty());
    }

    #[test]
    fn reentry_reports_the_cycle_chain() {
        let mut stack = LoadStack::new();
        let a = source("a");
        let b = source("b");

        stack.enter(&a).unwrap();
        stack.enter(&b).unwrap();

        let err = stack.enter(&a).unwrap_err();
        match err {
            LoaderError::CircularImport { chain } => {
                assert_eq!(chain.0, vec![a.clone(), b, a]);
            }
            other => panic!("expected CircularImport, got {other:?}"),
        }
    }

    #[test]
    fn chain_starts_at_the_first_occurrence() {
        let mut stack = LoadStack::new();
        let a = source("a");
        let b = source("b");
        let c = source("c");

        stack.enter(&a).unwrap();
        stack.enter(&b).unwrap();
        stack.enter(&c).unwrap();

        let err = stack.enter(&b).unwrap_err();
        match err {
            LoaderError::CircularImport { chain } => {
                assert_eq!(chain.0, vec![b.clone(), c, b]);
                assert_eq!(format!("{chain}"), "/mods/b.brio -> /mods/c.brio -> /mods/b.brio");
            }
            other => panic!("expected CircularImport, got {other:?}"),
        }
    }

    #[test]
    fn failed_enter_leaves_the_stack_usable() {
        let mut stack = LoadStack::new();
        let a = source("a");

        stack.enter(&a).unwrap();
        assert!(stack.enter(&a).is_err());
        assert_eq!(stack.len(), 1);

        stack.exit(&a);
        stack.enter(&a).unwrap();
    }
}
