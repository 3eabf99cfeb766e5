// SPDX-License-Identifier: Apache-2.0
//! Exported/imported symbol tables (spec §4.B).

use std::collections::BTreeSet;

/// The symbols an artifact exports and the symbols it requires from the
/// registry of already-loaded modules.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    exports: BTreeSet<String>,
    imports: BTreeSet<String>,
}

impl SymbolTable {
    /// Builds a table from explicit export/import name lists.
    #[must_use]
    pub fn new(
        exports: impl IntoIterator<Item = String>,
        imports: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            exports: exports.into_iter().collect(),
            imports: imports.into_iter().collect(),
        }
    }

    /// Names this artifact exports.
    #[must_use]
    pub fn exports(&self) -> &BTreeSet<String> {
        &self.exports
    }

    /// Names this artifact requires to be resolvable elsewhere.
    #[must_use]
    pub fn imports(&self) -> &BTreeSet<String> {
        &self.imports
    }

    /// Returns the first import not present in `available` (the registry's
    /// combined export set), or `None` if every import resolves.
    #[must_use]
    pub fn first_unresolved<'a>(&'a self, available: &BTreeSet<String>) -> Option<&'a str> {
        self.imports
            .iter()
            .find(|name| !available.contains(*name))
            .map(String::as_str)
    }
}
