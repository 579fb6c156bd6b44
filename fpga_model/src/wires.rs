// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Interned wire names.

use std::collections::BTreeMap;

/// Identifier of an interned wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WireId(u32);

/// Wire name registry shared by tile switches and the routing bit-position
/// database.
///
/// `lookup(name(id)) == Some(id)` for every id handed out by `intern`.
#[derive(Debug, Default)]
pub struct WireSet {
    names: Vec<String>,
    index: BTreeMap<String, WireId>,
}

impl WireSet {
    /// Returns the id of `name`, interning it on first use.
    pub fn intern(&mut self, name: &str) -> WireId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = WireId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        id
    }

    /// Returns the id of an already-interned name.
    pub fn lookup(&self, name: &str) -> Option<WireId> {
        self.index.get(name).copied()
    }

    /// Returns the name behind `id`.
    ///
    /// Panics if `id` was not produced by this set's `intern`.
    pub fn name(&self, id: WireId) -> &str {
        &self.names[id.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let mut wires = WireSet::default();
        let a = wires.intern("LOGICIN_B29");
        let b = wires.intern("NR1B2");
        assert_ne!(a, b);
        assert_eq!(wires.intern("LOGICIN_B29"), a);
    }

    #[test]
    fn lookup_of_name_is_identity() {
        let mut wires = WireSet::default();
        let id = wires.intern("SE2B3");
        assert_eq!(wires.lookup(wires.name(id)), Some(id));
        assert_eq!(wires.lookup("not-interned"), None);
    }
}
