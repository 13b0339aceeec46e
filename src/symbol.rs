//! Pass-one side tables: symbols, equates, undeclared references, comments,
//! and the per-line symbol declarations the listing column needs.

use std::collections::BTreeMap;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SymbolEntry {
    pub value: u16,
    /// Zero-based source line of the declaration.
    pub line: usize,
}

/// Identifier-ordered symbol table. Ordered iteration feeds the listing's
/// symbol-table block directly.
#[derive(Default, Debug)]
pub struct SymbolTable {
    map: BTreeMap<String, SymbolEntry>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    /// Declares a symbol at the given value. Redefinition is an error and
    /// leaves the original entry in place.
    pub fn declare(&mut self, name: &str, value: u16, line: usize) -> Result<(), ()> {
        if self.map.contains_key(name) {
            return Err(());
        }
        self.map.insert(name.to_string(), SymbolEntry { value, line });
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn value(&self, name: &str) -> Option<u16> {
        self.map.get(name).map(|e| e.value)
    }

    /// Overwrites the value of an existing symbol (`.EQUATE` and post-burn
    /// equate restoration).
    pub fn set_value(&mut self, name: &str, value: u16) {
        if let Some(entry) = self.map.get_mut(name) {
            entry.value = value;
        }
    }

    /// Shifts every value by the burn delta, wrapping at the address space.
    pub fn shift_all(&mut self, delta: u16) {
        for entry in self.map.values_mut() {
            entry.value = entry.value.wrapping_add(delta);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SymbolEntry)> {
        self.map.iter().map(|(name, entry)| (name.as_str(), entry))
    }
}

/// `.EQUATE` bindings in declaration order. Equate values are absolute, so
/// after a `.BURN` shift they are stamped back over the shifted entries.
#[derive(Default, Debug)]
pub struct EquateList {
    entries: Vec<(String, u16)>,
}

impl EquateList {
    pub fn push(&mut self, name: &str, value: u16) {
        self.entries.push((name.to_string(), value));
    }

    pub fn restore(&self, symbols: &mut SymbolTable) {
        for (name, value) in &self.entries {
            symbols.set_value(name, *value);
        }
    }
}

/// A symbol use, recorded at parse time and checked once the whole source
/// has been seen (forward references are legal).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct UndeclaredRef {
    pub name: String,
    pub line: usize,
}

/// Comments by source line. Trailing comments on nonempty lines render
/// narrower than full-line comments.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CommentEntry {
    pub line: usize,
    pub trailing: bool,
    pub text: String,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn declare_and_redefine() {
        let mut table = SymbolTable::new();
        assert!(table.declare("main", 4, 2).is_ok());
        assert!(table.declare("main", 9, 5).is_err());
        assert_eq!(table.value("main"), Some(4));
    }

    #[test]
    fn ordered_iteration() {
        let mut table = SymbolTable::new();
        table.declare("zeta", 1, 0).ok();
        table.declare("alpha", 2, 1).ok();
        table.declare("mid", 3, 2).ok();
        let names: Vec<&str> = table.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn burn_shift_spares_equates() {
        let mut table = SymbolTable::new();
        let mut equates = EquateList::default();
        table.declare("buf", 0x0003, 0).ok();
        table.declare("size", 0x0010, 1).ok();
        equates.push("size", 0x0010);
        table.shift_all(0xFFF0);
        equates.restore(&mut table);
        assert_eq!(table.value("buf"), Some(0xFFF3));
        assert_eq!(table.value("size"), Some(0x0010));
    }
}
