//! Two-level lexical scoping for Jack compilation: a class-scope table
//! (`static`/`field` declarations) living for one class, and a
//! subroutine-scope table (`argument`/`local`) reset at the start of
//! every subroutine. Subroutine scope shadows class scope on lookup.

use std::collections::HashMap;

use crate::common::vm;

/// A declared variable's scope/lifetime category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum StorageClass {
    Static,
    Field,
    Argument,
    Local,
}

impl StorageClass {
    /// The VM memory segment a variable of this storage class lives in.
    /// `field` variables are addressed through the object base, i.e. `this`;
    /// the rest map 1:1.
    pub const fn segment(self) -> vm::Segment {
        match self {
            Self::Static => vm::Segment::Static,
            Self::Field => vm::Segment::This,
            Self::Argument => vm::Segment::Argument,
            Self::Local => vm::Segment::Local,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    pub declared_type: String,
    pub storage: StorageClass,
    pub index: u16,
}

impl SymbolEntry {
    /// Helper for a `push` of this variable's runtime slot.
    pub const fn push(&self) -> vm::VmCommand {
        vm::push(self.storage.segment(), self.index)
    }

    /// Helper for a `pop` into this variable's runtime slot.
    pub const fn pop(&self) -> vm::VmCommand {
        vm::pop(self.storage.segment(), self.index)
    }
}

/// One scope's worth of symbol definitions, with a monotonically
/// increasing index per storage class — the index is the variable's
/// offset inside its memory segment.
#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: HashMap<String, SymbolEntry>,
    indices: HashMap<StorageClass, u16>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard all definitions and restart index assignment.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.indices.clear();
    }

    /// Register a declaration, assigning the next free index
    /// of its storage class.
    pub fn define(&mut self, name: String, declared_type: String, storage: StorageClass) {
        let index = self.indices.entry(storage).or_default();

        self.entries.insert(
            name,
            SymbolEntry {
                declared_type,
                storage,
                index: *index,
            },
        );

        *index += 1;
    }

    pub fn lookup(&self, name: &str) -> Option<&SymbolEntry> {
        self.entries.get(name)
    }

    /// Number of variables declared with the given storage class.
    pub fn count(&self, storage: StorageClass) -> u16 {
        self.indices.get(&storage).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_increase_per_storage_class() {
        let mut table = SymbolTable::new();

        table.define("x".to_string(), "int".to_string(), StorageClass::Field);
        table.define("y".to_string(), "int".to_string(), StorageClass::Field);
        table.define("count".to_string(), "int".to_string(), StorageClass::Static);

        // each storage class numbers its variables independently, from 0
        assert_eq!(
            table.lookup("x"),
            Some(&SymbolEntry {
                declared_type: "int".to_string(),
                storage: StorageClass::Field,
                index: 0,
            })
        );
        assert_eq!(
            table.lookup("y").map(|entry| entry.index),
            Some(1)
        );
        assert_eq!(
            table.lookup("count").map(|entry| entry.index),
            Some(0)
        );

        assert_eq!(table.count(StorageClass::Field), 2);
        assert_eq!(table.count(StorageClass::Static), 1);
        assert_eq!(table.count(StorageClass::Local), 0);
    }

    #[test]
    fn test_reset_discards_entries_and_indices() {
        let mut table = SymbolTable::new();

        table.define("a".to_string(), "int".to_string(), StorageClass::Argument);
        table.reset();

        assert_eq!(table.lookup("a"), None);

        table.define("b".to_string(), "int".to_string(), StorageClass::Argument);
        assert_eq!(table.lookup("b").map(|entry| entry.index), Some(0));
    }

    #[test]
    fn test_field_maps_to_this_segment() {
        let entry = SymbolEntry {
            declared_type: "Point".to_string(),
            storage: StorageClass::Field,
            index: 1,
        };

        assert_eq!(entry.push().to_string(), "push this 1");
        assert_eq!(entry.pop().to_string(), "pop this 1");
    }
}
