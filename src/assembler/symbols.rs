//! Assembly symbol resolution: predefined register names, label
//! definitions from the first pass, and variables allocated on first
//! use during the second pass.

use std::collections::HashMap;

/// RAM address where variable allocation starts, just past the
/// sixteen named registers.
const VARIABLE_BASE: u16 = 16;

#[derive(Debug)]
pub struct SymbolTable {
    symbols: HashMap<String, u16>,
    next_variable: u16,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut symbols: HashMap<String, u16> = (0..16)
            .map(|register| (format!("R{register}"), register))
            .collect();

        symbols.extend(
            [
                ("SP", 0),
                ("LCL", 1),
                ("ARG", 2),
                ("THIS", 3),
                ("THAT", 4),
                ("SCREEN", 16384),
                ("KBD", 24576),
            ]
            .map(|(name, address)| (name.to_string(), address)),
        );

        Self {
            symbols,
            next_variable: VARIABLE_BASE,
        }
    }

    /// Bind a label to the ROM address of the instruction that follows it.
    pub fn define_label(&mut self, name: &str, address: u16) {
        self.symbols.insert(name.to_string(), address);
    }

    /// Resolve a symbol, allocating it as a fresh RAM variable if this is
    /// its first appearance.
    pub fn resolve(&mut self, name: &str) -> u16 {
        if let Some(&address) = self.symbols.get(name) {
            return address;
        }

        let address = self.next_variable;
        self.symbols.insert(name.to_string(), address);
        self.next_variable += 1;

        address
    }
}
