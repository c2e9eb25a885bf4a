//! Stage 3: assembling Hack symbolic assembly into binary machine code.
//!
//! Two passes over the instruction stream: the first binds every label
//! to the ROM address of the instruction after it, the second encodes
//! instructions and allocates variables on first use.

use crate::common::{
    asm::{Address, AsmInstruction},
    significant_line,
};

mod code;
mod symbols;

pub use code::Field;

#[derive(Debug)]
pub enum AssembleError {
    UnknownMnemonic {
        line: usize,
        field: Field,
        mnemonic: String,
    },
}

impl std::fmt::Display for AssembleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownMnemonic {
                line,
                field,
                mnemonic,
            } => {
                write!(f, "line {line}: unknown {field} mnemonic `{mnemonic}`")
            }
        }
    }
}

/// Assemble a full `.asm` program into its `.hack` binary image, one
/// 16-bit word per line.
pub fn assemble(source: &str, strict: bool) -> Result<String, AssembleError> {
    let mut symbol_table = symbols::SymbolTable::new();
    let mut instructions = Vec::new();

    // first pass: parse, bind labels to ROM addresses
    for (index, line) in source.lines().enumerate() {
        let Some(line) = significant_line(line) else {
            continue;
        };

        match AsmInstruction::parse_line(line) {
            AsmInstruction::Label(name) => {
                let address = u16::try_from(instructions.len()).unwrap_or(u16::MAX);
                symbol_table.define_label(&name, address);
            }
            instruction => instructions.push((index + 1, instruction)),
        }
    }

    // second pass: resolve symbols, encode
    let mut words = Vec::with_capacity(instructions.len());

    for (line, instruction) in instructions {
        let word = match instruction {
            AsmInstruction::A(Address::Literal(value)) => value,
            AsmInstruction::A(Address::Symbol(symbol)) => symbol_table.resolve(&symbol),
            AsmInstruction::C { dest, comp, jump } => {
                code::encode(dest.as_deref(), &comp, jump.as_deref(), strict).map_err(
                    |error| AssembleError::UnknownMnemonic {
                        line,
                        field: error.field,
                        mnemonic: error.mnemonic,
                    },
                )?
            }
            AsmInstruction::Label(_) => unreachable!("labels are consumed by the first pass"),
        };

        words.push(format!("{word:016b}"));
    }

    Ok(words.join("\n"))
}
