//! C-instruction field encoding.
//!
//! Each mnemonic maps to its bit pattern through a static table. An
//! unknown mnemonic encodes as all-zero bits by default; under strict
//! encoding it is reported instead, carrying the offending mnemonic
//! so the caller can attach a source location.

use phf::phf_map;

/// `a`+`c1..c6` bits, indexed by computation mnemonic.
static COMP: phf::Map<&'static str, u16> = phf_map! {
    "0" => 0b0101010,
    "1" => 0b0111111,
    "-1" => 0b0111010,
    "D" => 0b0001100,
    "A" => 0b0110000,
    "M" => 0b1110000,
    "!D" => 0b0001101,
    "!A" => 0b0110001,
    "!M" => 0b1110001,
    "-D" => 0b0001111,
    "-A" => 0b0110011,
    "-M" => 0b1110011,
    "D+1" => 0b0011111,
    "A+1" => 0b0110111,
    "M+1" => 0b1110111,
    "D-1" => 0b0001110,
    "A-1" => 0b0110010,
    "M-1" => 0b1110010,
    "D+A" => 0b0000010,
    "D+M" => 0b1000010,
    "D-A" => 0b0010011,
    "D-M" => 0b1010011,
    "A-D" => 0b0000111,
    "M-D" => 0b1000111,
    "D&A" => 0b0000000,
    "D&M" => 0b1000000,
    "D|A" => 0b0010101,
    "D|M" => 0b1010101,
};

/// `d1..d3` bits. Register order within a multi-target destination is
/// not significant.
static DEST: phf::Map<&'static str, u16> = phf_map! {
    "M" => 0b001,
    "D" => 0b010,
    "DM" => 0b011,
    "MD" => 0b011,
    "A" => 0b100,
    "AM" => 0b101,
    "AD" => 0b110,
    "ADM" => 0b111,
    "AMD" => 0b111,
};

/// `j1..j3` bits.
static JUMP: phf::Map<&'static str, u16> = phf_map! {
    "JGT" => 0b001,
    "JEQ" => 0b010,
    "JGE" => 0b011,
    "JLT" => 0b100,
    "JNE" => 0b101,
    "JLE" => 0b110,
    "JMP" => 0b111,
};

/// Which C-instruction field an unknown mnemonic appeared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Field {
    Dest,
    Comp,
    Jump,
}

/// An unrecognized mnemonic, rejected by strict encoding.
#[derive(Debug, PartialEq, Eq)]
pub struct UnknownMnemonic {
    pub field: Field,
    pub mnemonic: String,
}

/// Assemble the 16-bit word of a C-instruction from its three mnemonic
/// fields. With `strict` unset, unknown mnemonics contribute zero bits.
pub fn encode(
    dest: Option<&str>,
    comp: &str,
    jump: Option<&str>,
    strict: bool,
) -> Result<u16, UnknownMnemonic> {
    let comp_bits = lookup(&COMP, Some(comp), Field::Comp, strict)?;
    let dest_bits = lookup(&DEST, dest, Field::Dest, strict)?;
    let jump_bits = lookup(&JUMP, jump, Field::Jump, strict)?;

    Ok(0b111 << 13 | comp_bits << 6 | dest_bits << 3 | jump_bits)
}

fn lookup(
    table: &phf::Map<&'static str, u16>,
    mnemonic: Option<&str>,
    field: Field,
    strict: bool,
) -> Result<u16, UnknownMnemonic> {
    let Some(mnemonic) = mnemonic else {
        return Ok(0);
    };

    match table.get(mnemonic) {
        Some(&bits) => Ok(bits),
        None if strict => Err(UnknownMnemonic {
            field,
            mnemonic: mnemonic.to_string(),
        }),
        None => Ok(0),
    }
}
