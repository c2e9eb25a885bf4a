//! Typed representation of Hack symbolic assembly.
//!
//! Stage 2 (the VM translator) emits these values, stage 3 (the assembler)
//! reads them back from text. C-instruction mnemonics are kept as raw text
//! rather than enums: the assembler's encoding tables are the single
//! authority on which mnemonics exist, and its lenient default-on-miss
//! behavior has to survive parsing.

// region: AsmModule

/// Accumulates the assembly instructions for a whole translated program
/// and serializes them in one go.
#[derive(Debug, Default)]
pub struct AsmModule {
    instructions: Vec<AsmInstruction>,
}

impl AsmModule {
    pub const fn new() -> Self {
        Self {
            instructions: Vec::new(),
        }
    }

    pub fn emit_all(&mut self, instructions: impl IntoIterator<Item = AsmInstruction>) {
        self.instructions.extend(instructions);
    }

    pub fn compile(self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for AsmModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            self.instructions
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n")
        )
    }
}

// endregion

// region: AsmInstruction

// region: utility constructors

/// Utility function for an A-instruction referencing a symbol.
pub fn at<S: Into<String>>(symbol: S) -> AsmInstruction {
    AsmInstruction::A(Address::Symbol(symbol.into()))
}

/// Utility function for an A-instruction holding a literal value.
pub const fn at_value(value: u16) -> AsmInstruction {
    AsmInstruction::A(Address::Literal(value))
}

/// Utility function for a `dest=comp` C-instruction.
pub fn assign<S: Into<String>, T: Into<String>>(dest: S, comp: T) -> AsmInstruction {
    AsmInstruction::C {
        dest: Some(dest.into()),
        comp: comp.into(),
        jump: None,
    }
}

/// Utility function for a `comp;jump` C-instruction.
pub fn jump<S: Into<String>, T: Into<String>>(comp: S, jump: T) -> AsmInstruction {
    AsmInstruction::C {
        dest: None,
        comp: comp.into(),
        jump: Some(jump.into()),
    }
}

/// Utility function for a label definition pseudo-instruction.
pub fn label<S: Into<String>>(name: S) -> AsmInstruction {
    AsmInstruction::Label(name.into())
}

// endregion

/// The operand of an A-instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Literal(u16),
    Symbol(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsmInstruction {
    A(Address),
    C {
        dest: Option<String>,
        comp: String,
        jump: Option<String>,
    },
    /// Label definition — does not occupy an instruction slot.
    Label(String),
}

impl AsmInstruction {
    /// Classify and split one significant (trimmed, non-comment) line.
    ///
    /// Never fails: anything that is not an A-instruction or a label
    /// definition is taken as a C-instruction, and the validity of its
    /// mnemonics is the encoder's concern.
    pub fn parse_line(line: &str) -> Self {
        if let Some(operand) = line.strip_prefix('@') {
            let address = if operand.starts_with(|c: char| c.is_ascii_digit()) {
                operand
                    .parse::<u16>()
                    .map_or_else(|_| Address::Symbol(operand.to_string()), Address::Literal)
            } else {
                Address::Symbol(operand.to_string())
            };
            return Self::A(address);
        }

        if let Some(name) = line
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return Self::Label(name.to_string());
        }

        // `dest=comp;jump`, both `dest` and `jump` optional
        let (dest, rest) = match line.split_once('=') {
            Some((dest, rest)) => (Some(dest.trim().to_string()), rest),
            None => (None, line),
        };
        let (comp, jump) = match rest.split_once(';') {
            Some((comp, jump)) => (comp, Some(jump.trim().to_string())),
            None => (rest, None),
        };

        Self::C {
            dest,
            comp: comp.trim().to_string(),
            jump,
        }
    }
}

impl std::fmt::Display for AsmInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A(Address::Literal(value)) => write!(f, "@{value}"),
            Self::A(Address::Symbol(symbol)) => write!(f, "@{symbol}"),
            Self::C { dest, comp, jump } => {
                if let Some(dest) = dest {
                    write!(f, "{dest}=")?;
                }
                write!(f, "{comp}")?;
                if let Some(jump) = jump {
                    write!(f, ";{jump}")?;
                }
                Ok(())
            }
            Self::Label(name) => write!(f, "({name})"),
        }
    }
}

// endregion
