//! Typed representation of the Hack VM command set.
//!
//! Stage 1 (the Jack compiler) emits these values and serializes them once,
//! stage 2 (the VM translator) parses the very same grammar back in —
//! the format contract between the two stages lives here, in one type.

use std::str::FromStr;

// region: VmModule

/// Accumulates the VM commands emitted for one compilation unit
/// and serializes them in one go.
#[derive(Debug, Default)]
pub struct VmModule {
    commands: Vec<VmCommand>,
}

impl VmModule {
    pub const fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn emit(&mut self, command: VmCommand) {
        self.commands.push(command);
    }

    pub fn emit_all(&mut self, commands: impl IntoIterator<Item = VmCommand>) {
        self.commands.extend(commands);
    }

    pub fn compile(self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for VmModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            self.commands
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n")
        )
    }
}

// endregion

// region: VmCommand

// region: utility constructors

/// Utility function for the `push` VM command.
pub const fn push(segment: Segment, index: u16) -> VmCommand {
    VmCommand::Push(segment, index)
}

/// Utility function for the `pop` VM command.
pub const fn pop(segment: Segment, index: u16) -> VmCommand {
    VmCommand::Pop(segment, index)
}

/// Utility function for an arithmetic/logical VM command.
pub const fn arithmetic(command: ArithmeticCommand) -> VmCommand {
    VmCommand::Arithmetic(command)
}

/// Utility function for the `label` VM command.
pub fn label<S: Into<String>>(label: S) -> VmCommand {
    VmCommand::Label(label.into())
}

/// Utility function for the `goto` VM command.
pub fn goto<S: Into<String>>(label: S) -> VmCommand {
    VmCommand::Goto(label.into())
}

/// Utility function for the `if-goto` VM command.
pub fn if_goto<S: Into<String>>(label: S) -> VmCommand {
    VmCommand::IfGoto(label.into())
}

/// Utility function for the `function` VM command.
pub fn function<S: Into<String>>(function_name: S, variable_count: u16) -> VmCommand {
    VmCommand::Function(function_name.into(), variable_count)
}

/// Utility function for the `call` VM command.
pub fn call<S: Into<String>>(function_name: S, argument_count: u16) -> VmCommand {
    VmCommand::Call(function_name.into(), argument_count)
}

/// Utility function for the `return` VM command.
pub const fn vm_return() -> VmCommand {
    VmCommand::Return
}

// endregion

type Index = u16;
type Label = String;
type Count = u16;
type FunctionName = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmCommand {
    Arithmetic(ArithmeticCommand),
    Push(Segment, Index),
    Pop(Segment, Index),
    Label(Label),
    Goto(Label),
    IfGoto(Label),
    Function(FunctionName, Count),
    Call(FunctionName, Count),
    Return,
}

impl std::fmt::Display for VmCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Arithmetic(command) => write!(f, "{command}"),
            Self::Push(segment, i) => write!(f, "push {segment} {i}"),
            Self::Pop(segment, i) => write!(f, "pop {segment} {i}"),
            Self::Label(label) => write!(f, "label {label}"),
            Self::Goto(label) => write!(f, "goto {label}"),
            Self::IfGoto(label) => write!(f, "if-goto {label}"),
            Self::Function(name, variable_count) => {
                write!(f, "function {name} {variable_count}")
            }
            Self::Call(name, argument_count) => write!(f, "call {name} {argument_count}"),
            Self::Return => write!(f, "return"),
        }
    }
}

impl FromStr for VmCommand {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = line.split_whitespace();

        let command = fields
            .next()
            .ok_or(ParseCommandError::MissingField("command"))?;

        // arithmetic/logical commands are single-field
        if let Ok(arithmetic) = command.parse::<ArithmeticCommand>() {
            return Ok(Self::Arithmetic(arithmetic));
        }

        let parsed = match command {
            "push" | "pop" => {
                let segment = fields
                    .next()
                    .ok_or(ParseCommandError::MissingField("segment"))?;
                let segment = segment
                    .parse::<Segment>()
                    .map_err(|_| ParseCommandError::UnknownSegment(segment.to_string()))?;
                let index = parse_index(&mut fields)?;

                if command == "push" {
                    Self::Push(segment, index)
                } else {
                    Self::Pop(segment, index)
                }
            }
            "label" => Self::Label(parse_name(&mut fields)?),
            "goto" => Self::Goto(parse_name(&mut fields)?),
            "if-goto" => Self::IfGoto(parse_name(&mut fields)?),
            "function" => {
                let name = parse_name(&mut fields)?;
                Self::Function(name, parse_index(&mut fields)?)
            }
            "call" => {
                let name = parse_name(&mut fields)?;
                Self::Call(name, parse_index(&mut fields)?)
            }
            "return" => Self::Return,
            unknown => return Err(ParseCommandError::UnknownCommand(unknown.to_string())),
        };

        Ok(parsed)
    }
}

fn parse_name<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
) -> Result<String, ParseCommandError> {
    fields
        .next()
        .map(String::from)
        .ok_or(ParseCommandError::MissingField("name"))
}

fn parse_index<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
) -> Result<u16, ParseCommandError> {
    let field = fields
        .next()
        .ok_or(ParseCommandError::MissingField("index"))?;

    field
        .parse::<u16>()
        .map_err(|_| ParseCommandError::InvalidIndex(field.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCommandError {
    UnknownCommand(String),
    UnknownSegment(String),
    MissingField(&'static str),
    InvalidIndex(String),
}

impl std::fmt::Display for ParseCommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownCommand(command) => write!(f, "unknown VM command `{command}`"),
            Self::UnknownSegment(segment) => write!(f, "unknown memory segment `{segment}`"),
            Self::MissingField(field) => write!(f, "missing `{field}` field"),
            Self::InvalidIndex(index) => write!(f, "invalid index `{index}`"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ArithmeticCommand {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

// endregion
