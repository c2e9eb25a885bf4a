//! Line/field scanning of `.vm` source units into typed VM commands.

use crate::common::{significant_line, vm::VmCommand};

use super::TranslateError;

/// One VM source unit; its name (the originating file's stem) is the
/// namespace prefix for every `static` access the unit makes.
#[derive(Debug)]
pub struct VmUnit {
    pub name: String,
    pub commands: Vec<VmCommand>,
}

pub fn parse_unit(name: &str, text: &str) -> Result<VmUnit, TranslateError> {
    let mut commands = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let Some(line) = significant_line(line) else {
            continue;
        };

        let command = line.parse().map_err(|error| TranslateError::Parse {
            unit: name.to_string(),
            line: index + 1,
            error,
        })?;

        commands.push(command);
    }

    Ok(VmUnit {
        name: name.to_string(),
        commands,
    })
}
