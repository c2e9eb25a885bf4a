//! Data & logic shared across pipeline stages:
//! the VM command set (stage 1 output / stage 2 input),
//! the assembly instruction set (stage 2 output / stage 3 input),
//! and the line scanning both textual readers use.

pub mod asm;
pub mod vm;

/// Strip a trailing `//` comment and surrounding whitespace from one
/// physical line of a `.vm` or `.asm` file, returning [None] if nothing
/// significant remains.
pub fn significant_line(line: &str) -> Option<&str> {
    let line = match line.split_once("//") {
        Some((code, _comment)) => code,
        None => line,
    };

    let line = line.trim();

    if line.is_empty() {
        None
    } else {
        Some(line)
    }
}
