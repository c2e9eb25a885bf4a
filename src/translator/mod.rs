//! Stage 2: lowering Hack VM code to symbolic assembly — the stack
//! machine's memory-segment model and the subroutine call/return
//! protocol, plus the bootstrap sequence.
//!
//! Units are processed in the order given; static namespacing and the
//! label counters make the pass inherently sequential.

use crate::common::{
    asm::{self, AsmInstruction},
    vm::{ArithmeticCommand, ParseCommandError, Segment, VmCommand},
};

pub mod context;
mod parser;

use context::ProgramContext;

/// `temp k` aliases fixed RAM register `5 + k`.
const TEMP_BASE: u16 = 5;

/// The four saved pointers plus the return address — one call frame.
const FRAME_SIZE: u16 = 5;

#[derive(Debug)]
pub enum TranslateError {
    Parse {
        unit: String,
        line: usize,
        error: ParseCommandError,
    },
}

impl std::fmt::Display for TranslateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse { unit, line, error } => {
                write!(f, "{unit}.vm, line {line}: {error}")
            }
        }
    }
}

/// Translate a whole program's worth of VM units into one assembly file,
/// bootstrap first.
pub fn translate<'a>(
    units: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<String, TranslateError> {
    let mut translation_context = ProgramContext::new();
    let mut module = asm::AsmModule::new();

    module.emit_all(bootstrap(&mut translation_context));

    for (name, text) in units {
        let unit = parser::parse_unit(name, text)?;

        for command in &unit.commands {
            module.emit_all(lower_command(command, &unit.name, &mut translation_context));
        }
    }

    // trap execution if control ever falls off the end of the program
    module.emit_all([asm::label("END"), asm::at("END"), asm::jump("0", "JMP")]);

    Ok(module.compile())
}

/// `SP = 256`, then a regular `call Sys.init 0` attributed to a synthetic
/// `Sys.boot` caller.
fn bootstrap(translation_context: &mut ProgramContext) -> Vec<AsmInstruction> {
    translation_context.enter_function("Sys.boot");

    let stack_init = vec![
        asm::at_value(256),
        asm::assign("D", "A"),
        asm::at("SP"),
        asm::assign("M", "D"),
    ];

    [stack_init, lower_call("Sys.init", 0, translation_context)].concat()
}

fn lower_command(
    command: &VmCommand,
    unit: &str,
    translation_context: &mut ProgramContext,
) -> Vec<AsmInstruction> {
    match command {
        VmCommand::Arithmetic(operation) => lower_arithmetic(*operation, translation_context),
        VmCommand::Push(segment, index) => lower_push(*segment, *index, unit),
        VmCommand::Pop(segment, index) => lower_pop(*segment, *index, unit),
        VmCommand::Label(label) => {
            vec![asm::label(qualified(
                translation_context.current_function(),
                label,
            ))]
        }
        VmCommand::Goto(label) => vec![
            asm::at(qualified(translation_context.current_function(), label)),
            asm::jump("0", "JMP"),
        ],
        VmCommand::IfGoto(label) => [
            pop_to_d(),
            vec![
                asm::at(qualified(translation_context.current_function(), label)),
                asm::jump("D", "JNE"),
            ],
        ]
        .concat(),
        VmCommand::Function(name, locals) => lower_function(name, *locals, translation_context),
        VmCommand::Call(name, arguments) => lower_call(name, *arguments, translation_context),
        VmCommand::Return => lower_return(),
    }
}

/// Qualify a branch target with its enclosing function so identically
/// named labels in different functions cannot collide.
fn qualified(function: &str, label: &str) -> String {
    format!("{function}${label}")
}

fn static_symbol(unit: &str, index: u16) -> String {
    format!("{unit}.{index}")
}

const fn pointer_register(index: u16) -> &'static str {
    if index == 0 {
        "THIS"
    } else {
        "THAT"
    }
}

// region: stack primitives

/// Push D onto the stack.
fn push_d() -> Vec<AsmInstruction> {
    vec![
        asm::at("SP"),
        asm::assign("A", "M"),
        asm::assign("M", "D"),
        asm::at("SP"),
        asm::assign("M", "M+1"),
    ]
}

/// Pop the top of the stack into D, leaving A at the new stack top.
fn pop_to_d() -> Vec<AsmInstruction> {
    vec![
        asm::at("SP"),
        asm::assign("AM", "M-1"),
        asm::assign("D", "M"),
    ]
}

/// `D = *(base + index)` for the four pointer-backed segments.
fn indexed_read(base: &str, index: u16) -> Vec<AsmInstruction> {
    vec![
        asm::at_value(index),
        asm::assign("D", "A"),
        asm::at(base),
        asm::assign("A", "M+D"),
        asm::assign("D", "M"),
    ]
}

// endregion

// region: push / pop

fn lower_push(segment: Segment, index: u16, unit: &str) -> Vec<AsmInstruction> {
    let load = match segment {
        // no backing store; the index itself is the value
        Segment::Constant => vec![asm::at_value(index), asm::assign("D", "A")],
        Segment::Argument => indexed_read("ARG", index),
        Segment::Local => indexed_read("LCL", index),
        Segment::This => indexed_read("THIS", index),
        Segment::That => indexed_read("THAT", index),
        Segment::Pointer => vec![
            asm::at(pointer_register(index)),
            asm::assign("D", "M"),
        ],
        Segment::Temp => vec![
            asm::at_value(TEMP_BASE + index),
            asm::assign("D", "M"),
        ],
        Segment::Static => vec![
            asm::at(static_symbol(unit, index)),
            asm::assign("D", "M"),
        ],
    };

    [load, push_d()].concat()
}

fn lower_pop(segment: Segment, index: u16, unit: &str) -> Vec<AsmInstruction> {
    let store = match segment {
        Segment::Argument => return pop_indexed("ARG", index),
        Segment::Local => return pop_indexed("LCL", index),
        Segment::This => return pop_indexed("THIS", index),
        Segment::That => return pop_indexed("THAT", index),
        Segment::Pointer => vec![
            asm::at(pointer_register(index)),
            asm::assign("M", "D"),
        ],
        Segment::Temp => vec![
            asm::at_value(TEMP_BASE + index),
            asm::assign("M", "D"),
        ],
        Segment::Static => vec![
            asm::at(static_symbol(unit, index)),
            asm::assign("M", "D"),
        ],
        // `pop constant` has nowhere to store; the value is dropped
        Segment::Constant => vec![],
    };

    [pop_to_d(), store].concat()
}

/// Popping into a pointer-backed segment computes the target address
/// first (into R13) so the popped value cannot clobber it.
fn pop_indexed(base: &str, index: u16) -> Vec<AsmInstruction> {
    let target_address = vec![
        asm::at_value(index),
        asm::assign("D", "A"),
        asm::at(base),
        asm::assign("D", "M+D"),
        asm::at("R13"),
        asm::assign("M", "D"),
    ];

    let store = vec![asm::at("R13"), asm::assign("A", "M"), asm::assign("M", "D")];

    [target_address, pop_to_d(), store].concat()
}

// endregion

// region: arithmetic

fn lower_arithmetic(
    operation: ArithmeticCommand,
    translation_context: &mut ProgramContext,
) -> Vec<AsmInstruction> {
    match operation {
        // commutative ops use the D-first mnemonic forms the encoding
        // tables define; only subtraction needs the M-first form
        ArithmeticCommand::Add => binary("D+M"),
        ArithmeticCommand::Sub => binary("M-D"),
        ArithmeticCommand::And => binary("D&M"),
        ArithmeticCommand::Or => binary("D|M"),
        ArithmeticCommand::Neg => unary("-M"),
        ArithmeticCommand::Not => unary("!M"),
        ArithmeticCommand::Eq => comparison("JEQ", translation_context),
        ArithmeticCommand::Gt => comparison("JGT", translation_context),
        ArithmeticCommand::Lt => comparison("JLT", translation_context),
    }
}

/// Right operand popped into D, left operand combined in place.
fn binary(combine: &str) -> Vec<AsmInstruction> {
    [
        pop_to_d(),
        vec![asm::assign("A", "A-1"), asm::assign("M", combine)],
    ]
    .concat()
}

fn unary(combine: &str) -> Vec<AsmInstruction> {
    vec![
        asm::at("SP"),
        asm::assign("A", "M-1"),
        asm::assign("M", combine),
    ]
}

/// Comparisons produce VM booleans: `-1` (all ones) for true, `0` for
/// false, branching over two freshly numbered program-wide labels.
fn comparison(jump: &str, translation_context: &mut ProgramContext) -> Vec<AsmInstruction> {
    let n = translation_context.next_compare_index();
    let true_label = format!("CMP_TRUE_{n}");
    let end_label = format!("CMP_END_{n}");

    [
        pop_to_d(),
        vec![
            asm::assign("A", "A-1"),
            asm::assign("D", "M-D"),
            asm::at(true_label.clone()),
            asm::jump("D", jump),
            asm::at("SP"),
            asm::assign("A", "M-1"),
            asm::assign("M", "0"),
            asm::at(end_label.clone()),
            asm::jump("0", "JMP"),
            asm::label(true_label),
            asm::at("SP"),
            asm::assign("A", "M-1"),
            asm::assign("M", "-1"),
            asm::label(end_label),
        ],
    ]
    .concat()
}

// endregion

// region: call convention

/// `function f k`: define the entry label and zero-initialize `k` local
/// slots by repeated push-0.
fn lower_function(
    name: &str,
    locals: u16,
    translation_context: &mut ProgramContext,
) -> Vec<AsmInstruction> {
    translation_context.enter_function(name);

    let mut instructions = vec![asm::label(name)];

    for _ in 0..locals {
        instructions.extend([
            asm::at("SP"),
            asm::assign("A", "M"),
            asm::assign("M", "0"),
            asm::at("SP"),
            asm::assign("M", "M+1"),
        ]);
    }

    instructions
}

/// `call f n`: push the return address and the caller's frame pointers,
/// reposition `ARG`/`LCL`, jump to `f`, then define the return label.
fn lower_call(
    name: &str,
    arguments: u16,
    translation_context: &mut ProgramContext,
) -> Vec<AsmInstruction> {
    let return_index = translation_context.next_return_index();
    let return_label = format!(
        "{}$ret.{return_index}",
        translation_context.current_function()
    );

    let mut instructions = vec![asm::at(return_label.clone()), asm::assign("D", "A")];
    instructions.extend(push_d());

    for saved in ["LCL", "ARG", "THIS", "THAT"] {
        instructions.extend([asm::at(saved), asm::assign("D", "M")]);
        instructions.extend(push_d());
    }

    instructions.extend([
        // ARG = SP - n - 5
        asm::at("SP"),
        asm::assign("D", "M"),
        asm::at_value(arguments + FRAME_SIZE),
        asm::assign("D", "D-A"),
        asm::at("ARG"),
        asm::assign("M", "D"),
        // LCL = SP
        asm::at("SP"),
        asm::assign("D", "M"),
        asm::at("LCL"),
        asm::assign("M", "D"),
        asm::at(name),
        asm::jump("0", "JMP"),
        asm::label(return_label),
    ]);

    instructions
}

/// `return`: reposition the return value and SP for the caller, restore
/// the caller's pointers from the frame, jump to the saved return address.
fn lower_return() -> Vec<AsmInstruction> {
    let mut instructions = vec![
        // R13 = frame (the callee's LCL)
        asm::at("LCL"),
        asm::assign("D", "M"),
        asm::at("R13"),
        asm::assign("M", "D"),
        // R14 = *(frame - 5); saved first — for a zero-argument callee the
        // return value would overwrite the return address below
        asm::at_value(FRAME_SIZE),
        asm::assign("A", "D-A"),
        asm::assign("D", "M"),
        asm::at("R14"),
        asm::assign("M", "D"),
    ];

    // *ARG = pop()
    instructions.extend(pop_to_d());
    instructions.extend([
        asm::at("ARG"),
        asm::assign("A", "M"),
        asm::assign("M", "D"),
        // SP = ARG + 1
        asm::at("ARG"),
        asm::assign("D", "M+1"),
        asm::at("SP"),
        asm::assign("M", "D"),
    ]);

    // restore THAT, THIS, ARG, LCL, walking the frame pointer down
    for restored in ["THAT", "THIS", "ARG", "LCL"] {
        instructions.extend([
            asm::at("R13"),
            asm::assign("AM", "M-1"),
            asm::assign("D", "M"),
            asm::at(restored),
            asm::assign("M", "D"),
        ]);
    }

    instructions.extend([asm::at("R14"), asm::assign("A", "M"), asm::jump("0", "JMP")]);

    instructions
}

// endregion

#[cfg(test)]
mod tests {
    use super::*;

    fn lower_to_text(commands: &[&str], unit: &str) -> String {
        let mut translation_context = ProgramContext::new();

        let mut module = asm::AsmModule::new();
        for command in commands {
            let command = command.parse().expect("test commands should parse");
            module.emit_all(lower_command(&command, unit, &mut translation_context));
        }
        module.compile()
    }

    #[test]
    fn test_stack_arithmetic_lowering() {
        let lowered = lower_to_text(
            &["push constant 7", "push constant 2", "sub", "pop temp 0"],
            "Test",
        );

        let expected = [
            // push constant 7
            "@7", "D=A", "@SP", "A=M", "M=D", "@SP", "M=M+1",
            // push constant 2
            "@2", "D=A", "@SP", "A=M", "M=D", "@SP", "M=M+1",
            // sub: right operand into D, left combined in place
            "@SP", "AM=M-1", "D=M", "A=A-1", "M=M-D",
            // pop temp 0 → RAM[5]
            "@SP", "AM=M-1", "D=M", "@5", "M=D",
        ]
        .join("\n");

        assert_eq!(lowered, expected);
    }

    #[test]
    fn test_binary_operations_use_encodable_computations() {
        let lowered = lower_to_text(
            &[
                "push constant 1",
                "push constant 2",
                "add",
                "push constant 3",
                "and",
                "push constant 4",
                "or",
                "push constant 5",
                "sub",
            ],
            "Test",
        );

        assert!(lowered.contains("M=D+M"));
        assert!(lowered.contains("M=D&M"));
        assert!(lowered.contains("M=D|M"));
        assert!(lowered.contains("M=M-D"));

        // strict assembly must accept every computation emitted here
        assert!(crate::assembler::assemble(&lowered, true).is_ok());
    }

    #[test]
    fn test_comparison_labels_are_unique_program_wide() {
        let lowered = lower_to_text(
            &[
                "function A.f 0",
                "push constant 1",
                "push constant 2",
                "eq",
                "return",
                "function B.g 0",
                "push constant 3",
                "push constant 4",
                "lt",
                "return",
            ],
            "Test",
        );

        // one counter across functions: 0 then 1, never 0 twice
        assert!(lowered.contains("(CMP_TRUE_0)"));
        assert!(lowered.contains("(CMP_END_0)"));
        assert!(lowered.contains("(CMP_TRUE_1)"));
        assert!(lowered.contains("D;JEQ"));
        assert!(lowered.contains("D;JLT"));
        assert!(!lowered.contains("CMP_TRUE_2"));
    }

    #[test]
    fn test_branch_targets_are_function_qualified() {
        let lowered = lower_to_text(
            &[
                "function Main.main 0",
                "label LOOP",
                "push constant 1",
                "if-goto LOOP",
                "goto LOOP",
            ],
            "Main",
        );

        assert!(lowered.contains("(Main.main$LOOP)"));
        assert!(lowered.contains("@Main.main$LOOP\nD;JNE"));
        assert!(lowered.contains("@Main.main$LOOP\n0;JMP"));
    }

    #[test]
    fn test_static_accesses_are_namespaced_per_unit() {
        let foo = lower_to_text(&["push static 3"], "Foo");
        let bar = lower_to_text(&["pop static 3"], "Bar");

        assert!(foo.contains("@Foo.3"));
        assert!(bar.contains("@Bar.3"));
    }

    #[test]
    fn test_pointer_and_segment_addressing() {
        let lowered = lower_to_text(&["push pointer 1", "pop argument 2"], "Test");

        let expected = [
            // push pointer 1 → THAT
            "@THAT", "D=M", "@SP", "A=M", "M=D", "@SP", "M=M+1",
            // pop argument 2: address into R13 first
            "@2", "D=A", "@ARG", "D=M+D", "@R13", "M=D",
            "@SP", "AM=M-1", "D=M", "@R13", "A=M", "M=D",
        ]
        .join("\n");

        assert_eq!(lowered, expected);
    }

    #[test]
    fn test_function_zero_initializes_locals() {
        let lowered = lower_to_text(&["function Main.main 2"], "Main");

        let expected = [
            "(Main.main)",
            "@SP", "A=M", "M=0", "@SP", "M=M+1",
            "@SP", "A=M", "M=0", "@SP", "M=M+1",
        ]
        .join("\n");

        assert_eq!(lowered, expected);
    }

    #[test]
    fn test_call_sites_get_unique_return_labels() {
        let lowered = lower_to_text(
            &[
                "function Main.main 0",
                "call Main.helper 0",
                "call Main.helper 0",
            ],
            "Main",
        );

        assert!(lowered.contains("(Main.main$ret.0)"));
        assert!(lowered.contains("(Main.main$ret.1)"));
        // ARG = SP - n - 5, with n = 0
        assert!(lowered.contains("@5\nD=D-A\n@ARG\nM=D"));
    }

    #[test]
    fn test_return_restores_frame_in_order() {
        let lowered = lower_to_text(&["function Main.main 0", "return"], "Main");

        let restore_order = [
            "@R13", "AM=M-1", "D=M", "@THAT", "M=D",
            "@R13", "AM=M-1", "D=M", "@THIS", "M=D",
            "@R13", "AM=M-1", "D=M", "@ARG", "M=D",
            "@R13", "AM=M-1", "D=M", "@LCL", "M=D",
            "@R14", "A=M", "0;JMP",
        ]
        .join("\n");

        assert!(lowered.ends_with(&restore_order));
    }

    #[test]
    fn test_translation_starts_with_bootstrap() {
        let translated = translate([("Sys", "function Sys.init 0\nlabel HALT\ngoto HALT")])
            .expect("program should translate");

        let bootstrap_head = [
            "@256", "D=A", "@SP", "M=D",
            // call Sys.init 0, attributed to Sys.boot
            "@Sys.boot$ret.0", "D=A",
        ]
        .join("\n");

        assert!(translated.starts_with(&bootstrap_head));
        assert!(translated.contains("(Sys.boot$ret.0)"));
        // terminal trap
        assert!(translated.ends_with("(END)\n@END\n0;JMP"));
    }

    #[test]
    fn test_units_share_one_translation_context() {
        let translated = translate([
            ("A", "function A.f 0\npush constant 1\npush constant 1\neq\nreturn"),
            ("B", "function B.g 0\npush constant 1\npush constant 1\neq\nreturn"),
        ])
        .expect("program should translate");

        assert!(translated.contains("(CMP_TRUE_0)"));
        assert!(translated.contains("(CMP_TRUE_1)"));
        assert!(!translated.contains("(CMP_TRUE_2)"));
    }
}
