//! Recursive-descent parse of the Jack grammar with inline VM emission:
//! symbol resolution and code generation happen while the token cursor
//! advances, one class (compilation unit) at a time. A token mismatch
//! anywhere in the descent aborts the unit with a typed error.

use crate::common::vm::{self, ArithmeticCommand, Segment};

use super::{
    context::ClassContext,
    error::{Expected, SyntaxError, SyntaxErrorKind},
    symbols::{StorageClass, SymbolEntry},
    tokenizer::{Keyword, Span, Spanned, Token},
};

pub struct Engine<'t> {
    tokens: &'t [Spanned<Token>],
    index: usize,
    context: ClassContext,
}

impl<'t> Engine<'t> {
    pub fn new(tokens: &'t [Spanned<Token>]) -> Self {
        Self {
            tokens,
            index: 0,
            context: ClassContext::new(),
        }
    }

    /// `class → 'class' className '{' classVarDec* subroutineDec* '}'`
    pub fn compile_class(mut self) -> Result<ClassContext, SyntaxError> {
        self.expect_keyword(Keyword::Class)?;
        self.context.class_name = self.expect_identifier("class name")?;
        self.expect_symbol('{')?;

        while matches!(
            self.peek(),
            Some(Token::Keyword(Keyword::Static | Keyword::Field))
        ) {
            self.compile_class_var_dec()?;
        }

        while matches!(
            self.peek(),
            Some(Token::Keyword(
                Keyword::Constructor | Keyword::Function | Keyword::Method
            ))
        ) {
            self.compile_subroutine()?;
        }

        self.expect_symbol('}')?;

        if self.peek().is_some() {
            return Err(self.error(Expected::Production("end of class")));
        }

        Ok(self.context)
    }

    // region: declarations

    fn compile_class_var_dec(&mut self) -> Result<(), SyntaxError> {
        let storage = if self.consume_keyword(Keyword::Static) {
            StorageClass::Static
        } else {
            self.expect_keyword(Keyword::Field)?;
            StorageClass::Field
        };

        let declared_type = self.compile_type()?;

        loop {
            let name = self.expect_identifier("variable name")?;
            self.context
                .class_table
                .define(name, declared_type.clone(), storage);

            if !self.consume_symbol(',') {
                break;
            }
        }

        self.expect_symbol(';')
    }

    /// `type → 'int' | 'char' | 'boolean' | className`
    fn compile_type(&mut self) -> Result<String, SyntaxError> {
        match self.peek() {
            Some(Token::Keyword(keyword @ (Keyword::Int | Keyword::Char | Keyword::Boolean))) => {
                let declared_type = keyword.to_string();
                self.bump();
                Ok(declared_type)
            }
            Some(Token::Identifier(name)) => {
                let declared_type = name.clone();
                self.bump();
                Ok(declared_type)
            }
            _ => Err(self.error(Expected::Production("type"))),
        }
    }

    fn compile_subroutine(&mut self) -> Result<(), SyntaxError> {
        let kind = match self.peek() {
            Some(Token::Keyword(
                keyword @ (Keyword::Constructor | Keyword::Function | Keyword::Method),
            )) => {
                let kind = *keyword;
                self.bump();
                kind
            }
            _ => return Err(self.error(Expected::Production("subroutine declaration"))),
        };

        self.context.enter_subroutine();

        if kind == Keyword::Method {
            // the receiver is always argument 0, advancing the argument
            // index scheme before any declared parameter
            self.context.subroutine_table.define(
                "this".to_string(),
                self.context.class_name.clone(),
                StorageClass::Argument,
            );
        }

        // only void-ness of the declared return type affects emission
        let returns_void = self.consume_keyword(Keyword::Void);
        if !returns_void {
            self.compile_type()?;
        }

        let name = self.expect_identifier("subroutine name")?;
        self.expect_symbol('(')?;
        self.compile_parameter_list()?;
        self.expect_symbol(')')?;

        self.compile_subroutine_body(kind, returns_void, &name)
    }

    fn compile_parameter_list(&mut self) -> Result<(), SyntaxError> {
        if self.peek_symbol(')') {
            return Ok(());
        }

        loop {
            let declared_type = self.compile_type()?;
            let name = self.expect_identifier("parameter name")?;
            self.context
                .subroutine_table
                .define(name, declared_type, StorageClass::Argument);

            if !self.consume_symbol(',') {
                return Ok(());
            }
        }
    }

    fn compile_subroutine_body(
        &mut self,
        kind: Keyword,
        returns_void: bool,
        name: &str,
    ) -> Result<(), SyntaxError> {
        self.expect_symbol('{')?;

        while self.peek_keyword(Keyword::Var) {
            self.compile_var_dec()?;
        }

        let locals = self.context.subroutine_table.count(StorageClass::Local);
        self.emit(vm::function(
            format!("{}.{name}", self.context.class_name),
            locals,
        ));

        match kind {
            Keyword::Constructor => {
                // allocate one word per field and anchor `this` to the block
                let fields = self.context.class_table.count(StorageClass::Field);
                self.emit_all([
                    vm::push(Segment::Constant, fields),
                    vm::call("Memory.alloc", 1),
                    vm::pop(Segment::Pointer, 0),
                ]);
            }
            Keyword::Method => {
                // anchor `this` to the receiver
                self.emit_all([
                    vm::push(Segment::Argument, 0),
                    vm::pop(Segment::Pointer, 0),
                ]);
            }
            _ => {}
        }

        self.compile_statements(returns_void)?;
        self.expect_symbol('}')
    }

    fn compile_var_dec(&mut self) -> Result<(), SyntaxError> {
        self.expect_keyword(Keyword::Var)?;
        let declared_type = self.compile_type()?;

        loop {
            let name = self.expect_identifier("variable name")?;
            self.context
                .subroutine_table
                .define(name, declared_type.clone(), StorageClass::Local);

            if !self.consume_symbol(',') {
                break;
            }
        }

        self.expect_symbol(';')
    }

    // endregion

    // region: statements

    fn compile_statements(&mut self, returns_void: bool) -> Result<(), SyntaxError> {
        loop {
            match self.peek() {
                Some(Token::Keyword(Keyword::Let)) => self.compile_let()?,
                Some(Token::Keyword(Keyword::If)) => self.compile_if(returns_void)?,
                Some(Token::Keyword(Keyword::While)) => self.compile_while(returns_void)?,
                Some(Token::Keyword(Keyword::Do)) => self.compile_do()?,
                Some(Token::Keyword(Keyword::Return)) => self.compile_return(returns_void)?,
                _ => return Ok(()),
            }
        }
    }

    fn compile_let(&mut self) -> Result<(), SyntaxError> {
        self.expect_keyword(Keyword::Let)?;

        let span = self.current_span();
        let name = self.expect_identifier("variable name")?;
        let variable = self.resolve_variable(&name, &span)?;

        let target_is_array = self.consume_symbol('[');
        if target_is_array {
            // element address (base, index, add), computed before the RHS
            self.emit(variable.push());
            self.compile_expression()?;
            self.expect_symbol(']')?;
            self.emit(vm::arithmetic(ArithmeticCommand::Add));
        }

        self.expect_symbol('=')?;
        self.compile_expression()?;
        self.expect_symbol(';')?;

        if target_is_array {
            // stash the value so popping the address cannot clobber it
            self.emit_all([
                vm::pop(Segment::Temp, 0),
                vm::pop(Segment::Pointer, 1),
                vm::push(Segment::Temp, 0),
                vm::pop(Segment::That, 0),
            ]);
        } else {
            self.emit(variable.pop());
        }

        Ok(())
    }

    fn compile_if(&mut self, returns_void: bool) -> Result<(), SyntaxError> {
        let n = self.context.flow.next_if();

        self.expect_keyword(Keyword::If)?;
        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')?;
        self.expect_symbol('{')?;

        self.emit_all([
            vm::if_goto(format!("IF_TRUE{n}")),
            vm::goto(format!("IF_FALSE{n}")),
            vm::label(format!("IF_TRUE{n}")),
        ]);

        self.compile_statements(returns_void)?;
        self.expect_symbol('}')?;

        self.emit_all([
            vm::goto(format!("IF_END{n}")),
            vm::label(format!("IF_FALSE{n}")),
        ]);

        if self.consume_keyword(Keyword::Else) {
            self.expect_symbol('{')?;
            self.compile_statements(returns_void)?;
            self.expect_symbol('}')?;
        }

        self.emit(vm::label(format!("IF_END{n}")));
        Ok(())
    }

    fn compile_while(&mut self, returns_void: bool) -> Result<(), SyntaxError> {
        let n = self.context.flow.next_while();

        self.emit(vm::label(format!("WHILE_EXP{n}")));

        self.expect_keyword(Keyword::While)?;
        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')?;
        self.expect_symbol('{')?;

        // branch out on the negated loop test
        self.emit_all([
            vm::arithmetic(ArithmeticCommand::Not),
            vm::if_goto(format!("WHILE_END{n}")),
        ]);

        self.compile_statements(returns_void)?;
        self.expect_symbol('}')?;

        self.emit_all([
            vm::goto(format!("WHILE_EXP{n}")),
            vm::label(format!("WHILE_END{n}")),
        ]);
        Ok(())
    }

    fn compile_do(&mut self) -> Result<(), SyntaxError> {
        self.expect_keyword(Keyword::Do)?;

        let name = self.expect_identifier("subroutine call")?;
        self.compile_subroutine_call(name)?;
        self.expect_symbol(';')?;

        // a do statement discards the call's result
        self.emit(vm::pop(Segment::Temp, 0));
        Ok(())
    }

    fn compile_return(&mut self, returns_void: bool) -> Result<(), SyntaxError> {
        self.expect_keyword(Keyword::Return)?;

        if !self.peek_symbol(';') {
            self.compile_expression()?;
        }
        self.expect_symbol(';')?;

        if returns_void {
            self.emit(vm::push(Segment::Constant, 0));
        }
        self.emit(vm::vm_return());
        Ok(())
    }

    // endregion

    // region: expressions

    /// `expression → term (op term)*`, lowered left to right with no
    /// precedence (per the Jack language definition).
    fn compile_expression(&mut self) -> Result<(), SyntaxError> {
        self.compile_term()?;

        while let Some(operator) = self.binary_operator() {
            self.bump();
            self.compile_term()?;
            self.emit(operator);
        }

        Ok(())
    }

    /// The VM lowering of the binary operator under the cursor, if any.
    fn binary_operator(&self) -> Option<vm::VmCommand> {
        let command = match self.peek()? {
            Token::Symbol('+') => vm::arithmetic(ArithmeticCommand::Add),
            Token::Symbol('-') => vm::arithmetic(ArithmeticCommand::Sub),
            Token::Symbol('*') => vm::call("Math.multiply", 2),
            Token::Symbol('/') => vm::call("Math.divide", 2),
            Token::Symbol('&') => vm::arithmetic(ArithmeticCommand::And),
            Token::Symbol('|') => vm::arithmetic(ArithmeticCommand::Or),
            Token::Symbol('<') => vm::arithmetic(ArithmeticCommand::Lt),
            Token::Symbol('>') => vm::arithmetic(ArithmeticCommand::Gt),
            Token::Symbol('=') => vm::arithmetic(ArithmeticCommand::Eq),
            _ => return None,
        };

        Some(command)
    }

    fn compile_term(&mut self) -> Result<(), SyntaxError> {
        match self.peek() {
            Some(Token::IntConst(value)) => {
                let value = *value;
                self.bump();
                self.emit(vm::push(Segment::Constant, value));
            }
            Some(Token::StrConst(text)) => {
                let text = text.clone();
                self.bump();
                self.compile_string_constant(&text);
            }
            Some(Token::Keyword(Keyword::True)) => {
                self.bump();
                self.emit_all([
                    vm::push(Segment::Constant, 0),
                    vm::arithmetic(ArithmeticCommand::Not),
                ]);
            }
            Some(Token::Keyword(Keyword::False | Keyword::Null)) => {
                self.bump();
                self.emit(vm::push(Segment::Constant, 0));
            }
            Some(Token::Keyword(Keyword::This)) => {
                self.bump();
                self.emit(vm::push(Segment::Pointer, 0));
            }
            Some(Token::Identifier(_)) => self.compile_identifier_term()?,
            Some(Token::Symbol('-')) => {
                self.bump();
                self.compile_term()?;
                self.emit(vm::arithmetic(ArithmeticCommand::Neg));
            }
            Some(Token::Symbol('~')) => {
                self.bump();
                self.compile_term()?;
                self.emit(vm::arithmetic(ArithmeticCommand::Not));
            }
            Some(Token::Symbol('(')) => {
                self.bump();
                self.compile_expression()?;
                self.expect_symbol(')')?;
            }
            _ => return Err(self.error(Expected::Production("term"))),
        }

        Ok(())
    }

    /// A term starting with an identifier: array access, one of the three
    /// subroutine-call forms, or a plain variable reference.
    fn compile_identifier_term(&mut self) -> Result<(), SyntaxError> {
        let span = self.current_span();
        let name = self.expect_identifier("term")?;

        match self.peek() {
            Some(Token::Symbol('[')) => {
                let variable = self.resolve_variable(&name, &span)?;
                self.bump();

                // element address (base, index, add), then read through `that`
                self.emit(variable.push());
                self.compile_expression()?;
                self.expect_symbol(']')?;
                self.emit_all([
                    vm::arithmetic(ArithmeticCommand::Add),
                    vm::pop(Segment::Pointer, 1),
                    vm::push(Segment::That, 0),
                ]);
            }
            Some(Token::Symbol('(' | '.')) => self.compile_subroutine_call(name)?,
            _ => {
                let variable = self.resolve_variable(&name, &span)?;
                self.emit(variable.push());
            }
        }

        Ok(())
    }

    /// The three call forms, with the identifier before `(`/`.` already
    /// consumed:
    /// - `name(...)` — method on the current object (`pointer 0` receiver);
    /// - `var.method(...)` — method through a declared variable, which is
    ///   pushed as the implicit first argument;
    /// - `Class.function(...)` — no receiver.
    fn compile_subroutine_call(&mut self, name: String) -> Result<(), SyntaxError> {
        if self.consume_symbol('(') {
            self.emit(vm::push(Segment::Pointer, 0));
            let arguments = self.compile_expression_list()?;
            self.expect_symbol(')')?;

            self.emit(vm::call(
                format!("{}.{name}", self.context.class_name),
                arguments + 1,
            ));
            return Ok(());
        }

        self.expect_symbol('.')?;
        let method = self.expect_identifier("subroutine name")?;
        self.expect_symbol('(')?;

        match self.lookup_variable(&name) {
            Some(variable) => {
                self.emit(variable.push());
                let arguments = self.compile_expression_list()?;
                self.expect_symbol(')')?;

                self.emit(vm::call(
                    format!("{}.{method}", variable.declared_type),
                    arguments + 1,
                ));
            }
            None => {
                let arguments = self.compile_expression_list()?;
                self.expect_symbol(')')?;

                self.emit(vm::call(format!("{name}.{method}"), arguments));
            }
        }

        Ok(())
    }

    fn compile_expression_list(&mut self) -> Result<u16, SyntaxError> {
        let mut count = 0;

        if !self.peek_symbol(')') {
            loop {
                self.compile_expression()?;
                count += 1;

                if !self.consume_symbol(',') {
                    break;
                }
            }
        }

        Ok(count)
    }

    fn compile_string_constant(&mut self, text: &str) {
        let length = u16::try_from(text.len()).unwrap_or(u16::MAX);
        self.emit_all([
            vm::push(Segment::Constant, length),
            vm::call("String.new", 1),
        ]);

        for c in text.chars() {
            self.emit_all([
                vm::push(Segment::Constant, char_code(c)),
                vm::call("String.appendChar", 2),
            ]);
        }
    }

    // endregion

    // region: symbol resolution

    /// Most-specific lookup: subroutine scope shadows class scope.
    fn lookup_variable(&self, name: &str) -> Option<SymbolEntry> {
        self.context
            .subroutine_table
            .lookup(name)
            .or_else(|| self.context.class_table.lookup(name))
            .cloned()
    }

    /// An identifier in term/assignment position that matches neither
    /// scope is a hard compile error.
    fn resolve_variable(&self, name: &str, span: &Span) -> Result<SymbolEntry, SyntaxError> {
        self.lookup_variable(name).ok_or_else(|| SyntaxError {
            span: span.clone(),
            kind: SyntaxErrorKind::UndeclaredVariable(name.to_string()),
        })
    }

    // endregion

    // region: cursor & emission

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index).map(|(token, _span)| token)
    }

    fn bump(&mut self) {
        self.index += 1;
    }

    fn current_span(&self) -> Span {
        self.tokens.get(self.index).map_or_else(
            || {
                let end = self.tokens.last().map_or(0, |(_token, span)| span.end);
                end..end
            },
            |(_token, span)| span.clone(),
        )
    }

    fn error(&self, expected: Expected) -> SyntaxError {
        let kind = match self.peek() {
            Some(found) => SyntaxErrorKind::UnexpectedToken {
                expected,
                found: found.clone(),
            },
            None => SyntaxErrorKind::UnexpectedEndOfInput { expected },
        };

        SyntaxError {
            span: self.current_span(),
            kind,
        }
    }

    fn peek_symbol(&self, symbol: char) -> bool {
        matches!(self.peek(), Some(Token::Symbol(c)) if *c == symbol)
    }

    fn peek_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.peek(), Some(Token::Keyword(k)) if *k == keyword)
    }

    fn expect_symbol(&mut self, symbol: char) -> Result<(), SyntaxError> {
        if self.consume_symbol(symbol) {
            Ok(())
        } else {
            Err(self.error(Expected::Symbol(symbol)))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), SyntaxError> {
        if self.consume_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(Expected::Keyword(keyword)))
        }
    }

    fn expect_identifier(&mut self, production: &'static str) -> Result<String, SyntaxError> {
        match self.peek() {
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.bump();
                Ok(name)
            }
            _ => Err(self.error(Expected::Production(production))),
        }
    }

    fn consume_symbol(&mut self, symbol: char) -> bool {
        let matched = self.peek_symbol(symbol);
        if matched {
            self.bump();
        }
        matched
    }

    fn consume_keyword(&mut self, keyword: Keyword) -> bool {
        let matched = self.peek_keyword(keyword);
        if matched {
            self.bump();
        }
        matched
    }

    fn emit(&mut self, command: vm::VmCommand) {
        self.context.output.emit(command);
    }

    fn emit_all(&mut self, commands: impl IntoIterator<Item = vm::VmCommand>) {
        self.context.output.emit_all(commands);
    }

    // endregion
}

// string-constant tokens are ASCII by construction (enforced by the lexer),
// so byte length equals character count and this cast is lossless
fn char_code(c: char) -> u16 {
    (c as u8).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::tokenizer;

    fn compile_source(source: &str) -> Result<String, SyntaxError> {
        let tokens = tokenizer::tokenize(source).expect("test source should tokenize");
        Engine::new(&tokens)
            .compile_class()
            .map(|context| context.output.compile())
    }

    #[test]
    fn test_void_function_with_bare_return() {
        let source = "class Main { function void main() { return; } }";

        let expected = ["function Main.main 0", "push constant 0", "return"].join("\n");

        assert_eq!(compile_source(source).as_deref(), Ok(expected.as_str()));
    }

    #[test]
    fn test_binary_expression_operand_order() {
        let source = "
            class Test {
                function int f() {
                    var int a, b, x;
                    let x = x + 1;
                    return x;
                }
            }
        ";

        // `x` is local index 2; operands in source order, operator last
        let expected = [
            "function Test.f 3",
            "push local 2",
            "push constant 1",
            "add",
            "pop local 2",
            "push local 2",
            "return",
        ]
        .join("\n");

        assert_eq!(compile_source(source).as_deref(), Ok(expected.as_str()));
    }

    #[test]
    fn test_operator_lowering() {
        let source = "
            class Test {
                function int f(int a, int b) {
                    return ((a * b) / (a - b)) + -(a < b) | ~(a = b) & (b > a);
                }
            }
        ";

        let expected = [
            "function Test.f 0",
            "push argument 0",
            "push argument 1",
            "call Math.multiply 2",
            "push argument 0",
            "push argument 1",
            "sub",
            "call Math.divide 2",
            "push argument 0",
            "push argument 1",
            "lt",
            "neg",
            "add",
            "push argument 0",
            "push argument 1",
            "eq",
            "not",
            "or",
            "push argument 1",
            "push argument 0",
            "gt",
            "and",
            "return",
        ]
        .join("\n");

        assert_eq!(compile_source(source).as_deref(), Ok(expected.as_str()));
    }

    #[test]
    fn test_field_shadowing_and_index_stability() {
        let source = "
            class Point {
                field int x;
                field int y;
                method int getY() {
                    return y;
                }
                method int shadowed() {
                    var int y;
                    let y = 5;
                    return y;
                }
            }
        ";

        let expected = [
            // field `y` keeps class-scope index 1
            "function Point.getY 0",
            "push argument 0",
            "pop pointer 0",
            "push this 1",
            "return",
            // local `y` shadows the field within this subroutine
            "function Point.shadowed 1",
            "push argument 0",
            "pop pointer 0",
            "push constant 5",
            "pop local 0",
            "push local 0",
            "return",
        ]
        .join("\n");

        assert_eq!(compile_source(source).as_deref(), Ok(expected.as_str()));
    }

    #[test]
    fn test_constructor_prologue_allocates_fields() {
        let source = "
            class Point {
                field int x;
                field int y;
                constructor Point new(int ax, int ay) {
                    let x = ax;
                    let y = ay;
                    return this;
                }
            }
        ";

        let expected = [
            "function Point.new 0",
            "push constant 2",
            "call Memory.alloc 1",
            "pop pointer 0",
            "push argument 0",
            "pop this 0",
            "push argument 1",
            "pop this 1",
            "push pointer 0",
            "return",
        ]
        .join("\n");

        assert_eq!(compile_source(source).as_deref(), Ok(expected.as_str()));
    }

    #[test]
    fn test_array_read_and_write() {
        let source = "
            class Arr {
                function void shift(Array a, int i) {
                    let a[i] = a[i + 1];
                    return;
                }
            }
        ";

        let expected = [
            "function Arr.shift 0",
            // target address: base, index, add
            "push argument 0",
            "push argument 1",
            "add",
            // RHS element read
            "push argument 0",
            "push argument 1",
            "push constant 1",
            "add",
            "add",
            "pop pointer 1",
            "push that 0",
            // store through temp 0 / pointer 1
            "pop temp 0",
            "pop pointer 1",
            "push temp 0",
            "pop that 0",
            "push constant 0",
            "return",
        ]
        .join("\n");

        assert_eq!(compile_source(source).as_deref(), Ok(expected.as_str()));
    }

    #[test]
    fn test_string_constant_construction() {
        let source = "
            class Greet {
                function void hello() {
                    do Output.printString(\"Hi\");
                    return;
                }
            }
        ";

        let expected = [
            "function Greet.hello 0",
            "push constant 2",
            "call String.new 1",
            "push constant 72",
            "call String.appendChar 2",
            "push constant 105",
            "call String.appendChar 2",
            "call Output.printString 1",
            "pop temp 0",
            "push constant 0",
            "return",
        ]
        .join("\n");

        assert_eq!(compile_source(source).as_deref(), Ok(expected.as_str()));
    }

    #[test]
    fn test_control_flow_labels() {
        let source = "
            class Flow {
                function int test(int n) {
                    var int r;
                    let r = 0;
                    while (n > 0) {
                        if (n = 1) {
                            let r = 1;
                        } else {
                            let r = 2;
                        }
                        let n = n - 1;
                    }
                    return r;
                }
            }
        ";

        let expected = [
            "function Flow.test 1",
            "push constant 0",
            "pop local 0",
            "label WHILE_EXP0",
            "push argument 0",
            "push constant 0",
            "gt",
            "not",
            "if-goto WHILE_END0",
            "push argument 0",
            "push constant 1",
            "eq",
            "if-goto IF_TRUE0",
            "goto IF_FALSE0",
            "label IF_TRUE0",
            "push constant 1",
            "pop local 0",
            "goto IF_END0",
            "label IF_FALSE0",
            "push constant 2",
            "pop local 0",
            "label IF_END0",
            "push argument 0",
            "push constant 1",
            "sub",
            "pop argument 0",
            "goto WHILE_EXP0",
            "label WHILE_END0",
            "push local 0",
            "return",
        ]
        .join("\n");

        assert_eq!(compile_source(source).as_deref(), Ok(expected.as_str()));
    }

    #[test]
    fn test_keyword_constants() {
        let source = "
            class Consts {
                function boolean f() {
                    var boolean b;
                    let b = true;
                    let b = false;
                    let b = null;
                    return b;
                }
            }
        ";

        let expected = [
            "function Consts.f 1",
            "push constant 0",
            "not",
            "pop local 0",
            "push constant 0",
            "pop local 0",
            "push constant 0",
            "pop local 0",
            "push local 0",
            "return",
        ]
        .join("\n");

        assert_eq!(compile_source(source).as_deref(), Ok(expected.as_str()));
    }

    #[test]
    fn test_call_forms() {
        let source = "
            class Calls {
                field Point p;
                method void run() {
                    do p.move(1, 2);
                    do render();
                    do Screen.clearScreen();
                    return;
                }
                method void render() {
                    return;
                }
            }
        ";

        let expected = [
            "function Calls.run 0",
            "push argument 0",
            "pop pointer 0",
            // declared variable: receiver pushed, declared type qualifies
            "push this 0",
            "push constant 1",
            "push constant 2",
            "call Point.move 3",
            "pop temp 0",
            // bare call: method on the current object
            "push pointer 0",
            "call Calls.render 1",
            "pop temp 0",
            // unresolved name: class-qualified, no receiver
            "call Screen.clearScreen 0",
            "pop temp 0",
            "push constant 0",
            "return",
            "function Calls.render 0",
            "push argument 0",
            "pop pointer 0",
            "push constant 0",
            "return",
        ]
        .join("\n");

        assert_eq!(compile_source(source).as_deref(), Ok(expected.as_str()));
    }

    #[test]
    fn test_static_variables_use_static_segment() {
        let source = "
            class Counter {
                static int count;
                function void bump() {
                    let count = count + 1;
                    return;
                }
            }
        ";

        let expected = [
            "function Counter.bump 0",
            "push static 0",
            "push constant 1",
            "add",
            "pop static 0",
            "push constant 0",
            "return",
        ]
        .join("\n");

        assert_eq!(compile_source(source).as_deref(), Ok(expected.as_str()));
    }

    #[test]
    fn test_token_mismatch_reports_expected_and_actual() {
        let source = "class Main { function void main() { var int x; let x = 1 return; } }";

        let error = compile_source(source).expect_err("missing `;` should fail");

        assert_eq!(
            error.kind,
            SyntaxErrorKind::UnexpectedToken {
                expected: Expected::Symbol(';'),
                found: Token::Keyword(Keyword::Return),
            }
        );
    }

    #[test]
    fn test_undeclared_variable_is_a_hard_error() {
        let source = "class Main { function void main() { let x = 1; return; } }";

        let error = compile_source(source).expect_err("undeclared `x` should fail");

        assert_eq!(
            error.kind,
            SyntaxErrorKind::UndeclaredVariable("x".to_string())
        );
    }
}
