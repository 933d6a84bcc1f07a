//! Single-pass Pratt compiler: parses and emits bytecode in the same walk,
//! with no intermediate AST.

use std::collections::HashSet;

use tracing::debug;
use wisp_core::{Chunk, Interner, OpCode, Value};

use crate::error::CompileError;
use crate::scanner::Scanner;
use crate::token::{Token, TokenKind};

const LOCALS_MAX: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
enum Precedence {
    None,
    Assignment,
    Or,
    And,
    Equality,
    Comparison,
    Term,
    Factor,
    Unary,
    Call,
    Primary,
}

impl Precedence {
    /// The next-higher precedence, used to make `+`/`-`/etc. left-associative
    /// (the right operand is parsed at one level above its own precedence).
    fn next(self) -> Precedence {
        match self {
            Precedence::None => Precedence::Assignment,
            Precedence::Assignment => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call => Precedence::Primary,
            Precedence::Primary => Precedence::Primary,
        }
    }
}

type PrefixFn<'src, 'i> = fn(&mut Compiler<'src, 'i>, bool);
type InfixFn<'src, 'i> = fn(&mut Compiler<'src, 'i>, bool);

struct ParseRule<'src, 'i> {
    prefix: Option<PrefixFn<'src, 'i>>,
    infix: Option<InfixFn<'src, 'i>>,
    precedence: Precedence,
}

fn get_rule<'src, 'i>(kind: TokenKind) -> ParseRule<'src, 'i> {
    use TokenKind as K;
    match kind {
        K::LeftParen => ParseRule {
            prefix: Some(Compiler::grouping),
            infix: None,
            precedence: Precedence::None,
        },
        K::Minus => ParseRule {
            prefix: Some(Compiler::unary),
            infix: Some(Compiler::binary),
            precedence: Precedence::Term,
        },
        K::Plus => ParseRule {
            prefix: None,
            infix: Some(Compiler::binary),
            precedence: Precedence::Term,
        },
        K::Slash | K::Star => ParseRule {
            prefix: None,
            infix: Some(Compiler::binary),
            precedence: Precedence::Factor,
        },
        K::Bang => ParseRule {
            prefix: Some(Compiler::unary),
            infix: None,
            precedence: Precedence::None,
        },
        K::BangEqual | K::EqualEqual => ParseRule {
            prefix: None,
            infix: Some(Compiler::binary),
            precedence: Precedence::Equality,
        },
        K::Greater | K::GreaterEqual | K::Less | K::LessEqual => ParseRule {
            prefix: None,
            infix: Some(Compiler::binary),
            precedence: Precedence::Comparison,
        },
        K::Identifier => ParseRule {
            prefix: Some(Compiler::variable),
            infix: None,
            precedence: Precedence::None,
        },
        K::String => ParseRule {
            prefix: Some(Compiler::string),
            infix: None,
            precedence: Precedence::None,
        },
        K::Number => ParseRule {
            prefix: Some(Compiler::number),
            infix: None,
            precedence: Precedence::None,
        },
        K::And => ParseRule {
            prefix: None,
            infix: Some(Compiler::and_),
            precedence: Precedence::And,
        },
        K::Or => ParseRule {
            prefix: None,
            infix: Some(Compiler::or_),
            precedence: Precedence::Or,
        },
        K::False | K::Nil | K::True => ParseRule {
            prefix: Some(Compiler::literal),
            infix: None,
            precedence: Precedence::None,
        },
        _ => ParseRule {
            prefix: None,
            infix: None,
            precedence: Precedence::None,
        },
    }
}

struct Local<'src> {
    name: Token<'src>,
    /// `-1` while the initializer is still being compiled.
    depth: i32,
    is_const: bool,
}

pub struct Compiler<'src, 'i> {
    scanner: Scanner<'src>,
    chunk: Chunk,
    interner: &'i mut Interner,
    current: Token<'src>,
    previous: Token<'src>,
    had_error: bool,
    panic_mode: bool,
    errors: Vec<CompileError>,
    locals: Vec<Local<'src>>,
    scope_depth: i32,
    const_globals: HashSet<&'src str>,
}

/// Compile `source` into a fresh `Chunk`, interning string and identifier
/// literals through `interner`. On any compile error, returns every
/// diagnostic collected before `synchronize` gave up, in source order.
pub fn compile(source: &str, interner: &mut Interner) -> Result<Chunk, Vec<CompileError>> {
    let mut compiler = Compiler::new(source, interner);
    compiler.advance();
    while !compiler.matches(TokenKind::Eof) {
        compiler.declaration();
    }
    compiler.end();

    if compiler.had_error {
        Err(compiler.errors)
    } else {
        Ok(compiler.chunk)
    }
}

impl<'src, 'i> Compiler<'src, 'i> {
    fn new(source: &'src str, interner: &'i mut Interner) -> Self {
        let placeholder = Token {
            kind: TokenKind::Eof,
            lexeme: "",
            line: 1,
        };
        Compiler {
            scanner: Scanner::new(source),
            chunk: Chunk::new(),
            interner,
            current: placeholder,
            previous: placeholder,
            had_error: false,
            panic_mode: false,
            errors: Vec::new(),
            locals: Vec::new(),
            scope_depth: 0,
            const_globals: HashSet::new(),
        }
    }

    // --- token stream plumbing -------------------------------------------

    fn advance(&mut self) {
        self.previous = self.current;
        loop {
            self.current = self.scanner.scan_token();
            if self.current.kind != TokenKind::Error {
                break;
            }
            let message = self.current.lexeme.to_string();
            self.error_at_current(&message);
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) {
        if self.current.kind == kind {
            self.advance();
            return;
        }
        self.error_at_current(message);
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if !self.check(kind) {
            return false;
        }
        self.advance();
        true
    }

    // --- error reporting ---------------------------------------------------

    fn error_at(&mut self, token: Token<'src>, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.had_error = true;
        let at = match token.kind {
            TokenKind::Eof => "at end".to_string(),
            TokenKind::Error => String::new(),
            _ => format!("at '{}'", token.lexeme),
        };
        self.errors.push(CompileError {
            line: token.line,
            at,
            message: message.to_string(),
        });
    }

    fn error(&mut self, message: &str) {
        let token = self.previous;
        self.error_at(token, message);
    }

    fn error_at_current(&mut self, message: &str) {
        let token = self.current;
        self.error_at(token, message);
    }

    fn synchronize(&mut self) {
        self.panic_mode = false;
        while self.current.kind != TokenKind::Eof {
            if self.previous.kind == TokenKind::Semicolon {
                return;
            }
            match self.current.kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::Const
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return
                | TokenKind::Switch => return,
                _ => {}
            }
            self.advance();
        }
    }

    // --- bytecode emission ---------------------------------------------------

    fn emit_byte(&mut self, byte: u8) {
        let line = self.previous.line;
        self.chunk.write(byte, line);
    }

    fn emit_op(&mut self, op: OpCode) {
        self.emit_byte(op.into());
    }

    fn emit_op_byte(&mut self, op: OpCode, byte: u8) {
        self.emit_byte(op.into());
        self.emit_byte(byte);
    }

    fn emit_return(&mut self) {
        self.emit_op(OpCode::Return);
    }

    fn make_constant(&mut self, value: Value) -> u8 {
        let index = self.chunk.add_constant(value);
        if index > u8::MAX as usize {
            self.error("Too many constants in one chunk.");
            return 0;
        }
        index as u8
    }

    fn emit_constant(&mut self, value: Value) {
        let constant = self.make_constant(value);
        self.emit_op_byte(OpCode::Constant, constant);
    }

    /// Emits `op` followed by a two-byte placeholder, returning its offset.
    fn emit_jump(&mut self, op: OpCode) -> usize {
        self.emit_op(op);
        self.emit_byte(0xff);
        self.emit_byte(0xff);
        self.chunk.len() - 2
    }

    fn patch_jump(&mut self, offset: usize) {
        let jump = self.chunk.len() - offset - 2;
        if jump > u16::MAX as usize {
            self.error("Too much code to jump over.");
        }
        self.chunk.patch_u16(offset, jump as u16);
    }

    fn emit_loop(&mut self, loop_start: usize) {
        self.emit_op(OpCode::Loop);
        let offset = self.chunk.len() - loop_start + 2;
        if offset > u16::MAX as usize {
            self.error("Loop body too large.");
        }
        let bytes = (offset as u16).to_be_bytes();
        self.emit_byte(bytes[0]);
        self.emit_byte(bytes[1]);
    }

    fn end(&mut self) {
        self.emit_return();
        debug!(had_error = self.had_error, bytes = self.chunk.len(), "compiled chunk");
    }

    // --- scopes and locals ---------------------------------------------------

    fn begin_scope(&mut self) {
        self.scope_depth += 1;
    }

    fn end_scope(&mut self) {
        self.scope_depth -= 1;
        while let Some(local) = self.locals.last() {
            if local.depth > self.scope_depth {
                self.emit_op(OpCode::Pop);
                self.locals.pop();
            } else {
                break;
            }
        }
    }

    fn add_local(&mut self, name: Token<'src>, is_const: bool) {
        if self.locals.len() >= LOCALS_MAX {
            self.error("Too many local variables in function");
            return;
        }
        self.locals.push(Local {
            name,
            depth: -1,
            is_const,
        });
    }

    fn declare_variable(&mut self, is_const: bool) {
        if self.scope_depth == 0 {
            return;
        }
        let name = self.previous;
        for local in self.locals.iter().rev() {
            if local.depth != -1 && local.depth < self.scope_depth {
                break;
            }
            if local.name.lexeme == name.lexeme {
                self.error("Already a variable with this name in this scope");
            }
        }
        self.add_local(name, is_const);
    }

    fn mark_initialized(&mut self) {
        if self.scope_depth == 0 {
            return;
        }
        let depth = self.scope_depth;
        if let Some(local) = self.locals.last_mut() {
            local.depth = depth;
        }
    }

    fn resolve_local(&mut self, name: Token<'src>) -> Option<usize> {
        for i in (0..self.locals.len()).rev() {
            if self.locals[i].name.lexeme == name.lexeme {
                if self.locals[i].depth == -1 {
                    self.error("Can't read local variable in its own initializer.");
                }
                return Some(i);
            }
        }
        None
    }

    fn identifier_constant(&mut self, name: Token<'src>) -> u8 {
        let interned = self.interner.intern(name.lexeme);
        self.make_constant(Value::string(interned))
    }

    fn parse_variable(&mut self, message: &str, is_const: bool) -> (u8, Token<'src>) {
        self.consume(TokenKind::Identifier, message);
        let name = self.previous;
        self.declare_variable(is_const);
        if self.scope_depth > 0 {
            return (0, name);
        }
        (self.identifier_constant(name), name)
    }

    fn define_variable(&mut self, global: u8, is_const: bool, name: Token<'src>) {
        if self.scope_depth > 0 {
            self.mark_initialized();
            return;
        }
        if is_const {
            self.const_globals.insert(name.lexeme);
        }
        self.emit_op_byte(OpCode::DefineGlobal, global);
    }

    // --- Pratt parsing ---------------------------------------------------

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();
        let Some(prefix_rule) = get_rule(self.previous.kind).prefix else {
            self.error("Expect expression.");
            return;
        };

        let can_assign = precedence <= Precedence::Assignment;
        prefix_rule(self, can_assign);

        while precedence <= get_rule(self.current.kind).precedence {
            self.advance();
            let infix_rule = get_rule(self.previous.kind)
                .infix
                .expect("a token with precedence above NONE always has an infix rule");
            infix_rule(self, can_assign);
        }

        if can_assign && self.matches(TokenKind::Equal) {
            self.error("Invalid assignment target.");
        }
    }

    fn number(&mut self, _can_assign: bool) {
        let value: f64 = self
            .previous
            .lexeme
            .parse()
            .expect("scanner only produces well-formed numeric lexemes");
        self.emit_constant(Value::Number(value));
    }

    fn string(&mut self, _can_assign: bool) {
        let lexeme = self.previous.lexeme;
        let contents = &lexeme[1..lexeme.len() - 1];
        let interned = self.interner.intern(contents);
        self.emit_constant(Value::string(interned));
    }

    fn grouping(&mut self, _can_assign: bool) {
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after expression.");
    }

    fn unary(&mut self, _can_assign: bool) {
        let operator = self.previous.kind;
        self.parse_precedence(Precedence::Unary);
        match operator {
            TokenKind::Bang => self.emit_op(OpCode::Not),
            TokenKind::Minus => self.emit_op(OpCode::Negate),
            _ => unreachable!("unary rule only registered for ! and -"),
        }
    }

    fn binary(&mut self, _can_assign: bool) {
        let operator = self.previous.kind;
        let rule = get_rule(operator);
        self.parse_precedence(rule.precedence.next());
        match operator {
            TokenKind::BangEqual => {
                self.emit_op(OpCode::Equal);
                self.emit_op(OpCode::Not);
            }
            TokenKind::EqualEqual => self.emit_op(OpCode::Equal),
            TokenKind::Greater => self.emit_op(OpCode::Greater),
            TokenKind::GreaterEqual => {
                self.emit_op(OpCode::Less);
                self.emit_op(OpCode::Not);
            }
            TokenKind::Less => self.emit_op(OpCode::Less),
            TokenKind::LessEqual => {
                self.emit_op(OpCode::Greater);
                self.emit_op(OpCode::Not);
            }
            TokenKind::Plus => self.emit_op(OpCode::Add),
            TokenKind::Minus => self.emit_op(OpCode::Subtract),
            TokenKind::Star => self.emit_op(OpCode::Multiply),
            TokenKind::Slash => self.emit_op(OpCode::Divide),
            _ => unreachable!("binary rule only registered for arithmetic/comparison operators"),
        }
    }

    fn literal(&mut self, _can_assign: bool) {
        match self.previous.kind {
            TokenKind::False => self.emit_op(OpCode::False),
            TokenKind::Nil => self.emit_op(OpCode::Nil),
            TokenKind::True => self.emit_op(OpCode::True),
            _ => unreachable!("literal rule only registered for false/nil/true"),
        }
    }

    fn and_(&mut self, _can_assign: bool) {
        let end_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::And);
        self.patch_jump(end_jump);
    }

    fn or_(&mut self, _can_assign: bool) {
        let else_jump = self.emit_jump(OpCode::JumpIfFalse);
        let end_jump = self.emit_jump(OpCode::Jump);
        self.patch_jump(else_jump);
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::Or);
        self.patch_jump(end_jump);
    }

    fn variable(&mut self, can_assign: bool) {
        let name = self.previous;
        self.named_variable(name, can_assign);
    }

    fn named_variable(&mut self, name: Token<'src>, can_assign: bool) {
        let local_slot = self.resolve_local(name);
        let (get_op, set_op, arg) = if let Some(slot) = local_slot {
            (OpCode::GetLocal, OpCode::SetLocal, slot as u8)
        } else {
            let arg = self.identifier_constant(name);
            (OpCode::GetGlobal, OpCode::SetGlobal, arg)
        };

        if can_assign && self.matches(TokenKind::Equal) {
            let is_const = match local_slot {
                Some(slot) => self.locals[slot].is_const,
                None => self.const_globals.contains(name.lexeme),
            };
            if is_const {
                self.error("Can't reassign to const variable");
            }
            self.expression();
            self.emit_op_byte(set_op, arg);
        } else {
            self.emit_op_byte(get_op, arg);
        }
    }

    // --- statements ---------------------------------------------------

    fn declaration(&mut self) {
        if self.matches(TokenKind::Var) {
            self.var_declaration(false);
        } else if self.matches(TokenKind::Const) {
            self.var_declaration(true);
        } else {
            self.statement();
        }

        if self.panic_mode {
            self.synchronize();
        }
    }

    fn var_declaration(&mut self, is_const: bool) {
        let message = if is_const {
            "Expect constant name."
        } else {
            "Expect variable name."
        };
        let (global, name) = self.parse_variable(message, is_const);

        if self.matches(TokenKind::Equal) {
            self.expression();
        } else {
            self.emit_op(OpCode::Nil);
        }
        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.");

        self.define_variable(global, is_const, name);
    }

    fn statement(&mut self) {
        if self.matches(TokenKind::Print) {
            self.print_statement();
        } else if self.matches(TokenKind::If) {
            self.if_statement();
        } else if self.matches(TokenKind::While) {
            self.while_statement();
        } else if self.matches(TokenKind::For) {
            self.for_statement();
        } else if self.matches(TokenKind::Switch) {
            self.switch_statement();
        } else if self.matches(TokenKind::LeftBrace) {
            self.begin_scope();
            self.block();
            self.end_scope();
        } else {
            self.expression_statement();
        }
    }

    fn print_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after value.");
        self.emit_op(OpCode::Print);
    }

    fn expression_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.");
        self.emit_op(OpCode::Pop);
    }

    fn block(&mut self) {
        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            self.declaration();
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.");
    }

    fn if_statement(&mut self) {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.");
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after condition.");

        let then_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.statement();

        let else_jump = self.emit_jump(OpCode::Jump);
        self.patch_jump(then_jump);
        self.emit_op(OpCode::Pop);

        if self.matches(TokenKind::Else) {
            self.statement();
        }
        self.patch_jump(else_jump);
    }

    fn while_statement(&mut self) {
        let loop_start = self.chunk.len();
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.");
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after condition.");

        let exit_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.statement();
        self.emit_loop(loop_start);

        self.patch_jump(exit_jump);
        self.emit_op(OpCode::Pop);
    }

    fn for_statement(&mut self) {
        self.begin_scope();
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.");

        if self.matches(TokenKind::Semicolon) {
            // no initializer
        } else if self.matches(TokenKind::Var) {
            self.var_declaration(false);
        } else if self.matches(TokenKind::Const) {
            self.var_declaration(true);
        } else {
            self.expression_statement();
        }

        let mut loop_start = self.chunk.len();
        let mut exit_jump = None;
        if !self.matches(TokenKind::Semicolon) {
            self.expression();
            self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.");
            exit_jump = Some(self.emit_jump(OpCode::JumpIfFalse));
            self.emit_op(OpCode::Pop);
        }

        if !self.matches(TokenKind::RightParen) {
            let body_jump = self.emit_jump(OpCode::Jump);
            let increment_start = self.chunk.len();
            self.expression();
            self.emit_op(OpCode::Pop);
            self.consume(TokenKind::RightParen, "Expect ')' after for clauses.");

            self.emit_loop(loop_start);
            loop_start = increment_start;
            self.patch_jump(body_jump);
        }

        self.statement();
        self.emit_loop(loop_start);

        if let Some(exit_jump) = exit_jump {
            self.patch_jump(exit_jump);
            self.emit_op(OpCode::Pop);
        }

        self.end_scope();
    }

    /// Hoists the switch value into a hidden global slot so each `case` can
    /// re-fetch it without re-evaluating the subject expression. Every case
    /// body ends with a jump to the point right before `default`'s body —
    /// which means `default`, if present, always runs after whichever case
    /// matched (or after falling through every case untaken). This
    /// fallthrough-to-default is pinned, matching behavior: `switch` never
    /// has a `break`-equivalent that skips `default`.
    fn switch_statement(&mut self) {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'switch'.");
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after switch value.");
        self.consume(TokenKind::LeftBrace, "Expect '{' before switch body.");

        let temp_name = self.interner.intern("__switch_temp");
        let temp_const = self.make_constant(Value::string(temp_name));
        self.emit_op_byte(OpCode::DefineGlobal, temp_const);

        let mut end_jumps = Vec::new();

        while self.matches(TokenKind::Case) {
            self.emit_op_byte(OpCode::GetGlobal, temp_const);
            self.expression();
            self.consume(TokenKind::Colon, "Expect ':' after case value.");
            self.emit_op(OpCode::Equal);

            let next_jump = self.emit_jump(OpCode::JumpIfFalse);
            self.emit_op(OpCode::Pop);
            self.statement();
            end_jumps.push(self.emit_jump(OpCode::Jump));

            self.patch_jump(next_jump);
            self.emit_op(OpCode::Pop);
        }

        for jump in end_jumps {
            self.patch_jump(jump);
        }

        if self.matches(TokenKind::Default) {
            self.consume(TokenKind::Colon, "Expect ':' after 'default'.");
            self.statement();
        }

        self.consume(TokenKind::RightBrace, "Expect '}' after switch body.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wisp_core::OpCode as Op;

    fn compiled(source: &str) -> Chunk {
        let mut interner = Interner::new();
        compile(source, &mut interner).expect("source should compile")
    }

    #[test]
    fn ends_with_return() {
        let chunk = compiled("print 1;");
        assert_eq!(*chunk.code.last().unwrap(), u8::from(Op::Return));
    }

    #[test]
    fn arithmetic_precedence_emits_multiply_before_add() {
        let chunk = compiled("1 + 2 * 3;");
        let ops: Vec<u8> = chunk
            .code
            .iter()
            .copied()
            .filter(|&b| b == u8::from(Op::Multiply) || b == u8::from(Op::Add))
            .collect();
        assert_eq!(ops, vec![u8::from(Op::Multiply), u8::from(Op::Add)]);
    }

    #[test]
    fn const_reassignment_is_a_compile_error() {
        let mut interner = Interner::new();
        let errors = compile("const pi = 3; pi = 4;", &mut interner).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.message.contains("Can't reassign to const variable")));
    }

    #[test]
    fn local_self_reference_in_initializer_is_an_error() {
        let mut interner = Interner::new();
        let errors = compile("{ var a = a; }", &mut interner).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.message.contains("own initializer")));
    }

    #[test]
    fn duplicate_local_in_same_scope_is_an_error() {
        let mut interner = Interner::new();
        let errors = compile("{ var a = 1; var a = 2; }", &mut interner).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.message.contains("Already a variable with this name")));
    }

    #[test]
    fn invalid_assignment_target_is_rejected() {
        let mut interner = Interner::new();
        let errors = compile("a + b = 1;", &mut interner).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.message.contains("Invalid assignment target")));
    }

    #[test]
    fn panic_mode_suppresses_cascading_errors() {
        let mut interner = Interner::new();
        let errors = compile("var = ; var = ;", &mut interner).unwrap_err();
        // Each malformed declaration resyncs at its ';', so exactly one
        // error is reported per statement rather than a cascade.
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn exactly_256_distinct_constants_compiles() {
        let source: String = (0..256).map(|i| format!("{i}.5;\n")).collect();
        let mut interner = Interner::new();
        assert!(compile(&source, &mut interner).is_ok());
    }

    #[test]
    fn too_many_constants_is_rejected() {
        let source: String = (0..257).map(|i| format!("{i}.5;\n")).collect();
        let mut interner = Interner::new();
        let errors = compile(&source, &mut interner).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.message.contains("Too many constants")));
    }
}
