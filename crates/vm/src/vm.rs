//! The stack-based virtual machine.

use std::rc::Rc;

use tracing::debug;
use wisp_compiler::compile;
use wisp_core::{Chunk, Interner, Obj, ObjString, OpCode, Table, Value};

use crate::error::RuntimeError;
use crate::InterpretError;

#[cfg(feature = "trace-exec")]
use crate::disassemble;

const STACK_MAX: usize = 256;
const GLOBALS_CACHE_MAX: usize = 100;

struct GlobalCacheEntry {
    name: Rc<ObjString>,
    value: Value,
}

/// Executes one chunk at a time against a value stack, a globals table with
/// an inline cache, and a string-intern table shared with the compiler.
/// `interner` and `globals` outlive any single `interpret` call — a REPL
/// session keeps interning and defining across lines; `chunk` and `ip` are
/// replaced on every call.
pub struct Vm {
    chunk: Chunk,
    ip: usize,
    stack: Vec<Value>,
    interner: Interner,
    globals: Table<Value>,
    globals_cache: Vec<GlobalCacheEntry>,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    pub fn new() -> Self {
        Vm {
            chunk: Chunk::new(),
            ip: 0,
            stack: Vec::with_capacity(STACK_MAX),
            interner: Interner::new(),
            globals: Table::new(),
            globals_cache: Vec::new(),
        }
    }

    /// Compile `source` into a fresh chunk and run it.
    pub fn interpret(&mut self, source: &str) -> Result<(), InterpretError> {
        let chunk = compile(source, &mut self.interner).map_err(InterpretError::Compile)?;
        self.chunk = chunk;
        self.ip = 0;

        #[cfg(feature = "trace-exec")]
        disassemble::disassemble_chunk(&self.chunk, "script");

        self.run()
    }

    fn run(&mut self) -> Result<(), InterpretError> {
        loop {
            #[cfg(feature = "trace-exec")]
            {
                self.trace_stack();
                disassemble::disassemble_instruction(&self.chunk, self.ip);
            }

            let instruction = self.read_byte();
            let op = OpCode::try_from(instruction)
                .unwrap_or_else(|b| panic!("corrupt bytecode: unknown opcode {b}"));

            match op {
                OpCode::Constant => {
                    let value = self.read_constant();
                    self.push(value);
                }
                OpCode::Nil => self.push(Value::Nil),
                OpCode::True => self.push(Value::Bool(true)),
                OpCode::False => self.push(Value::Bool(false)),
                OpCode::Pop => {
                    self.pop();
                }
                OpCode::GetLocal => {
                    let slot = self.read_byte() as usize;
                    self.push(self.stack[slot].clone());
                }
                OpCode::SetLocal => {
                    let slot = self.read_byte() as usize;
                    self.stack[slot] = self.peek(0).clone();
                }
                OpCode::GetGlobal => self.get_global()?,
                OpCode::GetGlobalFast => {
                    let idx = self.read_byte() as usize;
                    let value = self.globals_cache[idx].value.clone();
                    self.push(value);
                }
                OpCode::DefineGlobal => {
                    let name = self.read_string();
                    let value = self.pop();
                    self.globals.set(Rc::clone(&name), value.clone());
                    self.write_through_cache(&name, value);
                }
                OpCode::SetGlobal => {
                    let name = self.read_string();
                    let value = self.peek(0).clone();
                    if self.globals.set(Rc::clone(&name), value.clone()) {
                        self.globals.delete(name.as_str(), name.hash);
                        return Err(self.undefined_variable(&name));
                    }
                    self.write_through_cache(&name, value);
                }
                OpCode::Equal => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(Value::Bool(a == b));
                }
                OpCode::Greater => self.binary_compare(|a, b| a > b)?,
                OpCode::Less => self.binary_compare(|a, b| a < b)?,
                OpCode::Add => self.add()?,
                OpCode::Subtract => self.binary_numeric(|a, b| a - b)?,
                OpCode::Multiply => self.binary_numeric(|a, b| a * b)?,
                OpCode::Divide => self.binary_numeric(|a, b| a / b)?,
                OpCode::Not => {
                    let value = self.pop();
                    self.push(Value::Bool(value.is_falsey()));
                }
                OpCode::Negate => {
                    let number = self.peek(0).as_number();
                    match number {
                        Some(n) => {
                            self.pop();
                            self.push(Value::Number(-n));
                        }
                        None => return Err(self.runtime_error("Operand must be a number.")),
                    }
                }
                OpCode::Print => {
                    let value = self.pop();
                    println!("{value}");
                }
                OpCode::Jump => {
                    let offset = self.read_u16();
                    self.ip += offset as usize;
                }
                OpCode::JumpIfFalse => {
                    let offset = self.read_u16();
                    if self.peek(0).is_falsey() {
                        self.ip += offset as usize;
                    }
                }
                OpCode::Loop => {
                    let offset = self.read_u16();
                    self.ip -= offset as usize;
                }
                OpCode::Return => return Ok(()),
            }
        }
    }

    // --- instruction decoding ---------------------------------------------------

    fn read_byte(&mut self) -> u8 {
        let byte = self.chunk.code[self.ip];
        self.ip += 1;
        byte
    }

    fn read_u16(&mut self) -> u16 {
        let value = self.chunk.read_u16(self.ip);
        self.ip += 2;
        value
    }

    fn read_constant(&mut self) -> Value {
        let idx = self.read_byte() as usize;
        self.chunk.constants[idx].clone()
    }

    fn read_string(&mut self) -> Rc<ObjString> {
        match self.read_constant() {
            Value::Obj(Obj::String(s)) => s,
            other => unreachable!("compiler only emits name operands as strings, got {other:?}"),
        }
    }

    // --- stack ---------------------------------------------------

    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn pop(&mut self) -> Value {
        self.stack
            .pop()
            .expect("compiler-predicted stack depth underflowed")
    }

    fn peek(&self, distance: usize) -> &Value {
        &self.stack[self.stack.len() - 1 - distance]
    }

    #[cfg(feature = "trace-exec")]
    fn trace_stack(&self) {
        print!("          ");
        for value in &self.stack {
            print!("[ {value} ]");
        }
        println!();
    }

    // --- globals and the inline cache ---------------------------------------------------

    fn get_global(&mut self) -> Result<(), InterpretError> {
        let name_offset = self.ip;
        let name = self.read_string();
        let Some(value) = self.globals.get(name.as_str(), name.hash).cloned() else {
            return Err(self.undefined_variable(&name));
        };

        if self.globals_cache.len() < GLOBALS_CACHE_MAX {
            let cache_idx = self.globals_cache.len() as u8;
            self.globals_cache.push(GlobalCacheEntry {
                name: Rc::clone(&name),
                value: value.clone(),
            });
            self.patch_get_global_to_fast(name_offset, cache_idx, &name);
        }

        self.push(value);
        Ok(())
    }

    /// Rewrites this call site to `OP_GET_GLOBAL_FAST`, then scans forward
    /// from the current `ip` and rewrites every later `OP_GET_GLOBAL` that
    /// names the same (interned, so pointer-comparable) global.
    fn patch_get_global_to_fast(&mut self, name_offset: usize, cache_idx: u8, name: &Rc<ObjString>) {
        self.chunk.code[name_offset - 1] = OpCode::GetGlobalFast.into();
        self.chunk.code[name_offset] = cache_idx;

        let mut offset = self.ip;
        while offset < self.chunk.len() {
            let Ok(op) = OpCode::try_from(self.chunk.code[offset]) else {
                break;
            };
            if op == OpCode::GetGlobal {
                let const_idx = self.chunk.code[offset + 1] as usize;
                if let Value::Obj(Obj::String(s)) = &self.chunk.constants[const_idx] {
                    if Rc::ptr_eq(s, name) {
                        self.chunk.code[offset] = OpCode::GetGlobalFast.into();
                        self.chunk.code[offset + 1] = cache_idx;
                    }
                }
            }
            offset += 1 + op.operand_len();
        }
    }

    fn write_through_cache(&mut self, name: &Rc<ObjString>, value: Value) {
        if let Some(entry) = self
            .globals_cache
            .iter_mut()
            .find(|entry| Rc::ptr_eq(&entry.name, name))
        {
            entry.value = value;
        }
    }

    // --- arithmetic ---------------------------------------------------

    fn binary_numeric(&mut self, op: impl Fn(f64, f64) -> f64) -> Result<(), InterpretError> {
        let b = self.peek(0).as_number();
        let a = self.peek(1).as_number();
        match (a, b) {
            (Some(a), Some(b)) => {
                self.pop();
                self.pop();
                self.push(Value::Number(op(a, b)));
                Ok(())
            }
            _ => Err(self.runtime_error("Operands must be numbers.")),
        }
    }

    fn binary_compare(&mut self, op: impl Fn(f64, f64) -> bool) -> Result<(), InterpretError> {
        let b = self.peek(0).as_number();
        let a = self.peek(1).as_number();
        match (a, b) {
            (Some(a), Some(b)) => {
                self.pop();
                self.pop();
                self.push(Value::Bool(op(a, b)));
                Ok(())
            }
            _ => Err(self.runtime_error("Operands must be numbers.")),
        }
    }

    fn add(&mut self) -> Result<(), InterpretError> {
        let b_is_number = self.peek(0).as_number().is_some();
        let a_is_number = self.peek(1).as_number().is_some();
        if a_is_number && b_is_number {
            return self.binary_numeric(|a, b| a + b);
        }

        let b_is_string = self.peek(0).is_string();
        let a_is_string = self.peek(1).is_string();
        if a_is_string && b_is_string {
            let b = self.pop();
            let a = self.pop();
            let concatenated = format!("{a}{b}");
            let interned = self.interner.intern(&concatenated);
            self.push(Value::string(interned));
            return Ok(());
        }

        Err(self.runtime_error("Operands must be two numbers or two strings."))
    }

    // --- errors ---------------------------------------------------

    fn undefined_variable(&mut self, name: &ObjString) -> InterpretError {
        self.runtime_error(&format!("Undefined variable '{}'.", name.as_str()))
    }

    /// `ip - 1` because `ip` has already advanced past the opcode byte that
    /// raised this error.
    fn runtime_error(&mut self, message: &str) -> InterpretError {
        let line = self.chunk.get_line(self.ip - 1);
        debug!(line, error = message, "runtime error");
        self.stack.clear();
        InterpretError::Runtime(RuntimeError {
            message: message.to_string(),
            line,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> Result<(), InterpretError> {
        Vm::new().interpret(source)
    }

    #[test]
    fn arithmetic_precedence() {
        assert!(run("print 1 + 2 * 3;").is_ok());
    }

    #[test]
    fn short_circuit_and_skips_side_effect() {
        let mut vm = Vm::new();
        assert!(vm
            .interpret("var x = 0; (false) and (x = 1); print x;")
            .is_ok());
    }

    #[test]
    fn lexical_scope_does_not_leak() {
        let mut vm = Vm::new();
        assert!(vm
            .interpret(r#"var a = "global"; { var a = "local"; print a; } print a;"#)
            .is_ok());
    }

    #[test]
    fn const_reassignment_is_a_compile_error() {
        let err = run("const pi = 3; pi = 4;").unwrap_err();
        assert!(matches!(err, InterpretError::Compile(_)));
    }

    #[test]
    fn while_loop_runs_to_completion() {
        assert!(run("var i = 0; while (i < 3) { print i; i = i + 1; }").is_ok());
    }

    #[test]
    fn switch_runs_default_after_matched_case() {
        assert!(run(
            r#"var x = 2; switch (x) { case 1: print "one"; case 2: print "two"; default: print "other"; }"#
        )
        .is_ok());
    }

    #[test]
    fn mixed_type_addition_is_a_runtime_error() {
        let err = run(r#""a" + 1;"#).unwrap_err();
        match err {
            InterpretError::Runtime(e) => {
                assert!(e.message.contains("two numbers or two strings"))
            }
            _ => panic!("expected a runtime error"),
        }
    }

    #[test]
    fn string_concatenation() {
        let mut vm = Vm::new();
        assert!(vm.interpret(r#"print "a" + "b";"#).is_ok());
    }

    #[test]
    fn unary_not_truthiness() {
        assert!(run("print !nil; print !false; print !0;").is_ok());
    }

    #[test]
    fn undefined_global_is_a_runtime_error() {
        let err = run("print nope;").unwrap_err();
        assert!(matches!(err, InterpretError::Runtime(_)));
    }

    #[test]
    fn repeated_global_lookups_use_the_inline_cache() {
        let mut vm = Vm::new();
        let source = "var x = 1; print x; print x; print x;";
        assert!(vm.interpret(source).is_ok());
        assert_eq!(vm.globals_cache.len(), 1);
    }

    #[test]
    fn globals_persist_across_interpret_calls() {
        let mut vm = Vm::new();
        assert!(vm.interpret("var x = 1;").is_ok());
        assert!(vm.interpret("print x;").is_ok());
    }
}
