//! Bytecode disassembler, used only for `trace-exec` debug tracing.

use wisp_core::{Chunk, OpCode};

pub fn disassemble_chunk(chunk: &Chunk, name: &str) {
    println!("== {name} ==");
    let mut offset = 0;
    while offset < chunk.len() {
        offset = disassemble_instruction(chunk, offset);
    }
}

/// Print the instruction at `offset` and return the offset of the next one.
pub fn disassemble_instruction(chunk: &Chunk, offset: usize) -> usize {
    print!("{offset:04} ");

    let byte = chunk.code[offset];
    let Ok(op) = OpCode::try_from(byte) else {
        println!("Unknown opcode {byte}");
        return offset + 1;
    };

    match op.operand_len() {
        0 => simple_instruction(op, offset),
        1 if matches!(
            op,
            OpCode::Constant | OpCode::GetGlobal | OpCode::DefineGlobal | OpCode::SetGlobal
        ) =>
        {
            constant_instruction(op, chunk, offset)
        }
        1 => byte_instruction(op, chunk, offset),
        2 => jump_instruction(op, chunk, offset),
        _ => unreachable!("opcodes only carry 0, 1, or 2 operand bytes"),
    }
}

fn simple_instruction(op: OpCode, offset: usize) -> usize {
    println!("{}", op.name());
    offset + 1
}

fn byte_instruction(op: OpCode, chunk: &Chunk, offset: usize) -> usize {
    let slot = chunk.code[offset + 1];
    println!("{:<16} {slot:4}", op.name());
    offset + 2
}

fn constant_instruction(op: OpCode, chunk: &Chunk, offset: usize) -> usize {
    let index = chunk.code[offset + 1] as usize;
    println!("{:<16} {index:4} '{}'", op.name(), chunk.constants[index]);
    offset + 2
}

fn jump_instruction(op: OpCode, chunk: &Chunk, offset: usize) -> usize {
    let jump = chunk.read_u16(offset + 1) as usize;
    let target = if op == OpCode::Loop {
        offset + 3 - jump
    } else {
        offset + 3 + jump
    };
    println!("{:<16} {offset:4} -> {target}", op.name());
    offset + 3
}
