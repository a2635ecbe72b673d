//! Stack machine instruction set.
use std::{fmt, io};

use smol_str::SmolStr;

use crate::error::JackResult;

/// Virtual machine instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// `push segment index`
    Push(Segment, u16),
    /// `pop segment index`
    Pop(Segment, u16),
    /// Zero operand arithmetic or logical command.
    Arithmetic(Command),
    Label(SmolStr),
    Goto(SmolStr),
    /// Pop the stack top and jump if it's not false.
    IfGoto(SmolStr),
    /// `call name nArgs`
    Call(SmolStr, u16),
    /// `function name nLocals`
    Function(SmolStr, u16),
    Return,
}

impl Instruction {
    #[inline]
    pub fn push_constant(value: u16) -> Self {
        Self::Push(Segment::Constant, value)
    }
}

/// Outputs instruction as VM source text.
impl fmt::Display for Instruction {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Instruction::Push(seg, index)  => write!(f, "push {} {}", seg, index),
            Instruction::Pop(seg, index)   => write!(f, "pop {} {}", seg, index),
            Instruction::Arithmetic(cmd)   => write!(f, "{}", cmd),
            Instruction::Label(name)       => write!(f, "label {}", name),
            Instruction::Goto(name)        => write!(f, "goto {}", name),
            Instruction::IfGoto(name)      => write!(f, "if-goto {}", name),
            Instruction::Call(name, n)     => write!(f, "call {} {}", name, n),
            Instruction::Function(name, n) => write!(f, "function {} {}", name, n),
            Instruction::Return            => write!(f, "return"),
        }
    }
}

/// Memory segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// Virtual segment holding the constants `0..=32767`.
    Constant,
    Argument,
    Local,
    Static,
    /// Fields of the object pointed to by `pointer 0`.
    This,
    /// Array memory pointed to by `pointer 1`.
    That,
    /// `pointer 0` is the base of `this`, `pointer 1` the base of `that`.
    Pointer,
    Temp,
}

impl fmt::Display for Segment {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Segment::Constant => "constant",
            Segment::Argument => "argument",
            Segment::Local    => "local",
            Segment::Static   => "static",
            Segment::This     => "this",
            Segment::That     => "that",
            Segment::Pointer  => "pointer",
            Segment::Temp     => "temp",
        };
        f.write_str(name)
    }
}

/// Arithmetic and logical commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
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

impl fmt::Display for Command {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Command::Add => "add",
            Command::Sub => "sub",
            Command::Neg => "neg",
            Command::Eq  => "eq",
            Command::Gt  => "gt",
            Command::Lt  => "lt",
            Command::And => "and",
            Command::Or  => "or",
            Command::Not => "not",
        };
        f.write_str(name)
    }
}

/// Destination for emitted instructions.
pub trait InstructionSink {
    fn write(&mut self, instr: Instruction) -> JackResult<()>;
}

/// In-memory buffer.
impl InstructionSink for Vec<Instruction> {
    #[inline]
    fn write(&mut self, instr: Instruction) -> JackResult<()> {
        self.push(instr);
        Ok(())
    }
}

impl<T: InstructionSink + ?Sized> InstructionSink for &mut T {
    #[inline]
    fn write(&mut self, instr: Instruction) -> JackResult<()> {
        (**self).write(instr)
    }
}

/// Writes instructions as text, one per line.
pub struct VmWriter<W> {
    inner: W,
    count: usize,
}

impl<W: io::Write> VmWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }

    /// Number of instructions written so far.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn flush(&mut self) -> JackResult<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write> InstructionSink for VmWriter<W> {
    fn write(&mut self, instr: Instruction) -> JackResult<()> {
        writeln!(self.inner, "{}", instr)?;
        self.count += 1;
        Ok(())
    }
}

/// Render a listing of instructions as VM source text.
pub fn to_vm_text(instructions: &[Instruction]) -> String {
    use std::fmt::Write as FmtWrite;

    let mut s = String::new();
    for instr in instructions {
        // Writing to a String never fails.
        let _ = writeln!(s, "{}", instr);
    }
    s
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_instruction_text() {
        let cases = [
            (Instruction::push_constant(7), "push constant 7"),
            (Instruction::Pop(Segment::That, 0), "pop that 0"),
            (Instruction::Arithmetic(Command::Neg), "neg"),
            (Instruction::Label("IF_TRUE0".into()), "label IF_TRUE0"),
            (Instruction::Goto("WHILE_EXP1".into()), "goto WHILE_EXP1"),
            (Instruction::IfGoto("IF_END2".into()), "if-goto IF_END2"),
            (Instruction::Call("Math.multiply".into(), 2), "call Math.multiply 2"),
            (Instruction::Function("Main.main".into(), 3), "function Main.main 3"),
            (Instruction::Return, "return"),
        ];

        for (instr, text) in cases {
            assert_eq!(instr.to_string(), text);
        }
    }

    #[test]
    fn test_vm_writer() {
        let mut writer = VmWriter::new(Vec::new());
        writer.write(Instruction::Push(Segment::Local, 1)).unwrap();
        writer.write(Instruction::Return).unwrap();
        assert_eq!(writer.count(), 2);
        assert_eq!(writer.into_inner(), b"push local 1\nreturn\n");
    }

    #[test]
    fn test_writer_io_error() {
        struct Broken;

        impl io::Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut writer = VmWriter::new(Broken);
        let err = writer.write(Instruction::Return).unwrap_err();
        assert!(matches!(err, crate::error::JackError::Io(_)));
    }
}
