//! Expression operators and the deferred operator stack.
use crate::{
    constants::{MATH_DIVIDE, MATH_MULTIPLY},
    lex::Symbol,
    vm::{Command, Instruction},
};

/// Binary operators. All share one precedence level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Lt,
    Gt,
    Eq,
}

impl BinOp {
    #[rustfmt::skip]
    pub fn from_symbol(symbol: Symbol) -> Option<Self> {
        match symbol {
            Symbol::Plus    => Some(BinOp::Add),
            Symbol::Minus   => Some(BinOp::Sub),
            Symbol::Star    => Some(BinOp::Mul),
            Symbol::Slash   => Some(BinOp::Div),
            Symbol::Amp     => Some(BinOp::And),
            Symbol::Pipe    => Some(BinOp::Or),
            Symbol::Less    => Some(BinOp::Lt),
            Symbol::Greater => Some(BinOp::Gt),
            Symbol::Eq      => Some(BinOp::Eq),
            _ => None,
        }
    }

    /// Multiplication and division are calls into the runtime.
    #[rustfmt::skip]
    pub fn instruction(&self) -> Instruction {
        match self {
            BinOp::Add => Instruction::Arithmetic(Command::Add),
            BinOp::Sub => Instruction::Arithmetic(Command::Sub),
            BinOp::And => Instruction::Arithmetic(Command::And),
            BinOp::Or  => Instruction::Arithmetic(Command::Or),
            BinOp::Lt  => Instruction::Arithmetic(Command::Lt),
            BinOp::Gt  => Instruction::Arithmetic(Command::Gt),
            BinOp::Eq  => Instruction::Arithmetic(Command::Eq),
            BinOp::Mul => Instruction::Call(MATH_MULTIPLY.into(), 2),
            BinOp::Div => Instruction::Call(MATH_DIVIDE.into(), 2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation, `-x`
    Neg,
    /// Bitwise not, `~x`
    Not,
}

impl UnaryOp {
    pub fn from_symbol(symbol: Symbol) -> Option<Self> {
        match symbol {
            Symbol::Minus => Some(UnaryOp::Neg),
            Symbol::Tilde => Some(UnaryOp::Not),
            _ => None,
        }
    }

    pub fn instruction(&self) -> Instruction {
        match self {
            UnaryOp::Neg => Instruction::Arithmetic(Command::Neg),
            UnaryOp::Not => Instruction::Arithmetic(Command::Not),
        }
    }
}

/// Entry on the deferred operator stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// Bottom of an expression. Draining stops here.
    Start,
    Binary(BinOp),
    Unary(UnaryOp),
}

impl Marker {
    /// Instruction applying the operator, `None` for a start marker.
    pub fn instruction(&self) -> Option<Instruction> {
        match self {
            Marker::Start => None,
            Marker::Binary(op) => Some(op.instruction()),
            Marker::Unary(op) => Some(op.instruction()),
        }
    }
}

/// Order in which the operators of an expression are applied.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OperatorOrder {
    /// Operators are applied left to right as soon as both
    /// operands are on the stack, and a unary operator right
    /// after its operand.
    ///
    /// `a - b - c` evaluates as `(a - b) - c`.
    #[default]
    LeftToRight,
    /// All operators of an expression are held back until the
    /// expression ends, then applied last-in first-out.
    ///
    /// `a - b - c` evaluates as `a - (b - c)`, and `-a + b` as `-(a + b)`.
    Deferred,
}
