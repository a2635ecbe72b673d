//! Expressions and terms.
use crate::{
    constants::{MAX_INT_CONSTANT, STRING_APPEND_CHAR, STRING_NEW},
    error::{JackError, JackResult},
    lex::{Keyword, Symbol, Token, TokenKind},
    vm::{Command, Instruction, InstructionSink, Segment},
};

use super::{BinOp, Compiler, Marker, OperatorOrder, UnaryOp};

impl<'a, S: InstructionSink> Compiler<'a, S> {
    /// Compile an expression bracketed by its own start marker,
    /// so all of its operators are applied before returning.
    pub(super) fn compile_enclosed_expression(&mut self) -> JackResult<()> {
        self.markers.push(Marker::Start);
        self.compile_expression()?;
        self.drain()
    }

    /// `term (op term)*`
    ///
    /// The caller is responsible for the start marker and the drain.
    fn compile_expression(&mut self) -> JackResult<()> {
        self.compile_term()?;

        while let Some(op) = self.peek_binary_op() {
            self.push_binary(op)?;
            self.stream.advance();
            self.compile_term()?;
        }

        Ok(())
    }

    fn peek_binary_op(&mut self) -> Option<BinOp> {
        match self.stream.peek_kind()? {
            TokenKind::Symbol(symbol) => BinOp::from_symbol(symbol),
            _ => None,
        }
    }

    /// Defer a binary operator until its right operand is on the stack.
    fn push_binary(&mut self, op: BinOp) -> JackResult<()> {
        if self.conf.operator_order == OperatorOrder::LeftToRight {
            // Everything pending to the left has both its operands now.
            self.apply_pending()?;
        }
        self.markers.push(Marker::Binary(op));
        Ok(())
    }

    /// Emit pending operators down to, but excluding, the nearest start marker.
    fn apply_pending(&mut self) -> JackResult<()> {
        while let Some(instr) = self.markers.last().and_then(Marker::instruction) {
            self.markers.pop();
            self.emit(instr)?;
        }
        Ok(())
    }

    /// Emit pending operators, last pushed first, and consume
    /// the nearest start marker.
    fn drain(&mut self) -> JackResult<()> {
        while let Some(marker) = self.markers.pop() {
            match marker.instruction() {
                Some(instr) => self.emit(instr)?,
                None => break,
            }
        }
        Ok(())
    }

    /// Compile a single term, leaving its value on the stack.
    fn compile_term(&mut self) -> JackResult<()> {
        self.nested(Self::compile_term_inner)
    }

    fn compile_term_inner(&mut self) -> JackResult<()> {
        let token = match self.stream.advance() {
            Some(token) => token,
            None => return Err(self.stream.unexpected("term")),
        };

        match token.kind {
            TokenKind::IntConst => self.compile_int(&token),
            TokenKind::StringConst => self.compile_string(&token),
            TokenKind::Keyword(Keyword::True) => {
                self.emit(Instruction::push_constant(0))?;
                self.emit(Instruction::Arithmetic(Command::Not))
            }
            TokenKind::Keyword(Keyword::False) | TokenKind::Keyword(Keyword::Null) => {
                self.emit(Instruction::push_constant(0))
            }
            TokenKind::Keyword(Keyword::This) => self.emit(Instruction::Push(Segment::Pointer, 0)),
            TokenKind::Symbol(Symbol::LeftParen) => {
                self.markers.push(Marker::Start);
                self.compile_expression()?;
                self.stream.consume_symbol(Symbol::RightParen)?;
                self.drain()
            }
            TokenKind::Symbol(symbol) => match UnaryOp::from_symbol(symbol) {
                Some(op) => self.compile_unary(op),
                None => Err(self.malformed(&token)),
            },
            TokenKind::Ident => self.compile_ident_term(token),
            TokenKind::Keyword(_) => Err(self.malformed(&token)),
        }
    }

    fn compile_unary(&mut self, op: UnaryOp) -> JackResult<()> {
        match self.conf.operator_order {
            OperatorOrder::LeftToRight => {
                self.compile_term()?;
                self.emit(op.instruction())
            }
            OperatorOrder::Deferred => {
                self.markers.push(Marker::Unary(op));
                self.compile_term()
            }
        }
    }

    fn compile_int(&mut self, token: &Token) -> JackResult<()> {
        match token.text.parse::<u16>() {
            Ok(value) if value <= MAX_INT_CONSTANT => self.emit(Instruction::push_constant(value)),
            _ => {
                let message = format!(
                    "integer constant {} is out of range, maximum is {}",
                    token.text, MAX_INT_CONSTANT
                );
                Err(JackError::Syntax(self.stream.diagnostic(token, message)))
            }
        }
    }

    /// Strings are built at runtime, one character at a time.
    fn compile_string(&mut self, token: &Token) -> JackResult<()> {
        let chars = token
            .value()
            .chars()
            .map(|c| u16::try_from(u32::from(c)).ok().filter(|code| *code <= MAX_INT_CONSTANT))
            .collect::<Option<Vec<u16>>>()
            .ok_or_else(|| {
                let message = "string constant contains a character outside the VM character set";
                JackError::Syntax(self.stream.diagnostic(token, message))
            })?;

        let len = u16::try_from(chars.len())
            .ok()
            .filter(|len| *len <= MAX_INT_CONSTANT)
            .ok_or_else(|| {
                let message = format!("string constant is longer than {} characters", MAX_INT_CONSTANT);
                JackError::Syntax(self.stream.diagnostic(token, message))
            })?;

        self.emit(Instruction::push_constant(len))?;
        self.emit(Instruction::Call(STRING_NEW.into(), 1))?;

        for code in chars {
            self.emit(Instruction::push_constant(code))?;
            self.emit(Instruction::Call(STRING_APPEND_CHAR.into(), 2))?;
        }

        Ok(())
    }

    /// `varName | varName '[' expression ']' | subroutineCall`
    fn compile_ident_term(&mut self, name: Token) -> JackResult<()> {
        match self.stream.peek_kind() {
            Some(TokenKind::Symbol(Symbol::LeftBracket)) => self.compile_array_read(name),
            Some(TokenKind::Symbol(Symbol::LeftParen)) | Some(TokenKind::Symbol(Symbol::Dot)) => {
                self.compile_call(name)
            }
            _ => {
                let entry = self.resolve(&name)?;
                self.push_variable(&entry)
            }
        }
    }

    /// `varName '[' expression ']'`
    fn compile_array_read(&mut self, name: Token) -> JackResult<()> {
        let array = self.resolve(&name)?;

        self.stream.consume_symbol(Symbol::LeftBracket)?;
        self.markers.push(Marker::Start);
        self.compile_expression()?;
        self.stream.consume_symbol(Symbol::RightBracket)?;
        self.drain()?;

        self.push_variable(&array)?;
        self.emit(Instruction::Arithmetic(Command::Add))?;
        self.emit(Instruction::Pop(Segment::Pointer, 1))?;
        self.emit(Instruction::Push(Segment::That, 0))
    }

    /// `subroutineName '(' expressionList ')'
    ///  | (className | varName) '.' subroutineName '(' expressionList ')'`
    ///
    /// The identifier in front has already been consumed.
    pub(super) fn compile_call(&mut self, name: Token) -> JackResult<()> {
        if self.stream.match_symbol(Symbol::LeftParen) {
            // Method of this object.
            self.emit(Instruction::Push(Segment::Pointer, 0))?;
            let n_args = self.compile_expression_list()?;
            let qualified = self.qualify(&name.text);
            return self.emit(Instruction::Call(qualified, n_args + 1));
        }

        if self.stream.match_symbol(Symbol::Dot) {
            let subroutine = self.stream.consume_ident()?;
            self.stream.consume_symbol(Symbol::LeftParen)?;

            return match self.symbols.lookup(&name.text).cloned() {
                Some(receiver) => {
                    // Method on a variable, which is the implicit first argument.
                    self.push_variable(&receiver)?;
                    let n_args = self.compile_expression_list()?;
                    let qualified = super::qualified_name(&receiver.ty, &subroutine.text);
                    self.emit(Instruction::Call(qualified, n_args + 1))
                }
                None => {
                    // Function or constructor of another class.
                    let n_args = self.compile_expression_list()?;
                    let qualified = super::qualified_name(&name.text, &subroutine.text);
                    self.emit(Instruction::Call(qualified, n_args))
                }
            };
        }

        Err(self.stream.unexpected("'(' or '.'"))
    }

    /// `(expression (',' expression)*)? ')'`
    ///
    /// Returns the number of arguments.
    fn compile_expression_list(&mut self) -> JackResult<u16> {
        let mut count = 0;

        if !self.stream.check_symbol(Symbol::RightParen) {
            loop {
                self.compile_enclosed_expression()?;
                // Leaves room for an implicit receiver.
                count = match u16::checked_add(count, 1).filter(|count| *count < u16::MAX) {
                    Some(count) => count,
                    None => {
                        let message = "too many arguments in call";
                        return Err(self.limit_exceeded(JackError::Syntax, message));
                    }
                };

                if !self.stream.match_symbol(Symbol::Comma) {
                    break;
                }
            }
        }

        self.stream.consume_symbol(Symbol::RightParen)?;

        Ok(count)
    }

    /// Error for a token that can't start a term.
    #[inline(never)]
    #[cold]
    fn malformed(&self, token: &Token) -> JackError {
        let message = format!("expected term, found '{}'", token.text);
        JackError::Structural(self.stream.diagnostic(token, message))
    }
}
