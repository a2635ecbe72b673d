//! Statements.
use crate::{
    error::JackResult,
    lex::{Keyword, Symbol, TokenKind},
    vm::{Command, Instruction, InstructionSink, Segment},
};

use super::Compiler;

impl<'a, S: InstructionSink> Compiler<'a, S> {
    /// `statement*`
    ///
    /// Stops at the first token that doesn't start a statement,
    /// which the caller expects to be a closing brace.
    pub(super) fn compile_statements(&mut self) -> JackResult<()> {
        while let Some(TokenKind::Keyword(keyword)) = self.stream.peek_kind() {
            match keyword {
                Keyword::Let => self.compile_let()?,
                Keyword::If => self.compile_if()?,
                Keyword::While => self.compile_while()?,
                Keyword::Do => self.compile_do()?,
                Keyword::Return => self.compile_return()?,
                _ => break,
            }
        }

        Ok(())
    }

    /// `'let' varName ('[' expression ']')? '=' expression ';'`
    fn compile_let(&mut self) -> JackResult<()> {
        self.stream.consume_keyword(Keyword::Let)?;
        let name = self.stream.consume_ident()?;
        let target = self.resolve(&name)?;

        if self.stream.match_symbol(Symbol::LeftBracket) {
            // Element address is left on the stack.
            self.compile_enclosed_expression()?;
            self.stream.consume_symbol(Symbol::RightBracket)?;
            self.push_variable(&target)?;
            self.emit(Instruction::Arithmetic(Command::Add))?;

            self.stream.consume_symbol(Symbol::Eq)?;
            self.compile_enclosed_expression()?;
            self.stream.consume_symbol(Symbol::Semicolon)?;

            // The right hand side may have moved `that`, so the
            // address is only bound after it's been evaluated.
            self.emit(Instruction::Pop(Segment::Temp, 0))?;
            self.emit(Instruction::Pop(Segment::Pointer, 1))?;
            self.emit(Instruction::Push(Segment::Temp, 0))?;
            self.emit(Instruction::Pop(Segment::That, 0))?;
        } else {
            self.stream.consume_symbol(Symbol::Eq)?;
            self.compile_enclosed_expression()?;
            self.stream.consume_symbol(Symbol::Semicolon)?;
            self.pop_variable(&target)?;
        }

        Ok(())
    }

    /// `'if' '(' expression ')' '{' statements '}' ('else' '{' statements '}')?`
    fn compile_if(&mut self) -> JackResult<()> {
        let n = self.next_if_label()?;
        let if_true = format!("IF_TRUE{n}");
        let if_false = format!("IF_FALSE{n}");

        self.stream.consume_keyword(Keyword::If)?;
        self.stream.consume_symbol(Symbol::LeftParen)?;
        self.compile_enclosed_expression()?;
        self.stream.consume_symbol(Symbol::RightParen)?;

        self.emit(Instruction::IfGoto(if_true.as_str().into()))?;
        self.emit(Instruction::Goto(if_false.as_str().into()))?;
        self.emit(Instruction::Label(if_true.into()))?;

        self.compile_block()?;

        if self.stream.check_keyword(Keyword::Else) {
            let if_end = format!("IF_END{n}");
            self.stream.advance();

            self.emit(Instruction::Goto(if_end.as_str().into()))?;
            self.emit(Instruction::Label(if_false.into()))?;
            self.compile_block()?;
            self.emit(Instruction::Label(if_end.into()))?;
        } else {
            self.emit(Instruction::Label(if_false.into()))?;
        }

        Ok(())
    }

    /// `'while' '(' expression ')' '{' statements '}'`
    fn compile_while(&mut self) -> JackResult<()> {
        let n = self.next_while_label()?;
        let head = format!("WHILE_EXP{n}");
        let end = format!("WHILE_END{n}");

        self.stream.consume_keyword(Keyword::While)?;
        self.emit(Instruction::Label(head.as_str().into()))?;

        self.stream.consume_symbol(Symbol::LeftParen)?;
        self.compile_enclosed_expression()?;
        self.stream.consume_symbol(Symbol::RightParen)?;

        self.emit(Instruction::Arithmetic(Command::Not))?;
        self.emit(Instruction::IfGoto(end.as_str().into()))?;

        self.compile_block()?;

        self.emit(Instruction::Goto(head.into()))?;
        self.emit(Instruction::Label(end.into()))?;

        Ok(())
    }

    /// `'do' subroutineCall ';'`
    fn compile_do(&mut self) -> JackResult<()> {
        self.stream.consume_keyword(Keyword::Do)?;
        let name = self.stream.consume_ident()?;
        self.compile_call(name)?;
        self.stream.consume_symbol(Symbol::Semicolon)?;

        // Discard the return value.
        self.emit(Instruction::Pop(Segment::Temp, 0))
    }

    /// `'return' expression? ';'`
    fn compile_return(&mut self) -> JackResult<()> {
        self.stream.consume_keyword(Keyword::Return)?;

        if !self.stream.check_symbol(Symbol::Semicolon) {
            self.compile_enclosed_expression()?;
        }
        self.stream.consume_symbol(Symbol::Semicolon)?;

        if self.returns_void {
            self.emit(Instruction::push_constant(0))?;
        }

        self.emit(Instruction::Return)
    }

    /// `'{' statements '}'`
    fn compile_block(&mut self) -> JackResult<()> {
        self.stream.consume_symbol(Symbol::LeftBrace)?;
        self.nested(Self::compile_statements)?;
        self.stream.consume_symbol(Symbol::RightBrace)?;
        Ok(())
    }
}
