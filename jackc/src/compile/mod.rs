//! Single pass compiler from Jack source to VM instructions.
//!
//! Parsing and code generation are fused: every grammar production
//! emits its instructions as soon as it's recognised. Expressions use
//! an explicit stack of deferred operators instead of a syntax tree.
mod expr;
mod ops;
mod stmts;
mod symbol;

use log::debug;
use smol_str::SmolStr;

pub use self::{
    ops::{BinOp, Marker, OperatorOrder, UnaryOp},
    symbol::{Kind, SymbolEntry, SymbolTable},
};
use crate::{
    constants::{MAX_NESTING_DEPTH, MEMORY_ALLOC, RECEIVER},
    error::{Diagnostic, JackError, JackResult},
    lex::{Keyword, Symbol, Token, TokenKind, TokenStream},
    vm::{Instruction, InstructionSink, Segment},
};

#[derive(Debug, Default, Clone)]
pub struct CompilerConf {
    pub operator_order: OperatorOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

impl SubroutineKind {
    fn from_keyword(keyword: Keyword) -> Option<Self> {
        match keyword {
            Keyword::Constructor => Some(Self::Constructor),
            Keyword::Function => Some(Self::Function),
            Keyword::Method => Some(Self::Method),
            _ => None,
        }
    }
}

pub struct Compiler<'a, S> {
    stream: TokenStream<'a>,
    sink: S,
    conf: CompilerConf,
    symbols: SymbolTable,
    class_name: SmolStr,
    /// Current subroutine is declared `void`.
    returns_void: bool,
    /// Deferred operators of the expressions being compiled.
    markers: Vec<Marker>,
    /// Next `if` label number, restarted per subroutine.
    if_count: u16,
    /// Next `while` label number, restarted per subroutine.
    while_count: u16,
    /// Current nesting of terms and blocks.
    depth: u16,
}

impl<'a, S: InstructionSink> Compiler<'a, S> {
    pub fn new(stream: TokenStream<'a>, sink: S, conf: CompilerConf) -> Self {
        Self {
            stream,
            sink,
            conf,
            symbols: SymbolTable::new(),
            class_name: SmolStr::default(),
            returns_void: false,
            markers: vec![],
            if_count: 0,
            while_count: 0,
            depth: 0,
        }
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Compile the one class the source holds.
    ///
    /// Tokens after the closing brace of the class are an error.
    pub fn compile(&mut self) -> JackResult<()> {
        self.compile_class()?;

        if self.stream.has_more() {
            return Err(self.stream.unexpected("end of source"));
        }

        Ok(())
    }

    /// `'class' className '{' classVarDec* subroutineDec* '}'`
    pub fn compile_class(&mut self) -> JackResult<()> {
        self.stream.consume_keyword(Keyword::Class)?;
        let name = self.stream.consume_ident()?;

        debug!("compiling class {}", name.text);
        self.class_name = name.text;
        self.symbols = SymbolTable::new();

        self.stream.consume_symbol(Symbol::LeftBrace)?;

        while let Some(kind) = self.peek_class_var_kind() {
            self.compile_class_var_dec(kind)?;
        }

        while let Some(kind) = self.peek_subroutine_kind() {
            self.compile_subroutine(kind)?;
        }

        self.stream.consume_symbol(Symbol::RightBrace)?;

        Ok(())
    }

    fn peek_class_var_kind(&mut self) -> Option<Kind> {
        match self.stream.peek_kind()? {
            TokenKind::Keyword(Keyword::Static) => Some(Kind::Static),
            TokenKind::Keyword(Keyword::Field) => Some(Kind::Field),
            _ => None,
        }
    }

    fn peek_subroutine_kind(&mut self) -> Option<SubroutineKind> {
        match self.stream.peek_kind()? {
            TokenKind::Keyword(keyword) => SubroutineKind::from_keyword(keyword),
            _ => None,
        }
    }

    /// `('static' | 'field') type varName (',' varName)* ';'`
    fn compile_class_var_dec(&mut self, kind: Kind) -> JackResult<()> {
        self.stream.advance(); // static or field
        self.compile_var_names(kind)
    }

    /// `'var' type varName (',' varName)* ';'`
    fn compile_var_dec(&mut self) -> JackResult<()> {
        self.stream.consume_keyword(Keyword::Var)?;
        self.compile_var_names(Kind::Local)
    }

    fn compile_var_names(&mut self, kind: Kind) -> JackResult<()> {
        let ty = self.compile_type()?;

        loop {
            let name = self.stream.consume_ident()?;
            self.define(&name, name.text.clone(), ty.clone(), kind)?;

            if !self.stream.match_symbol(Symbol::Comma) {
                break;
            }
        }

        self.stream.consume_symbol(Symbol::Semicolon)?;

        Ok(())
    }

    /// `'int' | 'char' | 'boolean' | className`
    fn compile_type(&mut self) -> JackResult<SmolStr> {
        match self.stream.peek_kind() {
            Some(TokenKind::Keyword(keyword)) if keyword.is_primitive_type() => {
                self.stream.advance();
                Ok(SmolStr::from(keyword.as_str()))
            }
            Some(TokenKind::Ident) => Ok(self.stream.consume_ident()?.text),
            _ => Err(self.stream.unexpected("type")),
        }
    }

    /// `('constructor' | 'function' | 'method') ('void' | type) subroutineName
    /// '(' parameterList ')' '{' varDec* statements '}'`
    fn compile_subroutine(&mut self, kind: SubroutineKind) -> JackResult<()> {
        self.stream.advance(); // constructor, function or method

        self.symbols.reset_subroutine_scope();
        self.markers.clear();
        self.if_count = 0;
        self.while_count = 0;

        self.returns_void = if self.stream.check_keyword(Keyword::Void) {
            self.stream.advance();
            true
        } else {
            self.compile_type()?;
            false
        };

        let name = self.stream.consume_ident()?;
        let qualified = self.qualify(&name.text);
        debug!("compiling {:?} {}", kind, qualified);

        if kind == SubroutineKind::Method {
            self.define(&name, RECEIVER.into(), self.class_name.clone(), Kind::Argument)?;
        }

        self.stream.consume_symbol(Symbol::LeftParen)?;
        self.compile_parameter_list()?;
        self.stream.consume_symbol(Symbol::RightParen)?;

        self.stream.consume_symbol(Symbol::LeftBrace)?;
        while self.stream.check_keyword(Keyword::Var) {
            self.compile_var_dec()?;
        }

        let n_locals = self.symbols.count(Kind::Local);
        self.emit(Instruction::Function(qualified, n_locals))?;

        match kind {
            SubroutineKind::Method => {
                self.emit(Instruction::Push(Segment::Argument, 0))?;
                self.emit(Instruction::Pop(Segment::Pointer, 0))?;
            }
            SubroutineKind::Constructor => {
                let n_fields = self.symbols.count(Kind::Field);
                self.emit(Instruction::push_constant(n_fields))?;
                self.emit(Instruction::Call(MEMORY_ALLOC.into(), 1))?;
                self.emit(Instruction::Pop(Segment::Pointer, 0))?;
            }
            SubroutineKind::Function => {}
        }

        self.compile_statements()?;
        self.stream.consume_symbol(Symbol::RightBrace)?;

        Ok(())
    }

    /// `((type varName) (',' type varName)*)?`
    fn compile_parameter_list(&mut self) -> JackResult<()> {
        if self.stream.check_symbol(Symbol::RightParen) {
            return Ok(());
        }

        loop {
            let ty = self.compile_type()?;
            let name = self.stream.consume_ident()?;
            self.define(&name, name.text.clone(), ty, Kind::Argument)?;

            if !self.stream.match_symbol(Symbol::Comma) {
                break;
            }
        }

        Ok(())
    }
}

/// Emission helpers.
impl<'a, S: InstructionSink> Compiler<'a, S> {
    fn emit(&mut self, instr: Instruction) -> JackResult<()> {
        emit_trace(&instr);
        self.sink.write(instr)
    }

    fn qualify(&self, name: &str) -> SmolStr {
        qualified_name(&self.class_name, name)
    }

    /// Resolve a variable, or fail with an error pointing at its token.
    fn resolve(&self, name: &Token) -> JackResult<SymbolEntry> {
        self.symbols.lookup(&name.text).cloned().ok_or_else(|| {
            let message = format!("undeclared variable '{}'", name.text);
            JackError::Resolution(self.stream.diagnostic(name, message))
        })
    }

    fn push_variable(&mut self, entry: &SymbolEntry) -> JackResult<()> {
        self.emit(Instruction::Push(entry.kind.segment(), entry.index))
    }

    fn pop_variable(&mut self, entry: &SymbolEntry) -> JackResult<()> {
        self.emit(Instruction::Pop(entry.kind.segment(), entry.index))
    }

    /// Define a variable, failing at `at` when its segment is full.
    fn define(&mut self, at: &Token, name: SmolStr, ty: SmolStr, kind: Kind) -> JackResult<()> {
        match self.symbols.define(name, ty, kind) {
            Some(_) => Ok(()),
            None => {
                let message = format!("too many {} variables, maximum is {}", kind, u16::MAX);
                Err(JackError::Syntax(self.stream.diagnostic(at, message)))
            }
        }
    }

    fn next_if_label(&mut self) -> JackResult<u16> {
        let n = self.if_count;
        match n.checked_add(1) {
            Some(next) => self.if_count = next,
            None => return Err(self.limit_exceeded(JackError::Syntax, "too many if statements in subroutine")),
        }
        Ok(n)
    }

    fn next_while_label(&mut self) -> JackResult<u16> {
        let n = self.while_count;
        match n.checked_add(1) {
            Some(next) => self.while_count = next,
            None => return Err(self.limit_exceeded(JackError::Syntax, "too many while statements in subroutine")),
        }
        Ok(n)
    }

    /// Run a recursive production one level deeper.
    fn nested<F>(&mut self, f: F) -> JackResult<()>
    where
        F: FnOnce(&mut Self) -> JackResult<()>,
    {
        if self.depth >= MAX_NESTING_DEPTH {
            let message = format!("nesting is deeper than {} levels", MAX_NESTING_DEPTH);
            return Err(self.limit_exceeded(JackError::Structural, message));
        }

        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Error for source that goes past one of the compiler's limits,
    /// pointing at the current token.
    #[inline(never)]
    #[cold]
    fn limit_exceeded(&mut self, error: fn(Diagnostic) -> JackError, message: impl ToString) -> JackError {
        let next = self.stream.peek().cloned();
        match next.or_else(|| self.stream.previous_token().cloned()) {
            Some(token) => error(self.stream.diagnostic(&token, message)),
            None => self.stream.unexpected(message.to_string()),
        }
    }
}

#[inline]
pub fn qualified_name(class_name: &str, subroutine_name: &str) -> SmolStr {
    SmolStr::from(format!("{}.{}", class_name, subroutine_name))
}

#[cfg(feature = "emit_trace")]
#[inline]
fn emit_trace(instr: &Instruction) {
    log::trace!("emit {}", instr);
}

#[cfg(not(feature = "emit_trace"))]
#[inline]
fn emit_trace(_: &Instruction) {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lex::Lexer;

    fn compile_with(source: &str, operator_order: OperatorOrder) -> JackResult<Vec<String>> {
        let stream = TokenStream::new(Lexer::new(source)?);
        let conf = CompilerConf { operator_order };
        let mut compiler = Compiler::new(stream, Vec::new(), conf);
        compiler.compile()?;
        Ok(compiler.into_sink().iter().map(|instr| instr.to_string()).collect())
    }

    fn compile(source: &str) -> Vec<String> {
        compile_with(source, OperatorOrder::LeftToRight).unwrap()
    }

    /// Compile a function body of `Main.f` with the given locals.
    fn body(decls: &str, statements: &str, operator_order: OperatorOrder) -> Vec<String> {
        let source = format!("class Main {{ function void f() {{ {decls} {statements} return; }} }}");
        let mut lines = compile_with(&source, operator_order).unwrap();
        // Header, and the trailing void return.
        lines.remove(0);
        lines.truncate(lines.len() - 2);
        lines
    }

    #[test]
    fn test_let_add() {
        assert_eq!(
            body("var int x;", "let x = 1 + 2;", OperatorOrder::LeftToRight),
            vec!["push constant 1", "push constant 2", "add", "pop local 0"]
        );
    }

    #[test]
    fn test_void_method_empty_body() {
        assert_eq!(
            compile("class Point { method void noop() { return; } }"),
            vec![
                "function Point.noop 0",
                "push argument 0",
                "pop pointer 0",
                "push constant 0",
                "return",
            ]
        );
    }

    #[test]
    fn test_method_parameters_start_at_one() {
        let lines = compile("class P { method int get(int a, int b) { return b; } }");
        assert_eq!(lines[3], "push argument 2");
    }

    #[test]
    fn test_constructor_allocates_fields() {
        assert_eq!(
            compile(
                "class Point { field int x, y; static int count; \
                 constructor Point new(int ax) { let x = ax; return this; } }"
            ),
            vec![
                "function Point.new 0",
                "push constant 2",
                "call Memory.alloc 1",
                "pop pointer 0",
                "push argument 0",
                "pop this 0",
                "push pointer 0",
                "return",
            ]
        );
    }

    #[test]
    fn test_subtraction_chain_left_to_right() {
        assert_eq!(
            body("var int x;", "let x = 10 - 4 - 3;", OperatorOrder::LeftToRight),
            vec![
                "push constant 10",
                "push constant 4",
                "sub",
                "push constant 3",
                "sub",
                "pop local 0",
            ]
        );
    }

    #[test]
    fn test_subtraction_chain_deferred() {
        assert_eq!(
            body("var int x;", "let x = 10 - 4 - 3;", OperatorOrder::Deferred),
            vec![
                "push constant 10",
                "push constant 4",
                "push constant 3",
                "sub",
                "sub",
                "pop local 0",
            ]
        );
    }

    #[test]
    fn test_unary_binds_to_term() {
        assert_eq!(
            body("var int x, y;", "let x = -x + y;", OperatorOrder::LeftToRight),
            vec!["push local 0", "neg", "push local 1", "add", "pop local 0"]
        );
        assert_eq!(
            body("var int x, y;", "let x = -x + y;", OperatorOrder::Deferred),
            vec!["push local 0", "push local 1", "add", "neg", "pop local 0"]
        );
    }

    #[test]
    fn test_parentheses_group_in_both_orders() {
        for order in [OperatorOrder::LeftToRight, OperatorOrder::Deferred] {
            assert_eq!(
                body("var int x;", "let x = 10 - (4 - 3);", order),
                vec![
                    "push constant 10",
                    "push constant 4",
                    "push constant 3",
                    "sub",
                    "sub",
                    "pop local 0",
                ]
            );
        }
    }

    #[test]
    fn test_marker_stack_balanced() {
        let source = "class Main { function int f(int a) { \
                      var Array b; let b[a + 1] = b[(a * 2)] - f(a, -a); return ~(a = 0); } }";
        let stream = TokenStream::new(Lexer::new(source).unwrap());
        let mut compiler = Compiler::new(stream, Vec::new(), CompilerConf::default());
        compiler.compile().unwrap();
        assert!(compiler.markers.is_empty());
    }

    #[test]
    fn test_trailing_tokens() {
        let err = compile_with("class A { } class B { }", OperatorOrder::LeftToRight).unwrap_err();
        assert!(matches!(err, JackError::Syntax(_)));
    }
}
