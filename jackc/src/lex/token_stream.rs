//! Peekable token stream.
use std::{fmt, iter::Peekable};

use crate::error::{Diagnostic, JackError, JackResult};

use super::{Keyword, Lexer, Span, Symbol, Token, TokenKind};

/// Forward-only stream of tokens with one token of look ahead.
///
/// Tokens are lazily lexed. Peeking or consuming the next token
/// triggers the internal lexer. There is no rewind.
pub struct TokenStream<'a> {
    lexer: Peekable<Lexer<'a>>,
    /// Keep reference to the source so the parser can
    /// build errors pointing into it.
    original: &'a str,
    /// A copy of the last token consumed.
    /// This can be used to build errors that refer
    /// to the end of the previous token's span.
    prev: Option<Token>,
}

impl<'a> TokenStream<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self {
            original: lexer.source_code(),
            lexer: lexer.peekable(),
            prev: None,
        }
    }

    pub fn previous_token(&self) -> Option<&Token> {
        self.prev.as_ref()
    }

    /// Indicates whether there is a current token.
    #[inline]
    pub fn has_more(&mut self) -> bool {
        self.lexer.peek().is_some()
    }

    /// Return the current token without advancing the cursor.
    ///
    /// Returns `None` when lexing is done.
    #[inline]
    pub fn peek(&mut self) -> Option<&Token> {
        self.lexer.peek()
    }

    /// Return the current token kind without advancing the cursor.
    #[inline]
    pub fn peek_kind(&mut self) -> Option<TokenKind> {
        self.lexer.peek().map(|token| token.kind)
    }

    /// Discards the current token and exposes the next one.
    ///
    /// Returns the discarded token, or `None` when the cursor is
    /// at the end of the token stream.
    #[inline]
    pub fn advance(&mut self) -> Option<Token> {
        let token = self.lexer.next();
        if token.is_some() {
            self.prev = token.clone();
        }
        token
    }

    /// Tests the current token against a symbol without consuming it.
    pub fn check_symbol(&mut self, symbol: Symbol) -> bool {
        self.peek_kind() == Some(TokenKind::Symbol(symbol))
    }

    /// Tests the current token against a keyword without consuming it.
    pub fn check_keyword(&mut self, keyword: Keyword) -> bool {
        self.peek_kind() == Some(TokenKind::Keyword(keyword))
    }

    /// Consumes the current token if it is the given symbol.
    ///
    /// Returns true when matched. Does not consume the token if
    /// it doesn't match, or the token stream is at the end.
    pub fn match_symbol(&mut self, symbol: Symbol) -> bool {
        let is_match = self.check_symbol(symbol);
        if is_match {
            let _ = self.advance(); // discard
        }
        is_match
    }

    /// Return the current token and advance the cursor.
    ///
    /// The consumed token must match the given token kind, otherwise a
    /// syntax error is returned. The cursor is not advanced if the token
    /// kind does not match.
    pub fn consume(&mut self, token_kind: TokenKind) -> JackResult<Token> {
        if self.peek_kind() == Some(token_kind) {
            if let Some(token) = self.advance() {
                return Ok(token);
            }
        }

        Err(self.unexpected(token_kind))
    }

    #[inline]
    pub fn consume_symbol(&mut self, symbol: Symbol) -> JackResult<Token> {
        self.consume(TokenKind::Symbol(symbol))
    }

    #[inline]
    pub fn consume_keyword(&mut self, keyword: Keyword) -> JackResult<Token> {
        self.consume(TokenKind::Keyword(keyword))
    }

    /// Consume an identifier, any identifier.
    #[inline]
    pub fn consume_ident(&mut self) -> JackResult<Token> {
        self.consume(TokenKind::Ident)
    }

    /// Builds a syntax error for the current token, or for the end of
    /// the source if the stream is exhausted.
    #[inline(never)]
    #[cold]
    pub fn unexpected(&mut self, expected: impl fmt::Display) -> JackError {
        let diagnostic = match self.lexer.peek() {
            Some(token) => Diagnostic::new(
                self.original,
                token.span,
                format!("encountered unexpected {}, expected {}", describe(token), expected),
            ),
            None => {
                let end = self.prev.as_ref().map(|token| token.span.end()).unwrap_or_default();
                Diagnostic::new(
                    self.original,
                    Span::new(end, 0),
                    format!("unexpected end of source, expected {}", expected),
                )
            }
        };

        JackError::Syntax(diagnostic)
    }

    /// Build a diagnostic anchored at the given token.
    pub fn diagnostic(&self, token: &Token, message: impl ToString) -> Diagnostic {
        Diagnostic::new(self.original, token.span, message)
    }
}

/// Keywords and symbols already quote their text when displayed.
fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::Keyword(_) | TokenKind::Symbol(_) => token.kind.to_string(),
        _ => format!("{} '{}'", token.kind, token.value()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn stream(source: &str) -> TokenStream {
        TokenStream::new(Lexer::new(source).unwrap())
    }

    #[test]
    fn test_advance_and_has_more() {
        let mut tokens = stream("do f();");
        let mut count = 0;
        while tokens.has_more() {
            tokens.advance();
            count += 1;
        }
        assert_eq!(count, 5);
        assert_eq!(tokens.previous_token().map(|t| t.text.as_str()), Some(";"));
        assert!(tokens.advance().is_none());
    }

    #[test]
    fn test_consume_mismatch_does_not_advance() {
        let mut tokens = stream("let x");
        let err = tokens.consume_keyword(Keyword::Do).unwrap_err();
        assert!(matches!(err, JackError::Syntax(_)));
        assert!(tokens.consume_keyword(Keyword::Let).is_ok());
        assert_eq!(tokens.consume_ident().unwrap().text, "x");
    }

    #[test]
    fn test_consume_ident_rejects_keyword() {
        let mut tokens = stream("this");
        let err = tokens.consume_ident().unwrap_err();
        let diag = err.diagnostic().unwrap();
        assert_eq!(diag.column, 1);
        assert!(diag.message.contains("expected identifier"), "{}", diag.message);
    }

    #[test]
    fn test_end_of_source() {
        let mut tokens = stream("return");
        tokens.advance();
        let err = tokens.consume_symbol(Symbol::Semicolon).unwrap_err();
        let diag = err.diagnostic().unwrap();
        assert_eq!(diag.column, 7);
        assert!(diag.message.starts_with("unexpected end of source"));
    }

    #[test]
    fn test_match_symbol() {
        let mut tokens = stream(",x");
        assert!(!tokens.match_symbol(Symbol::Semicolon));
        assert!(tokens.match_symbol(Symbol::Comma));
        assert_eq!(tokens.peek_kind(), Some(TokenKind::Ident));
    }
}
