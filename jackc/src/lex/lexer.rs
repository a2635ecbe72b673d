//! Lexical analysis
use log::trace;

use crate::constants::SYMBOLS;

use super::tokens::{Keyword, Span, Symbol, Token, TokenKind};

/// Tokenizer over whitespace delimited words.
///
/// The source is first cut into coarse words: runs of non-whitespace,
/// and double quoted string literals which are kept whole. Words are
/// classified lazily, and a word with symbols glued to it is split
/// into two fragments which are pushed back and classified in turn.
pub struct Lexer<'a> {
    /// Keep reference to the source so the parser can
    /// slice fragments from it.
    original: &'a str,
    /// Fragments waiting to be classified.
    ///
    /// Stack order, the last element is the next token's text.
    pending: Vec<Span>,
}

impl<'a> Lexer<'a> {
    /// Segment the source into words.
    ///
    /// # Errors
    ///
    /// Returns [`LexError::UnterminatedString`] when a double quote
    /// has no closing partner.
    pub fn new(source_code: &'a str) -> Result<Self, LexError> {
        let mut pending = split_words(source_code)?;
        pending.reverse();

        Ok(Self {
            original: source_code,
            pending,
        })
    }

    /// Original source code that was passed in during construction.
    pub fn source_code(&self) -> &'a str {
        self.original
    }

    /// Classify the next fragment and construct its token.
    ///
    /// Returns `None` when the source is exhausted.
    ///
    /// Classification precedence is fixed: keyword, integer constant,
    /// string constant, symbol. A fragment that contains a symbol but isn't
    /// one is split, and the pieces go through classification again.
    /// Whatever is left is an identifier.
    pub fn next_token(&mut self) -> Option<Token> {
        loop {
            let span = self.pending.pop()?;
            let text = span.fragment(self.original);

            if let Some(keyword) = Keyword::parse(text) {
                return Some(self.make_token(span, TokenKind::Keyword(keyword)));
            }

            if is_integer(text) {
                return Some(self.make_token(span, TokenKind::IntConst));
            }

            if is_string(text) {
                return Some(self.make_token(span, TokenKind::StringConst));
            }

            if let Some(symbol) = as_symbol(text) {
                return Some(self.make_token(span, TokenKind::Symbol(symbol)));
            }

            if let Some((head, tail)) = split_symbol(span, text) {
                trace!(
                    "split {:?} into {:?} {:?}",
                    text,
                    head.fragment(self.original),
                    tail.fragment(self.original)
                );
                // Head is consumed first.
                self.pending.push(tail);
                self.pending.push(head);
                continue;
            }

            return Some(self.make_token(span, TokenKind::Ident));
        }
    }

    fn make_token(&self, span: Span, kind: TokenKind) -> Token {
        Token {
            span,
            kind,
            text: span.fragment(self.original).into(),
        }
    }
}

/// Implement `Lexer` as an interator for consuming
/// tokens lazily.
impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Cut the source into whitespace separated words, keeping
/// string literals (including their quotes) as single words.
fn split_words(source: &str) -> Result<Vec<Span>, LexError> {
    let mut words = vec![];
    let mut cursor = 0;

    while let Some(open) = find_from(source, cursor, '"') {
        let close = match find_from(source, open + 1, '"') {
            Some(close) => close,
            None => {
                let (line, column) = Span::new(open as u32, 1).line_column(source);
                return Err(LexError::UnterminatedString { line, column });
            }
        };

        split_whitespace(source, cursor, open, &mut words);
        words.push(Span::new(open as u32, (close + 1 - open) as u32));
        cursor = close + 1;
    }

    split_whitespace(source, cursor, source.len(), &mut words);

    Ok(words)
}

/// Byte position of the first `needle` at or after `start`.
fn find_from(source: &str, start: usize, needle: char) -> Option<usize> {
    source[start..].find(needle).map(|i| start + i)
}

/// Push the spans of the whitespace separated runs in `source[start..end]`.
fn split_whitespace(source: &str, start: usize, end: usize, words: &mut Vec<Span>) {
    let mut word_start = None;

    for (i, c) in source[start..end].char_indices() {
        let i = start + i;
        match (c.is_whitespace(), word_start) {
            (true, Some(begin)) => {
                words.push(Span::new(begin as u32, (i - begin) as u32));
                word_start = None;
            }
            (false, None) => word_start = Some(i),
            _ => {}
        }
    }

    if let Some(begin) = word_start {
        words.push(Span::new(begin as u32, (end - begin) as u32));
    }
}

#[allow(clippy::manual_is_ascii_check)] // consistency with other functions
fn is_integer(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| matches!(c, '0'..='9'))
}

fn is_string(text: &str) -> bool {
    text.len() >= 2 && text.starts_with('"') && text.ends_with('"')
}

fn as_symbol(text: &str) -> Option<Symbol> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Symbol::parse(c),
        _ => None,
    }
}

/// Split a fragment at the first listed symbol it contains.
///
/// A symbol at the front or back is peeled off on its own. A symbol in
/// the middle cuts the fragment in front of the symbol, leaving it at the
/// start of the tail to be peeled off later.
fn split_symbol(span: Span, text: &str) -> Option<(Span, Span)> {
    let index = SYMBOLS.iter().find_map(|symbol| text.find(*symbol))? as u32;

    // Symbols are all single byte characters.
    let cut = if index == 0 { 1 } else { index };

    Some((span.slice(0, cut), span.slice(cut, span.size - cut)))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("{line}:{column}: unterminated string literal")]
    UnterminatedString { line: usize, column: usize },
}

#[cfg(test)]
mod test {
    use super::*;

    fn lex(source: &str) -> Vec<(TokenKind, String)> {
        Lexer::new(source)
            .unwrap()
            .map(|token| (token.kind, token.value().to_owned()))
            .collect()
    }

    #[test]
    fn test_glued_operator() {
        assert_eq!(
            lex("a+b"),
            vec![
                (TokenKind::Ident, "a".to_owned()),
                (TokenKind::Symbol(Symbol::Plus), "+".to_owned()),
                (TokenKind::Ident, "b".to_owned()),
            ]
        );
    }

    #[test]
    fn test_string_literal_is_not_split() {
        assert_eq!(lex("\"a+b\""), vec![(TokenKind::StringConst, "a+b".to_owned())]);
    }

    #[test]
    fn test_string_keeps_inner_whitespace() {
        let tokens = lex("do Output.printString(\"Hello, world; ok\");");
        let kinds = tokens.iter().map(|(kind, _)| *kind).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Keyword(Keyword::Do),
                TokenKind::Ident,
                TokenKind::Symbol(Symbol::Dot),
                TokenKind::Ident,
                TokenKind::Symbol(Symbol::LeftParen),
                TokenKind::StringConst,
                TokenKind::Symbol(Symbol::RightParen),
                TokenKind::Symbol(Symbol::Semicolon),
            ]
        );
        assert_eq!(tokens[5].1, "Hello, world; ok");
    }

    #[test]
    fn test_symbol_runs_keep_order() {
        let texts = lex("foo(a[i]));")
            .into_iter()
            .map(|(_, text)| text)
            .collect::<Vec<_>>();
        assert_eq!(texts, vec!["foo", "(", "a", "[", "i", "]", ")", ")", ";"]);
    }

    #[test]
    fn test_keyword_glued_to_symbol() {
        let tokens = lex("class Main{");
        assert_eq!(tokens[0].0, TokenKind::Keyword(Keyword::Class));
        assert_eq!(tokens[1].0, TokenKind::Ident);
        assert_eq!(tokens[2].0, TokenKind::Symbol(Symbol::LeftBrace));
    }

    #[test]
    fn test_integer_constant() {
        assert_eq!(
            lex("x=10;"),
            vec![
                (TokenKind::Ident, "x".to_owned()),
                (TokenKind::Symbol(Symbol::Eq), "=".to_owned()),
                (TokenKind::IntConst, "10".to_owned()),
                (TokenKind::Symbol(Symbol::Semicolon), ";".to_owned()),
            ]
        );
    }

    #[test]
    fn test_spans_point_into_source() {
        const CODE: &str = "let  x=\"hi\";";
        let lexer = Lexer::new(CODE).unwrap();
        for token in lexer {
            assert_eq!(token.span.fragment(CODE), token.text.as_str());
        }
    }

    #[test]
    fn test_unterminated_string() {
        let result = Lexer::new("let s = \"oops;\n");
        assert_eq!(
            result.err(),
            Some(LexError::UnterminatedString { line: 1, column: 9 })
        );
    }

    #[test]
    fn test_empty_source() {
        let mut lexer = Lexer::new("  \n\t ").unwrap();
        assert_eq!(lexer.next_token(), None);
    }
}
