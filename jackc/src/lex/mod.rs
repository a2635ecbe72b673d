//! Jack source tokenizer.
mod lexer;
mod token_stream;
mod tokens;

use std::io;

pub use self::{
    lexer::{LexError, Lexer},
    token_stream::TokenStream,
    tokens::{Keyword, Span, Symbol, Token, TokenKind},
};

/// Tokenize a whole source file eagerly.
pub fn tokenize(source_code: &str) -> Result<Vec<Token>, LexError> {
    Ok(Lexer::new(source_code)?.collect())
}

/// Write the token listing as an XML document.
///
/// One element per token, named after the token category, with
/// the lexeme as text. String constants are written without
/// their quotes, and markup characters are escaped.
pub fn write_tokens_xml<W: io::Write>(w: &mut W, tokens: &[Token]) -> io::Result<()> {
    writeln!(w, "<tokens>")?;
    for token in tokens {
        let tag = token.kind.xml_tag();
        writeln!(w, "<{tag}> {} </{tag}>", escape_xml(token.value()))?;
    }
    writeln!(w, "</tokens>")
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tokens_xml() {
        let tokens = tokenize("if (a<b) { let s = \"x\"; }").unwrap();
        let mut buf = Vec::new();
        write_tokens_xml(&mut buf, &tokens).unwrap();
        let xml = String::from_utf8(buf).unwrap();

        let expected = "\
<tokens>
<keyword> if </keyword>
<symbol> ( </symbol>
<identifier> a </identifier>
<symbol> &lt; </symbol>
<identifier> b </identifier>
<symbol> ) </symbol>
<symbol> { </symbol>
<keyword> let </keyword>
<identifier> s </identifier>
<symbol> = </symbol>
<stringConstant> x </stringConstant>
<symbol> ; </symbol>
<symbol> } </symbol>
</tokens>
";
        assert_eq!(xml, expected);
    }
}
