//! Source clean up before tokenizing.

/// Remove comments and blank lines.
///
/// Block comments `/* */` (including `/** */` doc comments) and line
/// comments `//` are removed. Comment markers inside string literals are
/// left alone. A block comment without a closing `*/` is kept as is, and
/// will fail later as unexpected tokens.
pub fn strip_comments(source: &str) -> String {
    let bytes = source.as_bytes();
    let mut code = String::with_capacity(source.len());
    let mut cursor = 0;
    let mut start = 0;
    let mut in_string = false;

    while cursor < bytes.len() {
        match (in_string, bytes[cursor], bytes.get(cursor + 1)) {
            (_, b'"', _) => {
                in_string = !in_string;
                cursor += 1;
            }
            (false, b'/', Some(b'/')) => {
                code.push_str(&source[start..cursor]);
                cursor = source[cursor..].find('\n').map(|i| cursor + i).unwrap_or(source.len());
                start = cursor;
            }
            (false, b'/', Some(b'*')) => match source[cursor + 2..].find("*/") {
                Some(i) => {
                    code.push_str(&source[start..cursor]);
                    cursor += 2 + i + 2;
                    start = cursor;
                }
                None => break,
            },
            // A string can't span lines, recover at the line end.
            (true, b'\n', _) => {
                in_string = false;
                cursor += 1;
            }
            _ => cursor += 1,
        }
    }
    code.push_str(&source[start..]);

    let mut clean = String::with_capacity(code.len());
    for line in code.lines().filter(|line| !line.trim().is_empty()) {
        clean.push_str(line);
        clean.push('\n');
    }
    clean
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_line_comments() {
        let source = "// header\nclass Main { // open\n}\n";
        assert_eq!(strip_comments(source), "class Main { \n}\n");
    }

    #[test]
    fn test_block_comments() {
        let source = "/** Doc\n * comment\n */\nclass /* inline */ Main {\n}";
        assert_eq!(strip_comments(source), "class  Main {\n}\n");
    }

    #[test]
    fn test_comment_markers_in_string() {
        let source = "do Output.printString(\"http://x /* y */\"); // done";
        assert_eq!(
            strip_comments(source),
            "do Output.printString(\"http://x /* y */\"); \n"
        );
    }

    #[test]
    fn test_blank_lines_removed() {
        let source = "class A {\n\n   \n\t\n}\r\n";
        assert_eq!(strip_comments(source), "class A {\n}\n");
    }

    #[test]
    fn test_unterminated_block_comment_kept() {
        let source = "class A { /* open\n}";
        assert_eq!(strip_comments(source), "class A { /* open\n}\n");
    }
}
