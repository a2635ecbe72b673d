//! Constant values of the Jack language and the target VM.

/// Largest integer literal the VM can push as a constant.
///
/// The target word is 16-bit, but `push constant` only encodes
/// 15 bits. Negative values are produced with `neg`.
pub const MAX_INT_CONSTANT: u16 = 0x7FFF; // 32767

/// Deepest nesting of terms and statement blocks the compiler accepts.
///
/// Both are compiled by recursion, so this bounds the stack use.
pub const MAX_NESTING_DEPTH: u16 = 256;

/// Source file extension.
pub const JACK_EXT: &str = "jack";

/// Output file extension.
pub const VM_EXT: &str = "vm";

/// Reserved words, in the order the tokenizer matches them.
pub const KEYWORDS: [&str; 21] = [
    "class",
    "constructor",
    "function",
    "method",
    "field",
    "static",
    "var",
    "int",
    "char",
    "boolean",
    "void",
    "true",
    "false",
    "null",
    "this",
    "let",
    "do",
    "if",
    "else",
    "while",
    "return",
];

/// Single character symbols.
///
/// Order matters: when a word has symbols glued to it, the first
/// entry of this list found in the word decides where it is split.
pub const SYMBOLS: [char; 19] = [
    '(', ')', '[', ']', '{', '}', ',', ';', '=', '.', '+', '-', '*', '/', '&', '|', '~', '<', '>',
];

// ----------------------------------------------------------------------------
// Operating system routines the compiler calls into.

pub const MATH_MULTIPLY: &str = "Math.multiply";
pub const MATH_DIVIDE: &str = "Math.divide";
pub const MEMORY_ALLOC: &str = "Memory.alloc";
pub const STRING_NEW: &str = "String.new";
pub const STRING_APPEND_CHAR: &str = "String.appendChar";

/// Name of the implicit receiver argument of a method.
pub const RECEIVER: &str = "this";
