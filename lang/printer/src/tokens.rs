//! Token constants shared by all `Print` implementations.

// Punctuation
pub const COMMA: &str = ",";
pub const DOT: &str = ".";
pub const COLON: &str = ":";
pub const SEMICOLON: &str = ";";
pub const EQUALS: &str = "=";
pub const UNDERSCORE: &str = "_";
pub const PIPE: &str = "|";
pub const AT: &str = "@";
pub const SLASH: &str = "/";
pub const ARROW: &str = "->";
pub const FAT_ARROW: &str = "=>";
pub const TICK: &str = "'";

// Tide type keywords
pub const INT: &str = "Int";
pub const BOOL: &str = "Bool";
pub const UNIT: &str = "Unit";
pub const DOUBLE: &str = "Double";
pub const STRING: &str = "String";
pub const BOTTOM: &str = "Nothing";

// SML keywords
pub const FUN: &str = "fun";
pub const VAL: &str = "val";
pub const FN: &str = "fn";
pub const DATATYPE: &str = "datatype";
pub const OF: &str = "of";
pub const LET: &str = "let";
pub const IN: &str = "in";
pub const END: &str = "end";
pub const IF: &str = "if";
pub const THEN: &str = "then";
pub const ELSE: &str = "else";
pub const CASE: &str = "case";
pub const REF: &str = "ref";
pub const BANG: &str = "!";
pub const ASSIGN: &str = ":=";
pub const RAISE: &str = "raise";
pub const TILDE: &str = "~";
