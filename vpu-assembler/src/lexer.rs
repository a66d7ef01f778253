//! # Lexer for VPU Assembly
//!
//! Tokens are whitespace-separated. `;` comments run to end of line. `:`,
//! `,` and `=` are one-byte tokens. A leading `%` marks a macro directive,
//! `$` a label reference and `@` an address (relative) label reference.
//! Numbers are not classified here; they surface as [`Token::Raw`] and the
//! literal parser decides what they are.

use logos::Logos;

/// Tokens for VPU assembly
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")] // Skip whitespace (not newlines)
#[logos(skip r";[^\n]*")] // Skip comments
pub enum Token {
    /// Macro directive (`%include`, `%label`, ...), without the `%`
    #[regex(r"%[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice()[1..].to_string())]
    Macro(String),

    /// Label reference (`$name`), without the `$`
    #[regex(r"\$[a-zA-Z_.][a-zA-Z0-9_.]*", |lex| lex.slice()[1..].to_string())]
    LabelRef(String),

    /// Address label reference (`@name`), without the `@`
    #[regex(r"@[a-zA-Z_.][a-zA-Z0-9_.]*", |lex| lex.slice()[1..].to_string())]
    AddrLabelRef(String),

    /// String literal with escapes decoded to bytes
    #[regex(r#""(\\.|[^"\\\n])*""#, |lex| unescape(lex.slice()))]
    Str(Vec<u8>),

    /// Character literal; must decode to exactly one byte
    #[regex(r"'(\\.|[^'\\\n])*'", |lex| unescape_char(lex.slice()))]
    Char(u8),

    /// Colon (label definitions)
    #[token(":")]
    Colon,

    /// Comma (operand/enum separator)
    #[token(",")]
    Comma,

    /// Equals (`%enum` value assignment)
    #[token("=")]
    Eq,

    /// Newline (macro argument terminator)
    #[regex(r"\n")]
    Newline,

    /// Everything else: mnemonics, register names, numbers, label names
    #[regex(r#"[^ \t\r\n;:,=%$@'"][^ \t\r\n;:,=]*"#, |lex| lex.slice().to_string())]
    Raw(String),
}

/// Decode the escapes of a quoted string literal
fn unescape(slice: &str) -> Vec<u8> {
    decode_escapes(&slice.as_bytes()[1..slice.len() - 1])
}

/// Decode a quoted char literal; `None` unless it is exactly one byte
fn unescape_char(slice: &str) -> Option<u8> {
    let bytes = decode_escapes(&slice.as_bytes()[1..slice.len() - 1]);
    match bytes.as_slice() {
        [b] => Some(*b),
        _ => None,
    }
}

/// Escape processing: `\n`, `\t`, octal `\NNN` (up to 3 digits), hex `\xHH`;
/// any other escaped byte is taken verbatim.
fn decode_escapes(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i] != b'\\' || i + 1 == input.len() {
            out.push(input[i]);
            i += 1;
            continue;
        }
        i += 1;
        match input[i] {
            b'n' => {
                out.push(b'\n');
                i += 1;
            }
            b't' => {
                out.push(b'\t');
                i += 1;
            }
            b'x' => {
                let mut value = 0u8;
                let mut digits = 0;
                while digits < 2 {
                    match input.get(i + 1 + digits) {
                        Some(d) if d.is_ascii_hexdigit() => {
                            value = value << 4 | hex_digit(*d);
                            digits += 1;
                        }
                        _ => break,
                    }
                }
                out.push(value);
                i += 1 + digits;
            }
            d @ b'0'..=b'7' => {
                let mut value = (d - b'0') as u32;
                let mut digits = 1;
                while digits < 3 {
                    match input.get(i + digits) {
                        Some(d @ b'0'..=b'7') => {
                            value = value * 8 + (d - b'0') as u32;
                            digits += 1;
                        }
                        _ => break,
                    }
                }
                out.push(value as u8);
                i += digits;
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }
    out
}

fn hex_digit(d: u8) -> u8 {
    match d {
        b'0'..=b'9' => d - b'0',
        b'a'..=b'f' => d - b'a' + 10,
        _ => d - b'A' + 10,
    }
}

/// Source location of a token
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Loc {
    pub line: u32,
    pub column: u32,
}

/// Cursor over one source file, tracking line and column
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, Token>,
    line: u32,
    line_start: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            inner: Token::lexer(source),
            line: 1,
            line_start: 0,
        }
    }

    /// Next token with its location. A lexical error (unterminated string,
    /// malformed char literal, stray sigil) surfaces as `Err(())`.
    pub fn next(&mut self) -> Option<(std::result::Result<Token, ()>, Loc)> {
        let item = self.inner.next()?;
        let span = self.inner.span();
        let loc = Loc {
            line: self.line,
            column: (span.start - self.line_start + 1) as u32,
        };
        if matches!(item, Ok(Token::Newline)) {
            self.line += 1;
            self.line_start = span.end;
        }
        Some((item, loc))
    }

    /// Look at the next token without consuming it
    pub fn peek(&self) -> Option<std::result::Result<Token, ()>> {
        self.inner.clone().next()
    }

    /// Source slice of the last token (for error messages)
    pub fn slice(&self) -> &str {
        self.inner.slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        while let Some((token, _)) = lexer.next() {
            out.push(token.unwrap());
        }
        out
    }

    #[test]
    fn test_instruction_line() {
        assert_eq!(
            tokens("MOVV RA 5 ; load five"),
            vec![
                Token::Raw("MOVV".into()),
                Token::Raw("RA".into()),
                Token::Raw("5".into()),
            ]
        );
    }

    #[test]
    fn test_special_symbols() {
        assert_eq!(
            tokens("loop: %enum a = 1, b"),
            vec![
                Token::Raw("loop".into()),
                Token::Colon,
                Token::Macro("enum".into()),
                Token::Raw("a".into()),
                Token::Eq,
                Token::Raw("1".into()),
                Token::Comma,
                Token::Raw("b".into()),
            ]
        );
    }

    #[test]
    fn test_label_references() {
        assert_eq!(
            tokens("PUSH $size JMP @loop .loop:"),
            vec![
                Token::Raw("PUSH".into()),
                Token::LabelRef("size".into()),
                Token::Raw("JMP".into()),
                Token::AddrLabelRef("loop".into()),
                Token::Raw(".loop".into()),
                Token::Colon,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            tokens(r#""hi\n\t\0\x41\101\q""#),
            vec![Token::Str(b"hi\n\t\0AAq"[..].to_vec())]
        );
    }

    #[test]
    fn test_char_literals() {
        assert_eq!(tokens(r"'a' '\n' '\x00'"), vec![
            Token::Char(b'a'),
            Token::Char(b'\n'),
            Token::Char(0),
        ]);
    }

    #[test]
    fn test_char_literal_must_be_one_byte() {
        let mut lexer = Lexer::new("'ab'");
        assert!(matches!(lexer.next(), Some((Err(()), _))));
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        let mut lexer = Lexer::new("\"oops\nMOVV");
        assert!(matches!(lexer.next(), Some((Err(()), _))));
    }

    #[test]
    fn test_line_and_column_tracking() {
        let mut lexer = Lexer::new("NOP\n  HALT RC");
        let (_, loc) = lexer.next().unwrap();
        assert_eq!((loc.line, loc.column), (1, 1));
        lexer.next(); // newline
        let (_, loc) = lexer.next().unwrap();
        assert_eq!((loc.line, loc.column), (2, 3));
        let (_, loc) = lexer.next().unwrap();
        assert_eq!((loc.line, loc.column), (2, 8));
    }

    #[test]
    fn test_comment_runs_to_end_of_line() {
        assert_eq!(
            tokens("NOP ; JMP @loop\nRET"),
            vec![Token::Raw("NOP".into()), Token::Newline, Token::Raw("RET".into())]
        );
    }
}
