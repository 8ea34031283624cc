//! Lexer for Lox source text.
//!
//! [`Scanner`] walks the source once, byte by byte, and yields owned
//! [`Token`]s through the `Iterator` interface.  A lexical error is yielded
//! in place of the offending character and scanning carries on afterwards,
//! so callers see every bad character in one pass.  The stream always ends
//! with exactly one `EOF` token and stays finished after that.
//!
//! | input                 | result                                   |
//! |-----------------------|------------------------------------------|
//! | `( ) { } , . - + ; *` | single-character punctuators             |
//! | `! != = == < <= > >=` | one- or two-character operators          |
//! | `// ...`              | skipped up to the newline                |
//! | `"..."`               | `STRING`, may span lines                 |
//! | `12`, `3.5`           | `NUMBER`; no leading or trailing `.`     |
//! | `name`, `while`       | `IDENTIFIER` or keyword                  |
//!
//! ```rust
//! use rox::scanner::Scanner;
//!
//! let (tokens, errors) = Scanner::scan_all("print 1 + 2;");
//! assert!(errors.is_empty());
//! assert_eq!(tokens.len(), 6);
//! ```

use std::iter::FusedIterator;

use log::{debug, info};
use memchr::memchr;
use phf::phf_map;

use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"for"    => TokenType::FOR,
    b"fun"    => TokenType::FUN,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

/// Streaming lexer over a borrowed source string.
pub struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    lexeme_start: usize,
    pos: usize,
    line: usize,
    finished: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        info!("Scanner created over {} bytes", text.len());

        Self {
            text,
            bytes: text.as_bytes(),
            lexeme_start: 0,
            pos: 0,
            line: 1,
            finished: false,
        }
    }

    /// Scan all of `text`, splitting tokens from lexical errors.  The token
    /// list always ends in `EOF`.
    pub fn scan_all(text: &'a str) -> (Vec<Token>, Vec<LoxError>) {
        let mut tokens: Vec<Token> = Vec::new();
        let mut errors: Vec<LoxError> = Vec::new();

        for item in Scanner::new(text) {
            match item {
                Ok(token) => tokens.push(token),
                Err(e) => errors.push(e),
            }
        }

        info!(
            "Scanned {} token(s) with {} error(s)",
            tokens.len(),
            errors.len()
        );

        (tokens, errors)
    }

    #[inline(always)]
    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Byte at `pos + offset`, or `0` past the end.
    #[inline(always)]
    fn byte_at(&self, offset: usize) -> u8 {
        self.bytes.get(self.pos + offset).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn bump(&mut self) -> u8 {
        let b: u8 = self.byte_at(0);
        self.pos += 1;
        b
    }

    #[inline(always)]
    fn eat(&mut self, expected: u8) -> bool {
        if !self.at_end() && self.byte_at(0) == expected {
            self.pos += 1;
            return true;
        }
        false
    }

    /// `with_eq` when the next byte is `=`, otherwise `plain`.
    fn either(&mut self, with_eq: TokenType, plain: TokenType) -> Option<TokenType> {
        if self.eat(b'=') {
            Some(with_eq)
        } else {
            Some(plain)
        }
    }

    /// Lex one lexeme starting at `lexeme_start`.  `Ok(None)` means the
    /// lexeme was whitespace or a comment.
    fn lex_one(&mut self) -> Result<Option<TokenType>> {
        let kind: Option<TokenType> = match self.bump() {
            b'(' => Some(TokenType::LEFT_PAREN),
            b')' => Some(TokenType::RIGHT_PAREN),
            b'{' => Some(TokenType::LEFT_BRACE),
            b'}' => Some(TokenType::RIGHT_BRACE),
            b',' => Some(TokenType::COMMA),
            b'.' => Some(TokenType::DOT),
            b'-' => Some(TokenType::MINUS),
            b'+' => Some(TokenType::PLUS),
            b';' => Some(TokenType::SEMICOLON),
            b'*' => Some(TokenType::STAR),

            b'!' => self.either(TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.either(TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.either(TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.either(TokenType::GREATER_EQUAL, TokenType::GREATER),

            b'/' if self.eat(b'/') => {
                self.pos = match memchr(b'\n', &self.bytes[self.pos..]) {
                    Some(offset) => self.pos + offset,
                    None => self.bytes.len(),
                };
                None
            }
            b'/' => Some(TokenType::SLASH),

            b' ' | b'\r' | b'\t' => None,

            b'\n' => {
                self.line += 1;
                None
            }

            b'"' => Some(self.string()?),

            b'0'..=b'9' => Some(self.number()),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => Some(self.identifier()),

            _ => return Err(self.unexpected()),
        };

        Ok(kind)
    }

    fn string(&mut self) -> Result<TokenType> {
        while !self.at_end() && self.byte_at(0) != b'"' {
            if self.bump() == b'\n' {
                self.line += 1;
            }
        }

        if self.at_end() {
            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        // closing quote
        self.pos += 1;

        let contents: &str = &self.text[self.lexeme_start + 1..self.pos - 1];
        Ok(TokenType::STRING(contents.to_owned()))
    }

    fn number(&mut self) -> TokenType {
        self.skip_digits();

        if self.byte_at(0) == b'.' && self.byte_at(1).is_ascii_digit() {
            self.pos += 1;
            self.skip_digits();
        }

        let digits: &str = &self.text[self.lexeme_start..self.pos];

        // Only ASCII digits with at most one interior dot reach here.
        TokenType::NUMBER(digits.parse::<f64>().unwrap_or_default())
    }

    fn skip_digits(&mut self) {
        while self.byte_at(0).is_ascii_digit() {
            self.pos += 1;
        }
    }

    fn identifier(&mut self) -> TokenType {
        while matches!(self.byte_at(0), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.pos += 1;
        }

        KEYWORDS
            .get(&self.bytes[self.lexeme_start..self.pos])
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }

    /// Report the character at `lexeme_start`, consuming any UTF-8
    /// continuation bytes so scanning resumes on a char boundary.
    fn unexpected(&mut self) -> LoxError {
        while self.byte_at(0) & 0b1100_0000 == 0b1000_0000 {
            self.pos += 1;
        }

        let ch: char = self.text[self.lexeme_start..self.pos]
            .chars()
            .next()
            .unwrap_or(char::REPLACEMENT_CHARACTER);

        LoxError::lex(self.line, format!("Unexpected character: {}", ch))
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        while !self.at_end() {
            self.lexeme_start = self.pos;

            match self.lex_one() {
                Err(e) => return Some(Err(e)),

                Ok(Some(kind)) => {
                    let lexeme: &str = &self.text[self.lexeme_start..self.pos];
                    debug!("Scanned {} on line {}", kind.name(), self.line);

                    return Some(Ok(Token::new(kind, lexeme, self.line)));
                }

                Ok(None) => {}
            }
        }

        self.finished = true;
        Some(Ok(Token::new(TokenType::EOF, "", self.line)))
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
