//! Streaming tokenizer with one-character lookahead.

use crate::error::LexError;
use crate::token::{keyword, Token, TokenKind};

const SENTINEL: char = '\0';

/// Pulls tokens lazily from a source string, one `next_token()` call at a
/// time. The source is scanned as a `Vec<char>` with a trailing `\n`
/// appended, so a file missing a final newline still terminates its last
/// statement.
pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    cur: char,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let mut source: Vec<char> = input.chars().collect();
        source.push('\n');

        let cur = source.first().copied().unwrap_or(SENTINEL);
        Self {
            source,
            pos: 0,
            cur,
        }
    }

    fn advance(&mut self) {
        self.pos += 1;
        self.cur = self.source.get(self.pos).copied().unwrap_or(SENTINEL);
    }

    fn peek(&self) -> char {
        self.source.get(self.pos + 1).copied().unwrap_or(SENTINEL)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.cur, ' ' | '\t' | '\r') {
            self.advance();
        }
    }

    fn skip_comment(&mut self) {
        if self.cur == '#' {
            while self.cur != '\n' {
                self.advance();
            }
        }
    }

    /// Produces the next token, or the first lexical error encountered.
    ///
    /// Once the source is exhausted this returns `TokenKind::End`
    /// indefinitely rather than erroring.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        self.skip_comment();

        let token = match self.cur {
            '+' => Token::new("+", TokenKind::Plus),
            '-' => Token::new("-", TokenKind::Minus),
            '*' => Token::new("*", TokenKind::Asterisk),
            '/' => Token::new("/", TokenKind::Slash),
            '%' => Token::new("%", TokenKind::Modulo),
            ',' => Token::new(",", TokenKind::Comma),

            '!' => {
                if self.peek() == '=' {
                    self.advance();
                    Token::new("!=", TokenKind::Neq)
                } else {
                    return Err(LexError::MalformedNotEqual(self.peek()));
                }
            }
            '=' => {
                if self.peek() == '=' {
                    self.advance();
                    Token::new("==", TokenKind::EqEq)
                } else {
                    Token::new("=", TokenKind::Eq)
                }
            }
            '>' => {
                if self.peek() == '=' {
                    self.advance();
                    Token::new(">=", TokenKind::GtEq)
                } else {
                    Token::new(">", TokenKind::Gt)
                }
            }
            '<' => {
                if self.peek() == '=' {
                    self.advance();
                    Token::new("<=", TokenKind::LtEq)
                } else {
                    Token::new("<", TokenKind::Lt)
                }
            }

            '\n' => Token::new("\n", TokenKind::Newline),
            SENTINEL => Token::new("", TokenKind::End),

            '"' => {
                self.advance();
                let start = self.pos;
                while self.cur != '"' {
                    if matches!(self.cur, '\r' | '\t' | '\n') {
                        return Err(LexError::ForbiddenCharInString(self.cur));
                    }
                    self.advance();
                }
                let text: String = self.source[start..self.pos].iter().collect();
                Token::new(text, TokenKind::String)
            }

            c if c.is_ascii_digit() => {
                let start = self.pos;
                while self.peek().is_ascii_digit() {
                    self.advance();
                }
                if self.peek() == '.' {
                    self.advance();
                    if !self.peek().is_ascii_digit() {
                        return Err(LexError::MalformedNumber);
                    }
                    while self.peek().is_ascii_digit() {
                        self.advance();
                    }
                }
                let text: String = self.source[start..=self.pos].iter().collect();
                Token::new(text, TokenKind::Number)
            }

            c if c.is_ascii_alphabetic() => {
                let start = self.pos;
                while self.peek().is_ascii_alphanumeric() {
                    self.advance();
                }
                let text: String = self.source[start..=self.pos].iter().collect();
                let kind = keyword(&text).unwrap_or(TokenKind::Identifier);
                Token::new(text, kind)
            }

            other => return Err(LexError::UnknownCharacter(other)),
        };

        self.advance();
        Ok(token)
    }
}
