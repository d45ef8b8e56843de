//! Lexer
//!
//! Turns policy source text into a token stream. Whitespace and comments
//! (`#` or `//` up to the end of the line) are dropped. The stream always
//! ends with an `Eof` token.

use crate::error::{LexError, LexErrorKind};
use crate::token::{Position, Token, TokenKind};

/// Single-pass lexer over a source string
pub struct Lexer<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    index: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().collect(),
            index: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize a whole source string
    pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
        Lexer::new(source).run()
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let position = self.position();
            let Some(c) = self.peek() else {
                tokens.push(Token::new(TokenKind::Eof, "", position));
                return Ok(tokens);
            };

            let token = match c {
                c if c.is_ascii_alphabetic() || c == '_' => self.lex_word(position),
                c if c.is_ascii_digit() => self.lex_number(position)?,
                '"' => self.lex_string(position)?,
                '-' => match self.peek_at(1) {
                    Some('>') => self.lex_fixed(TokenKind::Arrow, 2, position),
                    Some(d) if d.is_ascii_digit() => self.lex_number(position)?,
                    _ => return Err(self.error(LexErrorKind::UnexpectedCharacter('-'), position)),
                },
                '=' => match self.peek_at(1) {
                    Some('=') => self.lex_fixed(TokenKind::EqEq, 2, position),
                    _ => return Err(self.error(LexErrorKind::UnexpectedCharacter('='), position)),
                },
                '!' => match self.peek_at(1) {
                    Some('=') => self.lex_fixed(TokenKind::NotEq, 2, position),
                    _ => return Err(self.error(LexErrorKind::UnexpectedCharacter('!'), position)),
                },
                '>' => match self.peek_at(1) {
                    Some('=') => self.lex_fixed(TokenKind::Ge, 2, position),
                    _ => self.lex_fixed(TokenKind::Gt, 1, position),
                },
                '<' => match self.peek_at(1) {
                    Some('=') => self.lex_fixed(TokenKind::Le, 2, position),
                    _ => self.lex_fixed(TokenKind::Lt, 1, position),
                },
                '{' => self.lex_fixed(TokenKind::LBrace, 1, position),
                '}' => self.lex_fixed(TokenKind::RBrace, 1, position),
                '(' => self.lex_fixed(TokenKind::LParen, 1, position),
                ')' => self.lex_fixed(TokenKind::RParen, 1, position),
                '[' => self.lex_fixed(TokenKind::LBracket, 1, position),
                ']' => self.lex_fixed(TokenKind::RBracket, 1, position),
                ':' => self.lex_fixed(TokenKind::Colon, 1, position),
                ';' => self.lex_fixed(TokenKind::Semicolon, 1, position),
                ',' => self.lex_fixed(TokenKind::Comma, 1, position),
                other => return Err(self.error(LexErrorKind::UnexpectedCharacter(other), position)),
            };
            tokens.push(token);
        }
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.index + ahead).map(|(_, c)| *c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.index)
            .map(|(offset, _)| *offset)
            .unwrap_or(self.source.len())
    }

    fn position(&self) -> Position {
        Position::new(self.offset(), self.line, self.column)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.index += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, kind: LexErrorKind, position: Position) -> LexError {
        LexError { kind, position }
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else if c == '#' || (c == '/' && self.peek_at(1) == Some('/')) {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn slice_from(&self, start: Position) -> &'a str {
        &self.source[start.offset..self.offset()]
    }

    fn lex_fixed(&mut self, kind: TokenKind, len: usize, position: Position) -> Token {
        for _ in 0..len {
            self.advance();
        }
        Token::new(kind, self.slice_from(position), position)
    }

    fn lex_word(&mut self, position: Position) -> Token {
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                self.advance();
            } else {
                break;
            }
        }
        let text = self.slice_from(position);
        let kind = TokenKind::keyword(text).unwrap_or(TokenKind::Ident);
        Token::new(kind, text, position)
    }

    fn lex_number(&mut self, position: Position) -> Result<Token, LexError> {
        if self.peek() == Some('-') {
            self.advance();
        }
        self.consume_digits();
        if self.peek() == Some('.') {
            self.advance();
            if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                return Err(self.invalid_number(position));
            }
            self.consume_digits();
        }
        // Reject things like `12abc` or `1.2.3`
        if self
            .peek()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '.')
        {
            return Err(self.invalid_number(position));
        }
        Ok(Token::new(
            TokenKind::Number,
            self.slice_from(position),
            position,
        ))
    }

    fn consume_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn invalid_number(&mut self, position: Position) -> LexError {
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        {
            self.advance();
        }
        let text = self.slice_from(position).to_string();
        self.error(LexErrorKind::InvalidNumber(text), position)
    }

    fn lex_string(&mut self, position: Position) -> Result<Token, LexError> {
        self.advance(); // opening quote
        let mut text = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(self.error(LexErrorKind::UnterminatedString, position));
                }
                Some('"') => {
                    self.advance();
                    return Ok(Token::new(TokenKind::String, text, position));
                }
                Some('\\') => {
                    let escape_position = self.position();
                    self.advance();
                    let escaped = match self.advance() {
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some(other) => {
                            return Err(
                                self.error(LexErrorKind::InvalidEscape(other), escape_position)
                            );
                        }
                        None => {
                            return Err(self.error(LexErrorKind::UnterminatedString, position));
                        }
                    };
                    text.push(escaped);
                }
                Some(c) => {
                    self.advance();
                    text.push(c);
                }
            }
        }
    }
}
