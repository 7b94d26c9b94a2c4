use super::error::ParseError;

// ── Token ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Identifier, possibly namespaced (`xformOp:translate`, `primvars:displayColor`).
    Ident(String),
    Str(String),
    /// Numeric literal; `integer` is false when a `.`, exponent, `inf` or `nan` was seen.
    Number { value: f64, integer: bool },
    /// `@path@` or `@@@path@@@`
    Asset(String),
    /// `</World/cube>`
    PathRef(String),
    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Equals,
    Comma,
    Colon,
    Semicolon,
    Dot,
    // Sentinel
    Eof,
}

/// A token with its 1-based source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
    pub col: usize,
}

// ── Lexer ─────────────────────────────────────────────────────────────────

pub struct Lexer<'s> {
    src: &'s str,
    pos: usize,
    line: usize,
    col: usize,
}

impl<'s> Lexer<'s> {
    pub fn new(src: &'s str) -> Self {
        Self { src, pos: 0, line: 1, col: 1 }
    }

    pub fn tokenize(mut self) -> Result<Vec<Spanned>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            let (line, col) = (self.line, self.col);
            let token = self.next_token()?;
            let eof = token == Token::Eof;
            tokens.push(Spanned { token, line, col });
            if eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn rest(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn advance_n(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn error(&self, msg: impl Into<String>) -> ParseError {
        ParseError::new(msg, self.line, self.col)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while matches!(self.peek(), Some(c) if c.is_whitespace()) {
                self.advance();
            }
            // `#` and `//` line comments (the `#usda 1.0` header is one too)
            if self.rest().starts_with('#') || self.rest().starts_with("//") {
                while !matches!(self.peek(), None | Some('\n')) {
                    self.advance();
                }
            } else if self.rest().starts_with("/*") {
                self.advance_n(2);
                loop {
                    if self.rest().starts_with("*/") {
                        self.advance_n(2);
                        break;
                    }
                    if self.advance().is_none() {
                        break; // unterminated, EOF surfaces on the next token
                    }
                }
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        let ch = match self.peek() {
            None => return Ok(Token::Eof),
            Some(c) => c,
        };

        match ch {
            '(' => { self.advance(); Ok(Token::LParen) }
            ')' => { self.advance(); Ok(Token::RParen) }
            '[' => { self.advance(); Ok(Token::LBracket) }
            ']' => { self.advance(); Ok(Token::RBracket) }
            '{' => { self.advance(); Ok(Token::LBrace) }
            '}' => { self.advance(); Ok(Token::RBrace) }
            '=' => { self.advance(); Ok(Token::Equals) }
            ',' => { self.advance(); Ok(Token::Comma) }
            ':' => { self.advance(); Ok(Token::Colon) }
            ';' => { self.advance(); Ok(Token::Semicolon) }
            '"' | '\'' => self.lex_string(ch),
            '@' => self.lex_asset(),
            '<' => self.lex_path_ref(),
            '.' if matches!(self.peek_second(), Some(c) if c.is_ascii_digit()) => self.lex_number(),
            '.' => { self.advance(); Ok(Token::Dot) }
            c if c.is_ascii_digit() || c == '-' || c == '+' => self.lex_number(),
            c if c.is_alphabetic() || c == '_' => Ok(self.lex_ident()),
            other => Err(self.error(format!("unexpected character {:?}", other))),
        }
    }

    fn lex_string(&mut self, quote: char) -> Result<Token, ParseError> {
        let triple: String = std::iter::repeat(quote).take(3).collect();
        let is_triple = self.rest().starts_with(&triple);
        if is_triple {
            self.advance_n(3);
        } else {
            self.advance();
        }

        let mut s = String::new();
        loop {
            if is_triple && self.rest().starts_with(&triple) {
                self.advance_n(3);
                break;
            }
            match self.advance() {
                None => return Err(self.error("unterminated string literal")),
                Some(c) if c == quote && !is_triple => break,
                Some('\n') if !is_triple => {
                    return Err(self.error("newline in single-quoted string literal"));
                }
                Some('\\') => match self.advance() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('"') => s.push('"'),
                    Some('\'') => s.push('\''),
                    Some('\\') => s.push('\\'),
                    Some(c) => s.push(c),
                    None => return Err(self.error("unterminated escape sequence")),
                },
                Some(c) => s.push(c),
            }
        }
        Ok(Token::Str(s))
    }

    fn lex_asset(&mut self) -> Result<Token, ParseError> {
        let delimiter = if self.rest().starts_with("@@@") { "@@@" } else { "@" };
        self.advance_n(delimiter.len());
        let start = self.pos;
        loop {
            if self.rest().starts_with(delimiter) {
                let asset = self.src[start..self.pos].to_string();
                self.advance_n(delimiter.len());
                return Ok(Token::Asset(asset));
            }
            match self.advance() {
                None | Some('\n') => return Err(self.error("unterminated asset path")),
                Some(_) => {}
            }
        }
    }

    fn lex_path_ref(&mut self) -> Result<Token, ParseError> {
        self.advance(); // consume `<`
        let start = self.pos;
        loop {
            match self.peek() {
                Some('>') => {
                    let path = self.src[start..self.pos].to_string();
                    self.advance();
                    return Ok(Token::PathRef(path));
                }
                None | Some('\n') => return Err(self.error("unterminated path reference")),
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    fn lex_number(&mut self) -> Result<Token, ParseError> {
        let start = self.pos;
        let mut integer = true;
        if matches!(self.peek(), Some('-') | Some('+')) {
            self.advance();
        }

        // -inf / inf / nan spelled as identifiers after a sign
        if self.rest().starts_with("inf") {
            self.advance_n(3);
            let negative = self.src[start..].starts_with('-');
            let value = if negative { f64::NEG_INFINITY } else { f64::INFINITY };
            return Ok(Token::Number { value, integer: false });
        }

        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') {
            integer = false;
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            integer = false;
            self.advance();
            if matches!(self.peek(), Some('-') | Some('+')) {
                self.advance();
            }
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }

        let s = &self.src[start..self.pos];
        s.parse::<f64>()
            .map(|value| Token::Number { value, integer })
            .map_err(|_| self.error(format!("invalid number {:?}", s)))
    }

    fn lex_ident(&mut self) -> Token {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.advance();
            // namespace separator, only when another identifier character follows
            if self.peek() == Some(':')
                && matches!(self.peek_second(), Some(c) if c.is_alphabetic() || c == '_')
            {
                self.advance();
            }
        }
        let word = &self.src[start..self.pos];
        match word {
            "inf" => Token::Number { value: f64::INFINITY, integer: false },
            "nan" => Token::Number { value: f64::NAN, integer: false },
            _ => Token::Ident(word.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "lexer_tests.rs"]
mod tests;
