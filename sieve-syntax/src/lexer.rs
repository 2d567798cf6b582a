use crate::{ComparisonOp, ParseError, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Number,
    Word,
    Op(ComparisonOp),
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Minus,
    Slash,
    Colon,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Span,
}

impl Token<'_> {
    pub fn is_word(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Word && self.text.eq_ignore_ascii_case(keyword)
    }
}

/// Per-family lexing switches. Dates use `-` and `/` as separators, so only
/// the number and location grammars fold a leading minus into the literal.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LexRules {
    pub signed_numbers: bool,
    pub decimals: bool,
}

pub(crate) const NUMBER_RULES: LexRules = LexRules {
    signed_numbers: true,
    decimals: true,
};

pub(crate) const DATE_RULES: LexRules = LexRules {
    signed_numbers: false,
    decimals: false,
};

pub(crate) const LOCATION_RULES: LexRules = LexRules {
    signed_numbers: true,
    decimals: true,
};

pub(crate) fn tokenize(input: &str, rules: LexRules) -> Result<Vec<Token<'_>>, ParseError> {
    Lexer {
        input,
        pos: 0,
        rules,
    }
    .run()
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    rules: LexRules,
}

impl<'a> Lexer<'a> {
    fn run(mut self) -> Result<Vec<Token<'a>>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_ws();
            let Some(ch) = self.peek_char() else {
                return Ok(tokens);
            };
            let start = self.pos;

            if self.starts_number() {
                self.lex_number()?;
                tokens.push(self.token(TokenKind::Number, start));
                continue;
            }

            let kind = match ch {
                c if c.is_ascii_alphabetic() => {
                    while matches!(self.peek_char(), Some(c) if c.is_ascii_alphabetic()) {
                        self.advance_char();
                    }
                    tokens.push(self.token(TokenKind::Word, start));
                    continue;
                }
                '<' => {
                    self.advance_char();
                    match self.peek_char() {
                        Some('=') => {
                            self.advance_char();
                            TokenKind::Op(ComparisonOp::Lte)
                        }
                        Some('>') => {
                            self.advance_char();
                            TokenKind::Op(ComparisonOp::Ne)
                        }
                        _ => TokenKind::Op(ComparisonOp::Lt),
                    }
                }
                '>' => {
                    self.advance_char();
                    if self.peek_char() == Some('=') {
                        self.advance_char();
                        TokenKind::Op(ComparisonOp::Gte)
                    } else {
                        TokenKind::Op(ComparisonOp::Gt)
                    }
                }
                '!' => {
                    self.advance_char();
                    if self.peek_char() != Some('=') {
                        return Err(self.error("expected '=' after '!'"));
                    }
                    self.advance_char();
                    TokenKind::Op(ComparisonOp::Ne)
                }
                '=' => self.single(TokenKind::Op(ComparisonOp::Eq)),
                '[' => self.single(TokenKind::LBracket),
                ']' => self.single(TokenKind::RBracket),
                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                ',' => self.single(TokenKind::Comma),
                '-' => self.single(TokenKind::Minus),
                '/' => self.single(TokenKind::Slash),
                ':' => self.single(TokenKind::Colon),
                other => return Err(self.error(format!("unexpected character {other:?}"))),
            };
            tokens.push(self.token(kind, start));
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance_char();
        kind
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token<'a> {
        Token {
            kind,
            text: &self.input[start..self.pos],
            span: Span::new(start, self.pos),
        }
    }

    // A number starts with a digit, with `.digit` when decimals are allowed,
    // or with `-` directly followed by either of those.
    fn starts_number(&self) -> bool {
        let mut chars = self.remaining().chars();
        let mut first = chars.next();
        if self.rules.signed_numbers && first == Some('-') {
            first = chars.next();
        }
        match first {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') if self.rules.decimals => {
                matches!(chars.next(), Some(c) if c.is_ascii_digit())
            }
            _ => false,
        }
    }

    fn lex_number(&mut self) -> Result<(), ParseError> {
        if self.peek_char() == Some('-') {
            self.advance_char();
        }
        self.eat_digits();
        if self.rules.decimals && self.peek_char() == Some('.') {
            self.advance_char();
            if self.eat_digits() == 0 {
                return Err(self.error("expected digits after decimal point"));
            }
            if self.peek_char() == Some('.') {
                return Err(self.error("malformed decimal number"));
            }
        }
        Ok(())
    }

    fn eat_digits(&mut self) -> usize {
        let start = self.pos;
        while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
            self.advance_char();
        }
        self.pos - start
    }

    fn skip_ws(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.advance_char();
            } else {
                break;
            }
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance_char(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            position: self.pos,
        }
    }
}

/// Token stream walker shared by the three grammars.
pub(crate) struct Cursor<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    input_len: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str, rules: LexRules) -> Result<Self, ParseError> {
        Ok(Self {
            tokens: tokenize(input, rules)?,
            pos: 0,
            input_len: input.len(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn peek(&self) -> Option<Token<'a>> {
        self.peek_nth(0)
    }

    pub fn peek_nth(&self, n: usize) -> Option<Token<'a>> {
        self.tokens.get(self.pos + n).copied()
    }

    pub fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|token| token.kind)
    }

    pub fn peek_is_word(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(token) if token.is_word(keyword))
    }

    pub fn next(&mut self) -> Option<Token<'a>> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    pub fn eat(&mut self, kind: TokenKind) -> Option<Token<'a>> {
        if self.peek_kind() == Some(kind) {
            self.next()
        } else {
            None
        }
    }

    pub fn eat_word(&mut self, keyword: &str) -> Option<Token<'a>> {
        if self.peek_is_word(keyword) {
            self.next()
        } else {
            None
        }
    }

    pub fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token<'a>, ParseError> {
        self.eat(kind)
            .ok_or_else(|| self.error(format!("expected {what}")))
    }

    pub fn expect_word(&mut self, keyword: &str) -> Result<Token<'a>, ParseError> {
        self.eat_word(keyword)
            .ok_or_else(|| self.error(format!("expected '{keyword}'")))
    }

    pub fn expect_end(&self) -> Result<(), ParseError> {
        if self.eof() {
            Ok(())
        } else {
            Err(self.error("unexpected trailing input"))
        }
    }

    /// Span of the most recently consumed token.
    pub fn last_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|idx| self.tokens.get(idx))
            .map(|token| token.span)
            .unwrap_or(Span::new(0, 0))
    }

    pub fn error(&self, message: impl Into<String>) -> ParseError {
        let position = self
            .peek()
            .map(|token| token.span.start)
            .unwrap_or(self.input_len);
        ParseError {
            message: message.into(),
            position,
        }
    }
}
