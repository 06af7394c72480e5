use crate::error::Span;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Illegal,
    Eof,

    // Identifiers and literals
    Ident,
    Int,

    // Operators
    Assign,
    Plus,
    Minus,
    Bang,
    Asterisk,
    Slash,
    Lt,
    Gt,
    Eq,
    NotEq,

    // Delimiters
    Comma,
    Semicolon,
    LParen,
    RParen,
    LBrace,
    RBrace,

    // Keywords
    Function,
    Let,
    True,
    False,
    If,
    Else,
    Return,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Illegal => "ILLEGAL",
            TokenType::Eof => "EOF",
            TokenType::Ident => "IDENT",
            TokenType::Int => "INT",
            TokenType::Assign => "=",
            TokenType::Plus => "+",
            TokenType::Minus => "-",
            TokenType::Bang => "!",
            TokenType::Asterisk => "*",
            TokenType::Slash => "/",
            TokenType::Lt => "<",
            TokenType::Gt => ">",
            TokenType::Eq => "==",
            TokenType::NotEq => "!=",
            TokenType::Comma => ",",
            TokenType::Semicolon => ";",
            TokenType::LParen => "(",
            TokenType::RParen => ")",
            TokenType::LBrace => "{",
            TokenType::RBrace => "}",
            TokenType::Function => "FUNCTION",
            TokenType::Let => "LET",
            TokenType::True => "TRUE",
            TokenType::False => "FALSE",
            TokenType::If => "IF",
            TokenType::Else => "ELSE",
            TokenType::Return => "RETURN",
        }
    }

    fn keyword(ident: &str) -> Option<TokenType> {
        match ident {
            "fn" => Some(TokenType::Function),
            "let" => Some(TokenType::Let),
            "true" => Some(TokenType::True),
            "false" => Some(TokenType::False),
            "if" => Some(TokenType::If),
            "else" => Some(TokenType::Else),
            "return" => Some(TokenType::Return),
            _ => None,
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub literal: String,
    pub span: Span,
}

impl Token {
    pub fn new(token_type: TokenType, literal: impl Into<String>, span: Span) -> Self {
        Self {
            token_type,
            literal: literal.into(),
            span,
        }
    }
}

/// Single-pass scanner. Unknown characters become `ILLEGAL` tokens rather
/// than errors; the parser is the one that reports them.
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            tokens: Vec::new(),
        }
    }

    /// Scan the whole input. The result always ends with an `EOF` token.
    pub fn tokenize(mut self) -> Vec<Token> {
        while let Some((start, c)) = self.chars.next() {
            self.scan_token(start, c);
        }

        let end = self.source.len();
        self.tokens
            .push(Token::new(TokenType::Eof, "", Span::new(end, end)));
        self.tokens
    }

    fn scan_token(&mut self, start: usize, c: char) {
        match c {
            ' ' | '\t' | '\r' | '\n' => {}
            '=' => {
                if self.match_char('=') {
                    self.add_token(TokenType::Eq, start, start + 2);
                } else {
                    self.add_token(TokenType::Assign, start, start + 1);
                }
            }
            '!' => {
                if self.match_char('=') {
                    self.add_token(TokenType::NotEq, start, start + 2);
                } else {
                    self.add_token(TokenType::Bang, start, start + 1);
                }
            }
            '+' => self.add_token(TokenType::Plus, start, start + 1),
            '-' => self.add_token(TokenType::Minus, start, start + 1),
            '*' => self.add_token(TokenType::Asterisk, start, start + 1),
            '/' => self.add_token(TokenType::Slash, start, start + 1),
            '<' => self.add_token(TokenType::Lt, start, start + 1),
            '>' => self.add_token(TokenType::Gt, start, start + 1),
            ',' => self.add_token(TokenType::Comma, start, start + 1),
            ';' => self.add_token(TokenType::Semicolon, start, start + 1),
            '(' => self.add_token(TokenType::LParen, start, start + 1),
            ')' => self.add_token(TokenType::RParen, start, start + 1),
            '{' => self.add_token(TokenType::LBrace, start, start + 1),
            '}' => self.add_token(TokenType::RBrace, start, start + 1),
            c if c.is_ascii_digit() => {
                let end = self.consume_while(start + 1, |c| c.is_ascii_digit());
                self.add_token(TokenType::Int, start, end);
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let end = self.consume_while(start + 1, |c| c.is_ascii_alphanumeric() || c == '_');
                let text = &self.source[start..end];
                let token_type = TokenType::keyword(text).unwrap_or(TokenType::Ident);
                self.add_token(token_type, start, end);
            }
            c => self.add_token(TokenType::Illegal, start, start + c.len_utf8()),
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        self.chars.next_if(|&(_, c)| c == expected).is_some()
    }

    /// Advance past every char satisfying `pred`, returning the end offset.
    fn consume_while(&mut self, mut end: usize, pred: impl Fn(char) -> bool) -> usize {
        while let Some((idx, c)) = self.chars.next_if(|&(_, c)| pred(c)) {
            end = idx + c.len_utf8();
        }
        end
    }

    fn add_token(&mut self, token_type: TokenType, start: usize, end: usize) {
        let literal = &self.source[start..end];
        self.tokens
            .push(Token::new(token_type, literal, Span::new(start, end)));
    }
}
