use crate::ast::{
    BlockStatement, Expression, ExpressionStatement, Identifier, InfixOperator, LetStatement,
    PrefixOperator, Program, ReturnStatement, Statement,
};
use crate::error::{MonkeyError, Span};
use crate::lexer::{Lexer, Token, TokenType};
use std::rc::Rc;

/// Remaining stack below which recursive descent grows the stack.
const RED_ZONE: usize = 100 * 1024;
/// Size of each stack segment allocated by `stacker`.
const STACK_PER_RECURSION: usize = 1024 * 1024;

type ParseResult<T> = Result<T, MonkeyError>;
type PrefixParseFn = fn(&mut Parser) -> ParseResult<Expression>;
type InfixParseFn = fn(&mut Parser, Expression) -> ParseResult<Expression>;

/// Binding strength, loosest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
}

impl Precedence {
    fn of(token_type: TokenType) -> Precedence {
        match token_type {
            TokenType::Eq | TokenType::NotEq => Precedence::Equals,
            TokenType::Lt | TokenType::Gt => Precedence::LessGreater,
            TokenType::Plus | TokenType::Minus => Precedence::Sum,
            TokenType::Asterisk | TokenType::Slash => Precedence::Product,
            TokenType::LParen => Precedence::Call,
            _ => Precedence::Lowest,
        }
    }
}

/// Tokenize and parse `source` in one go, returning the program together
/// with every error found.
#[tracing::instrument(level = "debug", skip_all, fields(bytes = source.len()))]
pub fn parse(source: &str) -> (Program, Vec<MonkeyError>) {
    let mut parser = Parser::new(Lexer::new(source).tokenize());
    let program = parser.parse_program();
    (program, parser.errors)
}

fn prefix_rule(token_type: TokenType) -> Option<PrefixParseFn> {
    match token_type {
        TokenType::Ident => Some(Parser::parse_identifier),
        TokenType::Int => Some(Parser::parse_integer_literal),
        TokenType::True | TokenType::False => Some(Parser::parse_boolean),
        TokenType::Bang | TokenType::Minus => Some(Parser::parse_prefix_expression),
        TokenType::LParen => Some(Parser::parse_grouped_expression),
        TokenType::If => Some(Parser::parse_if_expression),
        TokenType::Function => Some(Parser::parse_function_literal),
        _ => None,
    }
}

fn infix_rule(token_type: TokenType) -> Option<InfixParseFn> {
    match token_type {
        TokenType::Plus
        | TokenType::Minus
        | TokenType::Asterisk
        | TokenType::Slash
        | TokenType::Eq
        | TokenType::NotEq
        | TokenType::Lt
        | TokenType::Gt => Some(Parser::parse_infix_expression),
        TokenType::LParen => Some(Parser::parse_call_expression),
        _ => None,
    }
}

/// Pratt parser over a token vector. Holds the current token and one token
/// of lookahead; errors are collected rather than returned so one pass
/// reports everything it can.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    errors: Vec<MonkeyError>,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.token_type) != Some(TokenType::Eof) {
            let end = tokens.last().map(|t| t.span.end).unwrap_or(0);
            tokens.push(Token::new(TokenType::Eof, "", Span::new(end, end)));
        }

        Self {
            tokens,
            position: 0,
            errors: Vec::new(),
        }
    }

    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();

        while !self.cur_token_is(TokenType::Eof) {
            match self.parse_statement() {
                Ok(statement) => statements.push(statement),
                Err(error) => self.record_error(error),
            }
            self.next_token();
        }

        Program { statements }
    }

    pub fn errors(&self) -> &[MonkeyError] {
        &self.errors
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.message.clone()).collect()
    }

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        match self.cur_token().token_type {
            TokenType::Let => self.parse_let_statement(),
            TokenType::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> ParseResult<Statement> {
        let token = self.cur_token().clone();

        self.expect_peek(TokenType::Ident)?;
        let name = self.current_identifier();

        self.expect_peek(TokenType::Assign)?;
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;

        if self.peek_token_is(TokenType::Semicolon) {
            self.next_token();
        }

        Ok(Statement::Let(LetStatement { token, name, value }))
    }

    fn parse_return_statement(&mut self) -> ParseResult<Statement> {
        let token = self.cur_token().clone();

        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;

        if self.peek_token_is(TokenType::Semicolon) {
            self.next_token();
        }

        Ok(Statement::Return(ReturnStatement { token, value }))
    }

    fn parse_expression_statement(&mut self) -> ParseResult<Statement> {
        let token = self.cur_token().clone();
        let expression = self.parse_expression(Precedence::Lowest)?;

        // The semicolon is optional so `5 + 5` works in the REPL
        if self.peek_token_is(TokenType::Semicolon) {
            self.next_token();
        }

        Ok(Statement::Expression(ExpressionStatement { token, expression }))
    }

    fn parse_expression(&mut self, precedence: Precedence) -> ParseResult<Expression> {
        stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || {
            let prefix = match prefix_rule(self.cur_token().token_type) {
                Some(prefix) => prefix,
                None => return Err(self.no_prefix_parse_fn_error()),
            };
            let mut left = prefix(self)?;

            while !self.peek_token_is(TokenType::Semicolon) && precedence < self.peek_precedence()
            {
                let infix = match infix_rule(self.peek_token().token_type) {
                    Some(infix) => infix,
                    None => return Ok(left),
                };
                self.next_token();
                left = infix(self, left)?;
            }

            Ok(left)
        })
    }

    fn parse_identifier(&mut self) -> ParseResult<Expression> {
        Ok(Expression::Identifier(self.current_identifier()))
    }

    fn parse_integer_literal(&mut self) -> ParseResult<Expression> {
        let token = self.cur_token().clone();
        let value = token.literal.parse::<i64>().map_err(|_| {
            MonkeyError::parse_error_with_help(
                token.span,
                format!("could not parse {} as integer", token.literal),
                format!("Integer literals can be at most {}.", i64::MAX),
            )
        })?;

        Ok(Expression::Integer { token, value })
    }

    fn parse_boolean(&mut self) -> ParseResult<Expression> {
        let token = self.cur_token().clone();
        let value = token.token_type == TokenType::True;
        Ok(Expression::Boolean { token, value })
    }

    fn parse_prefix_expression(&mut self) -> ParseResult<Expression> {
        let token = self.cur_token().clone();
        let operator = match token.token_type {
            TokenType::Bang => PrefixOperator::Not,
            TokenType::Minus => PrefixOperator::Negate,
            _ => unreachable!("prefix rule registered for {}", token.token_type),
        };

        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;
        let span = token.span.to(right.span());

        Ok(Expression::Prefix {
            token,
            operator,
            right: Box::new(right),
            span,
        })
    }

    fn parse_infix_expression(&mut self, left: Expression) -> ParseResult<Expression> {
        let token = self.cur_token().clone();
        let operator = match token.token_type {
            TokenType::Plus => InfixOperator::Add,
            TokenType::Minus => InfixOperator::Subtract,
            TokenType::Asterisk => InfixOperator::Multiply,
            TokenType::Slash => InfixOperator::Divide,
            TokenType::Lt => InfixOperator::Less,
            TokenType::Gt => InfixOperator::Greater,
            TokenType::Eq => InfixOperator::Equal,
            TokenType::NotEq => InfixOperator::NotEqual,
            _ => unreachable!("infix rule registered for {}", token.token_type),
        };

        // Same precedence on the right keeps chains left-associative
        let precedence = self.cur_precedence();
        self.next_token();
        let right = self.parse_expression(precedence)?;
        let span = left.span().to(right.span());

        Ok(Expression::Infix {
            token,
            left: Box::new(left),
            operator,
            right: Box::new(right),
            span,
        })
    }

    fn parse_grouped_expression(&mut self) -> ParseResult<Expression> {
        self.next_token();
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenType::RParen)?;
        Ok(expression)
    }

    fn parse_if_expression(&mut self) -> ParseResult<Expression> {
        let token = self.cur_token().clone();

        self.expect_peek(TokenType::LParen)?;
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenType::RParen)?;

        self.expect_peek(TokenType::LBrace)?;
        let consequence = self.parse_block_statement()?;

        let alternative = if self.peek_token_is(TokenType::Else) {
            self.next_token();
            self.expect_peek(TokenType::LBrace)?;
            Some(self.parse_block_statement()?)
        } else {
            None
        };

        let span = token.span.to(self.cur_token().span);
        Ok(Expression::If {
            token,
            condition: Box::new(condition),
            consequence,
            alternative,
            span,
        })
    }

    fn parse_block_statement(&mut self) -> ParseResult<BlockStatement> {
        let token = self.cur_token().clone();
        let mut statements = Vec::new();

        self.next_token();

        while !self.cur_token_is(TokenType::RBrace) {
            if self.cur_token_is(TokenType::Eof) {
                return Err(MonkeyError::parse_error_with_help(
                    self.cur_token().span,
                    "expected }, got EOF".to_string(),
                    format!(
                        "The block opened at offset {} is never closed with '}}'.",
                        token.span.start
                    ),
                ));
            }

            match self.parse_statement() {
                Ok(statement) => statements.push(statement),
                Err(error) => {
                    self.record_error(error);
                    if self.cur_token_is(TokenType::RBrace) {
                        break;
                    }
                }
            }
            self.next_token();
        }

        Ok(BlockStatement { token, statements })
    }

    fn parse_function_literal(&mut self) -> ParseResult<Expression> {
        let token = self.cur_token().clone();

        self.expect_peek(TokenType::LParen)?;
        let parameters = self.parse_function_parameters()?;

        self.expect_peek(TokenType::LBrace)?;
        let body = self.parse_block_statement()?;

        let span = token.span.to(self.cur_token().span);
        Ok(Expression::Function {
            token,
            parameters,
            body: Rc::new(body),
            span,
        })
    }

    fn parse_function_parameters(&mut self) -> ParseResult<Vec<Identifier>> {
        let mut identifiers = Vec::new();

        if self.peek_token_is(TokenType::RParen) {
            self.next_token();
            return Ok(identifiers);
        }

        self.expect_peek(TokenType::Ident)?;
        identifiers.push(self.current_identifier());

        while self.peek_token_is(TokenType::Comma) {
            self.next_token();
            self.expect_peek(TokenType::Ident)?;
            identifiers.push(self.current_identifier());
        }

        self.expect_peek(TokenType::RParen)?;
        Ok(identifiers)
    }

    fn parse_call_expression(&mut self, function: Expression) -> ParseResult<Expression> {
        let token = self.cur_token().clone();
        let arguments = self.parse_call_arguments()?;
        let span = function.span().to(self.cur_token().span);

        Ok(Expression::Call {
            token,
            function: Box::new(function),
            arguments,
            span,
        })
    }

    fn parse_call_arguments(&mut self) -> ParseResult<Vec<Expression>> {
        let mut arguments = Vec::new();

        if self.peek_token_is(TokenType::RParen) {
            self.next_token();
            return Ok(arguments);
        }

        self.next_token();
        arguments.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_token_is(TokenType::Comma) {
            self.next_token();
            self.next_token();
            arguments.push(self.parse_expression(Precedence::Lowest)?);
        }

        self.expect_peek(TokenType::RParen)?;
        Ok(arguments)
    }

    fn current_identifier(&self) -> Identifier {
        let token = self.cur_token().clone();
        let value = token.literal.clone();
        Identifier { token, value }
    }

    /// Keep the error and skip to the next statement boundary (`;` or `}`)
    /// so parsing can carry on.
    fn record_error(&mut self, error: MonkeyError) {
        tracing::debug!(error = %error.message, at = ?error.span, "parse error, resynchronizing");
        self.errors.push(error);

        while !matches!(
            self.cur_token().token_type,
            TokenType::Semicolon | TokenType::RBrace | TokenType::Eof
        ) {
            self.next_token();
        }
    }

    fn no_prefix_parse_fn_error(&self) -> MonkeyError {
        let token = self.cur_token();
        let help = match token.token_type {
            TokenType::RParen => "Found ')' without matching '('. Check for unbalanced parentheses.",
            TokenType::RBrace => "Found '}' without matching '{'. Check for unbalanced braces.",
            TokenType::Eof => "Reached end of input while expecting an expression.",
            TokenType::Illegal => "This character is not part of the language.",
            _ => "Expected an identifier, literal, prefix operator, 'if', 'fn' or '(' here.",
        };

        MonkeyError::parse_error_with_help(
            token.span,
            format!("no prefix parse function for {}", token.token_type),
            help.to_string(),
        )
    }

    fn expect_peek(&mut self, token_type: TokenType) -> ParseResult<()> {
        if self.peek_token_is(token_type) {
            self.next_token();
            Ok(())
        } else {
            Err(self.peek_error(token_type))
        }
    }

    fn peek_error(&self, expected: TokenType) -> MonkeyError {
        let actual = self.peek_token();
        let message = format!(
            "expected next token to be {}, got {} instead",
            expected, actual.token_type
        );

        // At EOF, point just past the last real token
        let span = if actual.token_type == TokenType::Eof {
            Span::single(self.cur_token().span.end)
        } else {
            actual.span
        };

        let help = match expected {
            TokenType::RParen => Some("Every '(' needs a matching ')'."),
            TokenType::LBrace => Some("'if' branches and function bodies are written in braces."),
            TokenType::Ident => Some("A name must follow here, e.g. 'let x = 5;' or 'fn(x, y) { ... }'."),
            TokenType::Assign => Some("A let binding needs '=' before its value: 'let x = 5;'."),
            _ => None,
        };

        match help {
            Some(help) => MonkeyError::parse_error_with_help(span, message, help.to_string()),
            None => MonkeyError::parse_error(span, message),
        }
    }

    fn next_token(&mut self) {
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
    }

    fn cur_token(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn peek_token(&self) -> &Token {
        let index = (self.position + 1).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn cur_token_is(&self, token_type: TokenType) -> bool {
        self.cur_token().token_type == token_type
    }

    fn peek_token_is(&self, token_type: TokenType) -> bool {
        self.peek_token().token_type == token_type
    }

    fn cur_precedence(&self) -> Precedence {
        Precedence::of(self.cur_token().token_type)
    }

    fn peek_precedence(&self) -> Precedence {
        Precedence::of(self.peek_token().token_type)
    }
}
