use crate::error::Span;
use crate::lexer::{Token, TokenType};
use std::fmt;
use std::rc::Rc;

/// Syntax tree produced by the parser.
///
/// Every node keeps the token it started at so it can report its literal
/// and a span for diagnostics. `Display` renders the canonical, fully
/// parenthesized form used to check precedence.

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn token_literal(&self) -> &str {
        self.statements
            .first()
            .map(Statement::token_literal)
            .unwrap_or("")
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for statement in &self.statements {
            write!(f, "{}", statement)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Let(LetStatement),
    Return(ReturnStatement),
    Expression(ExpressionStatement),
}

impl Statement {
    pub fn token_literal(&self) -> &str {
        match self {
            Statement::Let(stmt) => &stmt.token.literal,
            Statement::Return(stmt) => &stmt.token.literal,
            Statement::Expression(stmt) => &stmt.token.literal,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Statement::Let(stmt) => stmt.token.span.to(stmt.value.span()),
            Statement::Return(stmt) => stmt.token.span.to(stmt.value.span()),
            Statement::Expression(stmt) => stmt.expression.span(),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Statement::Let(stmt) => {
                write!(f, "{} {} = {};", stmt.token.literal, stmt.name, stmt.value)
            }
            Statement::Return(stmt) => write!(f, "{} {};", stmt.token.literal, stmt.value),
            Statement::Expression(stmt) => write!(f, "{}", stmt.expression),
        }
    }
}

/// `let <name> = <value>;`
#[derive(Debug, Clone, PartialEq)]
pub struct LetStatement {
    pub token: Token,
    pub name: Identifier,
    pub value: Expression,
}

/// `return <value>;`
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub token: Token,
    pub value: Expression,
}

/// A bare expression used as a statement; the last one is a block's value.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement {
    pub token: Token,
    pub expression: Expression,
}

/// Brace-delimited statement list of an `if` branch or function body.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatement {
    pub token: Token,
    pub statements: Vec<Statement>,
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for statement in &self.statements {
            write!(f, "{}", statement)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub token: Token,
    pub value: String,
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier(Identifier),
    Integer {
        token: Token,
        value: i64,
    },
    Boolean {
        token: Token,
        value: bool,
    },
    Prefix {
        token: Token,
        operator: PrefixOperator,
        right: Box<Expression>,
        span: Span,
    },
    Infix {
        token: Token,
        left: Box<Expression>,
        operator: InfixOperator,
        right: Box<Expression>,
        span: Span,
    },
    If {
        token: Token,
        condition: Box<Expression>,
        consequence: BlockStatement,
        alternative: Option<BlockStatement>,
        span: Span,
    },
    /// Function template; the environment is captured when it is evaluated.
    Function {
        token: Token,
        parameters: Vec<Identifier>,
        body: Rc<BlockStatement>,
        span: Span,
    },
    Call {
        token: Token,
        function: Box<Expression>,
        arguments: Vec<Expression>,
        span: Span,
    },
}

impl Expression {
    pub fn token_literal(&self) -> &str {
        match self {
            Expression::Identifier(ident) => &ident.token.literal,
            Expression::Integer { token, .. }
            | Expression::Boolean { token, .. }
            | Expression::Prefix { token, .. }
            | Expression::Infix { token, .. }
            | Expression::If { token, .. }
            | Expression::Function { token, .. }
            | Expression::Call { token, .. } => &token.literal,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Expression::Identifier(ident) => ident.token.span,
            Expression::Integer { token, .. } | Expression::Boolean { token, .. } => token.span,
            Expression::Prefix { span, .. }
            | Expression::Infix { span, .. }
            | Expression::If { span, .. }
            | Expression::Function { span, .. }
            | Expression::Call { span, .. } => *span,
        }
    }
}

/// Nested expressions are freed from a heap worklist instead of through
/// the recursive drop glue, so a long `----1` chain cannot exhaust the stack.
impl Drop for Expression {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.take_children(&mut pending);
        while let Some(mut expression) = pending.pop() {
            expression.take_children(&mut pending);
        }
    }
}

impl Expression {
    /// Move every directly nested expression into `pending`, leaving
    /// leaves behind.
    fn take_children(&mut self, pending: &mut Vec<Expression>) {
        match self {
            Expression::Identifier(_)
            | Expression::Integer { .. }
            | Expression::Boolean { .. } => {}
            Expression::Prefix { right, .. } => pending.push(take_expression(right)),
            Expression::Infix { left, right, .. } => {
                pending.push(take_expression(left));
                pending.push(take_expression(right));
            }
            Expression::If {
                condition,
                consequence,
                alternative,
                ..
            } => {
                pending.push(take_expression(condition));
                take_block(consequence, pending);
                if let Some(alternative) = alternative {
                    take_block(alternative, pending);
                }
            }
            // A body still shared with a live closure is freed by its last owner
            Expression::Function { body, .. } => {
                if let Some(body) = Rc::get_mut(body) {
                    take_block(body, pending);
                }
            }
            Expression::Call {
                function,
                arguments,
                ..
            } => {
                pending.push(take_expression(function));
                pending.append(arguments);
            }
        }
    }
}

fn take_expression(expression: &mut Expression) -> Expression {
    let leaf = Expression::Boolean {
        token: Token::new(TokenType::Illegal, "", Span::default()),
        value: false,
    };
    std::mem::replace(expression, leaf)
}

fn take_block(block: &mut BlockStatement, pending: &mut Vec<Expression>) {
    for statement in block.statements.drain(..) {
        pending.push(match statement {
            Statement::Let(stmt) => stmt.value,
            Statement::Return(stmt) => stmt.value,
            Statement::Expression(stmt) => stmt.expression,
        });
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expression::Identifier(ident) => write!(f, "{}", ident),
            Expression::Integer { token, .. } | Expression::Boolean { token, .. } => {
                f.write_str(&token.literal)
            }
            Expression::Prefix {
                operator, right, ..
            } => write!(f, "({}{})", operator, right),
            Expression::Infix {
                left,
                operator,
                right,
                ..
            } => write!(f, "({} {} {})", left, operator, right),
            Expression::If {
                condition,
                consequence,
                alternative,
                ..
            } => {
                write!(f, "if{} {}", condition, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, "else {}", alternative)?;
                }
                Ok(())
            }
            Expression::Function {
                token,
                parameters,
                body,
                ..
            } => {
                write!(f, "{}(", token.literal)?;
                write_comma_separated(f, parameters)?;
                write!(f, "){}", body)
            }
            Expression::Call {
                function,
                arguments,
                ..
            } => {
                write!(f, "{}(", function)?;
                write_comma_separated(f, arguments)?;
                write!(f, ")")
            }
        }
    }
}

fn write_comma_separated<T: fmt::Display>(f: &mut fmt::Formatter, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOperator {
    Not,
    Negate,
}

impl fmt::Display for PrefixOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PrefixOperator::Not => f.write_str("!"),
            PrefixOperator::Negate => f.write_str("-"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Less,
    Greater,
    Equal,
    NotEqual,
}

impl fmt::Display for InfixOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            InfixOperator::Add => "+",
            InfixOperator::Subtract => "-",
            InfixOperator::Multiply => "*",
            InfixOperator::Divide => "/",
            InfixOperator::Less => "<",
            InfixOperator::Greater => ">",
            InfixOperator::Equal => "==",
            InfixOperator::NotEqual => "!=",
        };
        f.write_str(symbol)
    }
}
