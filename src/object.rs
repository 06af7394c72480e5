use crate::ast::{BlockStatement, Identifier, InfixOperator, PrefixOperator};
use crate::environment::Env;
use crate::error::{MonkeyError, Span};
use std::fmt;
use std::rc::Rc;

pub const TRUE: Object = Object::Boolean(true);
pub const FALSE: Object = Object::Boolean(false);
pub const NULL: Object = Object::Null;

/// Runtime values produced by the evaluator.
#[derive(Debug, Clone)]
pub enum Object {
    Integer(i64),
    Boolean(bool),
    Null,
    Function(Rc<Function>),
    /// Carries a `return` value up to the nearest call boundary.
    ReturnValue(Box<Object>),
}

/// A closure: parameters and body plus the scope it was defined in.
pub struct Function {
    pub parameters: Vec<Identifier>,
    pub body: Rc<BlockStatement>,
    pub env: Env,
}

// The captured scope may hold this very function, so it is left out.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.parameters.iter().map(|p| p.value.as_str()).collect();
        f.debug_struct("Function")
            .field("parameters", &names)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Integer(l), Object::Integer(r)) => l == r,
            (Object::Boolean(l), Object::Boolean(r)) => l == r,
            (Object::Null, Object::Null) => true,
            (Object::Function(l), Object::Function(r)) => Rc::ptr_eq(l, r),
            (Object::ReturnValue(l), Object::ReturnValue(r)) => l == r,
            _ => false,
        }
    }
}

impl Object {
    pub fn from_bool(value: bool) -> Object {
        if value {
            TRUE
        } else {
            FALSE
        }
    }

    /// Everything except `false` and `null` counts as true.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Object::Boolean(false) | Object::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Integer(_) => "INTEGER",
            Object::Boolean(_) => "BOOLEAN",
            Object::Null => "NULL",
            Object::Function(_) => "FUNCTION",
            Object::ReturnValue(_) => "RETURN_VALUE",
        }
    }

    pub fn inspect(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Object::Integer(n) => write!(f, "{}", n),
            Object::Boolean(b) => write!(f, "{}", b),
            Object::Null => write!(f, "null"),
            Object::Function(_) => write!(f, "<function>"),
            Object::ReturnValue(value) => write!(f, "{}", value),
        }
    }
}

/// Why evaluation stopped. Each variant carries the span of the node that
/// raised it.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    IdentifierNotFound {
        name: String,
        span: Span,
    },
    TypeMismatch {
        left: &'static str,
        operator: InfixOperator,
        right: &'static str,
        span: Span,
    },
    UnknownPrefixOperator {
        operator: PrefixOperator,
        operand: &'static str,
        span: Span,
    },
    UnknownInfixOperator {
        left: &'static str,
        operator: InfixOperator,
        right: &'static str,
        span: Span,
    },
    WrongArgumentCount {
        expected: usize,
        got: usize,
        span: Span,
    },
    NotAFunction {
        type_name: &'static str,
        span: Span,
    },
    DivisionByZero {
        span: Span,
    },
    CallDepthExceeded {
        limit: usize,
        span: Span,
    },
}

impl EvalError {
    pub fn span(&self) -> Span {
        match self {
            EvalError::IdentifierNotFound { span, .. }
            | EvalError::TypeMismatch { span, .. }
            | EvalError::UnknownPrefixOperator { span, .. }
            | EvalError::UnknownInfixOperator { span, .. }
            | EvalError::WrongArgumentCount { span, .. }
            | EvalError::NotAFunction { span, .. }
            | EvalError::DivisionByZero { span }
            | EvalError::CallDepthExceeded { span, .. } => *span,
        }
    }

    /// The REPL rendering of an error value.
    pub fn inspect(&self) -> String {
        format!("ERROR: {}", self)
    }

    fn help(&self) -> Option<&'static str> {
        match self {
            EvalError::IdentifierNotFound { .. } => {
                Some("Bind the name with 'let' before using it.")
            }
            EvalError::TypeMismatch { .. } => {
                Some("Both operands of an infix operator must have the same type.")
            }
            EvalError::UnknownInfixOperator { .. } => {
                Some("Arithmetic and ordering need integers; booleans support only '==' and '!='.")
            }
            EvalError::NotAFunction { .. } => Some("Only 'fn' values can be called."),
            EvalError::CallDepthExceeded { .. } => {
                Some("Check that the recursion has a reachable base case.")
            }
            _ => None,
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EvalError::IdentifierNotFound { name, .. } => {
                write!(f, "identifier not found: {}", name)
            }
            EvalError::TypeMismatch {
                left,
                operator,
                right,
                ..
            } => write!(f, "type mismatch: {} {} {}", left, operator, right),
            EvalError::UnknownPrefixOperator {
                operator, operand, ..
            } => write!(f, "unknown operator: {}{}", operator, operand),
            EvalError::UnknownInfixOperator {
                left,
                operator,
                right,
                ..
            } => write!(f, "unknown operator: {} {} {}", left, operator, right),
            EvalError::WrongArgumentCount { expected, got, .. } => {
                write!(f, "wrong number of arguments: want={}, got={}", expected, got)
            }
            EvalError::NotAFunction { type_name, .. } => {
                write!(f, "not a function: {}", type_name)
            }
            EvalError::DivisionByZero { .. } => write!(f, "division by zero"),
            EvalError::CallDepthExceeded { limit, .. } => {
                write!(f, "maximum call depth of {} exceeded", limit)
            }
        }
    }
}

impl std::error::Error for EvalError {}

impl From<EvalError> for MonkeyError {
    fn from(err: EvalError) -> Self {
        let span = err.span();
        let message = err.to_string();
        match err.help() {
            Some(help) => MonkeyError::runtime_error_with_help(span, message, help.to_string()),
            None => MonkeyError::runtime_error(span, message),
        }
    }
}
