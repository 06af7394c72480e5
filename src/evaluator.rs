use crate::ast::{BlockStatement, Expression, InfixOperator, PrefixOperator, Program, Statement};
use crate::environment::{Env, Environment};
use crate::error::Span;
use crate::object::{EvalError, Function, Object, NULL};
use std::rc::Rc;

/// Deepest chain of nested function calls before evaluation gives up.
pub const MAX_CALL_DEPTH: usize = 10_000;

const RED_ZONE: usize = 100 * 1024;
const STACK_PER_RECURSION: usize = 1024 * 1024;

pub type EvalResult = Result<Object, EvalError>;

/// Unwraps an operand, handing a pending `return` straight back to the
/// caller instead of computing with it.
macro_rules! operand {
    ($value:expr) => {
        match $value {
            Object::ReturnValue(value) => return Ok(Object::ReturnValue(value)),
            value => value,
        }
    };
}

/// Evaluate a whole program in `env`.
pub fn eval(program: &Program, env: &Env) -> EvalResult {
    Evaluator::new().eval_program(program, env)
}

/// Tree-walking evaluator. The only state it carries between nodes is the
/// current call depth; scopes are passed in explicitly.
pub struct Evaluator {
    depth: usize,
    max_call_depth: usize,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::with_max_call_depth(MAX_CALL_DEPTH)
    }

    pub fn with_max_call_depth(max_call_depth: usize) -> Self {
        Self {
            depth: 0,
            max_call_depth,
        }
    }

    /// Run every statement in order and yield the last value. A top-level
    /// `return` stops the program and yields its value.
    #[tracing::instrument(level = "debug", skip_all, fields(statements = program.statements.len()))]
    pub fn eval_program(&mut self, program: &Program, env: &Env) -> EvalResult {
        let mut result = NULL;

        for statement in &program.statements {
            match self.eval_statement(statement, env) {
                Ok(Object::ReturnValue(value)) => return Ok(*value),
                Ok(value) => result = value,
                Err(error) => {
                    tracing::debug!(%error, at = ?error.span(), "evaluation failed");
                    return Err(error);
                }
            }
        }

        Ok(result)
    }

    /// Like `eval_program`, but a `return` is passed up still wrapped so the
    /// enclosing call can see it.
    pub fn eval_block_statement(&mut self, block: &BlockStatement, env: &Env) -> EvalResult {
        let mut result = NULL;

        for statement in &block.statements {
            result = self.eval_statement(statement, env)?;
            if matches!(result, Object::ReturnValue(_)) {
                return Ok(result);
            }
        }

        Ok(result)
    }

    pub fn eval_statement(&mut self, statement: &Statement, env: &Env) -> EvalResult {
        match statement {
            Statement::Expression(stmt) => self.eval_expression(&stmt.expression, env),
            Statement::Let(stmt) => {
                let value = operand!(self.eval_expression(&stmt.value, env)?);
                tracing::trace!(binding = %stmt.name.value, %value, at = ?statement.span(), "let");
                env.borrow_mut().set(stmt.name.value.clone(), value);
                Ok(NULL)
            }
            Statement::Return(stmt) => {
                let value = operand!(self.eval_expression(&stmt.value, env)?);
                Ok(Object::ReturnValue(Box::new(value)))
            }
        }
    }

    pub fn eval_expression(&mut self, expression: &Expression, env: &Env) -> EvalResult {
        stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || {
            match expression {
                Expression::Integer { value, .. } => Ok(Object::Integer(*value)),
                Expression::Boolean { value, .. } => Ok(Object::from_bool(*value)),
                Expression::Identifier(ident) => {
                    env.borrow()
                        .get(&ident.value)
                        .ok_or_else(|| EvalError::IdentifierNotFound {
                            name: ident.value.clone(),
                            span: ident.token.span,
                        })
                }
                Expression::Prefix {
                    operator,
                    right,
                    span,
                    ..
                } => {
                    let right = operand!(self.eval_expression(right, env)?);
                    eval_prefix_expression(*operator, right, *span)
                }
                Expression::Infix {
                    left,
                    operator,
                    right,
                    span,
                    ..
                } => {
                    let left = operand!(self.eval_expression(left, env)?);
                    let right = operand!(self.eval_expression(right, env)?);
                    eval_infix_expression(*operator, left, right, *span)
                }
                Expression::If {
                    condition,
                    consequence,
                    alternative,
                    ..
                } => {
                    let condition = operand!(self.eval_expression(condition, env)?);
                    if condition.is_truthy() {
                        self.eval_block_statement(consequence, env)
                    } else if let Some(alternative) = alternative {
                        self.eval_block_statement(alternative, env)
                    } else {
                        Ok(NULL)
                    }
                }
                Expression::Function {
                    parameters, body, ..
                } => Ok(Object::Function(Rc::new(Function {
                    parameters: parameters.clone(),
                    body: Rc::clone(body),
                    env: Rc::clone(env),
                }))),
                Expression::Call {
                    function,
                    arguments,
                    span,
                    ..
                } => {
                    let function = operand!(self.eval_expression(function, env)?);

                    let mut args = Vec::with_capacity(arguments.len());
                    for argument in arguments {
                        args.push(operand!(self.eval_expression(argument, env)?));
                    }

                    self.apply_function(function, args, *span)
                }
            }
        })
    }

    /// Call `function` with already evaluated `args` in a fresh scope
    /// enclosed by the function's defining scope.
    fn apply_function(&mut self, function: Object, args: Vec<Object>, span: Span) -> EvalResult {
        let function = match function {
            Object::Function(function) => function,
            other => {
                return Err(EvalError::NotAFunction {
                    type_name: other.type_name(),
                    span,
                })
            }
        };

        if args.len() != function.parameters.len() {
            return Err(EvalError::WrongArgumentCount {
                expected: function.parameters.len(),
                got: args.len(),
                span,
            });
        }

        if self.depth >= self.max_call_depth {
            tracing::debug!(depth = self.depth, "call depth limit reached");
            return Err(EvalError::CallDepthExceeded {
                limit: self.max_call_depth,
                span,
            });
        }

        let call_env = Environment::new_enclosed(Rc::clone(&function.env));
        {
            let mut scope = call_env.borrow_mut();
            for (parameter, arg) in function.parameters.iter().zip(args) {
                scope.set(parameter.value.clone(), arg);
            }
        }

        tracing::trace!(depth = self.depth, arity = function.parameters.len(), "call");
        self.depth += 1;
        let result = self.eval_block_statement(&function.body, &call_env);
        self.depth -= 1;

        match result? {
            Object::ReturnValue(value) => Ok(*value),
            value => Ok(value),
        }
    }
}

fn eval_prefix_expression(operator: PrefixOperator, right: Object, span: Span) -> EvalResult {
    match operator {
        PrefixOperator::Not => Ok(Object::from_bool(!right.is_truthy())),
        PrefixOperator::Negate => match right {
            Object::Integer(value) => Ok(Object::Integer(value.wrapping_neg())),
            other => Err(EvalError::UnknownPrefixOperator {
                operator,
                operand: other.type_name(),
                span,
            }),
        },
    }
}

fn eval_infix_expression(
    operator: InfixOperator,
    left: Object,
    right: Object,
    span: Span,
) -> EvalResult {
    match (&left, &right) {
        (Object::Integer(l), Object::Integer(r)) => {
            eval_integer_infix_expression(operator, *l, *r, span)
        }
        (Object::Boolean(l), Object::Boolean(r)) => match operator {
            InfixOperator::Equal => Ok(Object::from_bool(l == r)),
            InfixOperator::NotEqual => Ok(Object::from_bool(l != r)),
            _ => Err(unknown_infix_operator(operator, &left, &right, span)),
        },
        _ if left.type_name() != right.type_name() => Err(EvalError::TypeMismatch {
            left: left.type_name(),
            operator,
            right: right.type_name(),
            span,
        }),
        _ => Err(unknown_infix_operator(operator, &left, &right, span)),
    }
}

fn eval_integer_infix_expression(
    operator: InfixOperator,
    left: i64,
    right: i64,
    span: Span,
) -> EvalResult {
    let result = match operator {
        InfixOperator::Add => Object::Integer(left.wrapping_add(right)),
        InfixOperator::Subtract => Object::Integer(left.wrapping_sub(right)),
        InfixOperator::Multiply => Object::Integer(left.wrapping_mul(right)),
        InfixOperator::Divide => {
            if right == 0 {
                return Err(EvalError::DivisionByZero { span });
            }
            Object::Integer(left.wrapping_div(right))
        }
        InfixOperator::Less => Object::from_bool(left < right),
        InfixOperator::Greater => Object::from_bool(left > right),
        InfixOperator::Equal => Object::from_bool(left == right),
        InfixOperator::NotEqual => Object::from_bool(left != right),
    };
    Ok(result)
}

fn unknown_infix_operator(
    operator: InfixOperator,
    left: &Object,
    right: &Object,
    span: Span,
) -> EvalError {
    EvalError::UnknownInfixOperator {
        left: left.type_name(),
        operator,
        right: right.type_name(),
        span,
    }
}
