// Monkey Language Interpreter Library
//
// Core of the Monkey interpreter: a Pratt parser producing an AST and a
// tree-walking evaluator with lexically scoped closures.

// Public modules
pub mod ast;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod logging;
pub mod object;
pub mod parser;
pub mod repl;
pub mod runner;

// Re-export commonly used items
pub use ast::{Expression, Program, Statement};
pub use environment::{Env, Environment};
pub use error::{MonkeyError, Span};
pub use evaluator::{eval, EvalResult, Evaluator};
pub use lexer::{Lexer, Token, TokenType};
pub use object::{EvalError, Object};
pub use parser::{parse, Parser};

// Re-export main functions
pub use repl::start as start_repl;
pub use runner::run;
