//! Per-channel color formulas over `R`, `G`, `B`
//!
//! Architecture:
//! 1. `expression` - Parses formula strings into an AST
//! 2. `compiler` - Compiles the AST to register operations, folding constants
//! 3. `executor` - Runs compiled programs against bound channel inputs
//! 4. `formula` - Channel/color formulas with constant caching and identity fallback

mod error;
mod expression;
mod compiler;
mod executor;
mod formula;

pub use error::{FormulaError, Result};
pub use expression::{Expr, BinOp, UnaryOp, Input, parse_expression};
pub use compiler::{Compiler, CompiledProgram, Function, Op, compile_formula};
pub use executor::{ExecContext, evaluate};
pub use formula::{Channel, ChannelFormula, ColorFormula, to_byte};
