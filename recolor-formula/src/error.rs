#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormulaError {
    #[error("unexpected character '{ch}' at offset {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("invalid number literal: {0}")]
    InvalidNumber(String),

    #[error("expected {expected}, found {found}")]
    Expected { expected: String, found: String },

    #[error("unexpected token: {0}")]
    UnexpectedToken(String),

    #[error("unexpected end of formula")]
    UnexpectedEnd,

    #[error("trailing input after formula: {0}")]
    TrailingInput(String),

    #[error("unknown variable '{0}' (available: R, G, B)")]
    UnknownVariable(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("function {name} takes {expected} argument(s), got {actual}")]
    Arity { name: &'static str, expected: usize, actual: usize },

    #[error("input {0} is not bound")]
    UnboundInput(&'static str),

    #[error("formula evaluated to NaN")]
    NotANumber,
}

pub type Result<T> = std::result::Result<T, FormulaError>;
