//! Channel formula compiler
//!
//! Compiles parsed formulas into register operations. Subexpressions that do
//! not read any input are folded into constants while compiling.

use crate::error::{FormulaError, Result};
use crate::expression::{BinOp, Expr, Input, UnaryOp};

/// Compiled formula program
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    pub ops: Vec<Op>,
    pub output_reg: usize,
    pub num_registers: usize,
}

impl CompiledProgram {
    /// The folded value when the whole program is a single constant load
    pub fn as_constant(&self) -> Option<f64> {
        match self.ops.as_slice() {
            [Op::LoadConst { value, .. }] => Some(*value),
            _ => None,
        }
    }
}

/// Low-level operation
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Load constant into register
    LoadConst { dst: usize, value: f64 },
    /// Load one of the bound channel inputs
    LoadInput { dst: usize, input: Input },
    /// Binary operation: dst = a op b
    BinOp { dst: usize, a: usize, b: usize, op: BinOp },
    /// Unary operation: dst = op(src)
    UnaryOp { dst: usize, src: usize, op: UnaryOp },

    // Math functions
    Abs { dst: usize, src: usize },
    Sqrt { dst: usize, src: usize },
    Exp { dst: usize, src: usize },
    Floor { dst: usize, src: usize },
    Ceil { dst: usize, src: usize },
    Round { dst: usize, src: usize },
    Truncate { dst: usize, src: usize },
    Min { dst: usize, a: usize, b: usize },
    Max { dst: usize, a: usize, b: usize },
    Clamp { dst: usize, value: usize, min: usize, max: usize },
}

/// Built-in functions callable from formulas (names are case-insensitive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Abs,
    Ceiling,
    Clamp,
    Exp,
    Floor,
    Max,
    Min,
    Pow,
    Round,
    Sqrt,
    Truncate,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        let f = match name.to_ascii_lowercase().as_str() {
            "abs" => Self::Abs,
            "ceiling" | "ceil" => Self::Ceiling,
            "clamp" => Self::Clamp,
            "exp" => Self::Exp,
            "floor" => Self::Floor,
            "max" => Self::Max,
            "min" => Self::Min,
            "pow" => Self::Pow,
            "round" => Self::Round,
            "sqrt" => Self::Sqrt,
            "truncate" | "trunc" => Self::Truncate,
            _ => return None,
        };
        Some(f)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Abs => "Abs",
            Self::Ceiling => "Ceiling",
            Self::Clamp => "Clamp",
            Self::Exp => "Exp",
            Self::Floor => "Floor",
            Self::Max => "Max",
            Self::Min => "Min",
            Self::Pow => "Pow",
            Self::Round => "Round",
            Self::Sqrt => "Sqrt",
            Self::Truncate => "Truncate",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Self::Clamp => 3,
            Self::Max | Self::Min | Self::Pow => 2,
            _ => 1,
        }
    }

    /// Evaluate with already computed arguments (`args.len() == arity()`)
    pub fn apply(self, args: &[f64]) -> f64 {
        match self {
            Self::Abs => args[0].abs(),
            Self::Ceiling => args[0].ceil(),
            Self::Clamp => clamp(args[0], args[1], args[2]),
            Self::Exp => args[0].exp(),
            Self::Floor => args[0].floor(),
            Self::Max => args[0].max(args[1]),
            Self::Min => args[0].min(args[1]),
            Self::Pow => args[0].powf(args[1]),
            Self::Round => args[0].round(),
            Self::Sqrt => args[0].sqrt(),
            Self::Truncate => args[0].trunc(),
        }
    }
}

/// Clamp without panicking on inverted bounds
pub(crate) fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Result of compiling a subexpression
#[derive(Debug, Clone, Copy, PartialEq)]
enum Value {
    Const(f64),
    Reg(usize),
}

/// Compiler state
pub struct Compiler {
    /// Next register to allocate
    next_reg: usize,
    /// Operations
    ops: Vec<Op>,
}

impl Compiler {
    pub fn new() -> Self {
        Self { next_reg: 0, ops: Vec::new() }
    }

    fn alloc_reg(&mut self) -> usize {
        let reg = self.next_reg;
        self.next_reg += 1;
        reg
    }

    fn materialize(&mut self, value: Value) -> usize {
        match value {
            Value::Reg(reg) => reg,
            Value::Const(value) => {
                let dst = self.alloc_reg();
                self.ops.push(Op::LoadConst { dst, value });
                dst
            }
        }
    }

    /// Compile a whole expression into a program
    pub fn compile_program(mut self, expr: &Expr) -> Result<CompiledProgram> {
        let value = self.compile(expr)?;
        let output_reg = self.materialize(value);
        Ok(CompiledProgram {
            ops: self.ops,
            output_reg,
            num_registers: self.next_reg,
        })
    }

    fn compile(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Const(n) => Ok(Value::Const(*n)),

            Expr::Input(input) => {
                let dst = self.alloc_reg();
                self.ops.push(Op::LoadInput { dst, input: *input });
                Ok(Value::Reg(dst))
            }

            Expr::BinOp(a, op, b) => {
                let a = self.compile(a)?;
                let b = self.compile(b)?;
                if let (Value::Const(a), Value::Const(b)) = (a, b) {
                    return Ok(Value::Const(op.apply(a, b)));
                }
                let a = self.materialize(a);
                let b = self.materialize(b);
                let dst = self.alloc_reg();
                self.ops.push(Op::BinOp { dst, a, b, op: *op });
                Ok(Value::Reg(dst))
            }

            Expr::UnaryOp(op, expr) => {
                let src = self.compile(expr)?;
                if let Value::Const(v) = src {
                    return Ok(Value::Const(match op {
                        UnaryOp::Neg => -v,
                    }));
                }
                let src = self.materialize(src);
                let dst = self.alloc_reg();
                self.ops.push(Op::UnaryOp { dst, src, op: *op });
                Ok(Value::Reg(dst))
            }

            Expr::Call { name, args } => self.compile_call(name, args),
        }
    }

    fn compile_call(&mut self, name: &str, args: &[Expr]) -> Result<Value> {
        let func = Function::from_name(name)
            .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;
        if args.len() != func.arity() {
            return Err(FormulaError::Arity {
                name: func.name(),
                expected: func.arity(),
                actual: args.len(),
            });
        }

        let values = args.iter()
            .map(|arg| self.compile(arg))
            .collect::<Result<Vec<_>>>()?;

        let constants: Option<Vec<f64>> = values.iter()
            .map(|v| match v {
                Value::Const(c) => Some(*c),
                Value::Reg(_) => None,
            })
            .collect();
        if let Some(constants) = constants {
            return Ok(Value::Const(func.apply(&constants)));
        }

        let regs: Vec<usize> = values.into_iter().map(|v| self.materialize(v)).collect();
        let dst = self.alloc_reg();
        let op = match func {
            Function::Abs => Op::Abs { dst, src: regs[0] },
            Function::Ceiling => Op::Ceil { dst, src: regs[0] },
            Function::Clamp => Op::Clamp { dst, value: regs[0], min: regs[1], max: regs[2] },
            Function::Exp => Op::Exp { dst, src: regs[0] },
            Function::Floor => Op::Floor { dst, src: regs[0] },
            Function::Max => Op::Max { dst, a: regs[0], b: regs[1] },
            Function::Min => Op::Min { dst, a: regs[0], b: regs[1] },
            Function::Pow => Op::BinOp { dst, a: regs[0], b: regs[1], op: BinOp::Pow },
            Function::Round => Op::Round { dst, src: regs[0] },
            Function::Sqrt => Op::Sqrt { dst, src: regs[0] },
            Function::Truncate => Op::Truncate { dst, src: regs[0] },
        };
        self.ops.push(op);
        Ok(Value::Reg(dst))
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse and compile a formula string
pub fn compile_formula(source: &str) -> Result<CompiledProgram> {
    let expr = crate::expression::parse_expression(source)?;
    Compiler::new().compile_program(&expr)
}
