//! Formula program executor
//!
//! Runs compiled programs against a private register file. A program is never
//! mutated while executing, so one program can be shared by any number of threads.

use std::cell::RefCell;

use crate::compiler::{clamp, CompiledProgram, Op};
use crate::error::{FormulaError, Result};
use crate::expression::{BinOp, UnaryOp};

/// Execution context with register storage
pub struct ExecContext {
    regs: Vec<f64>,
}

impl ExecContext {
    pub fn new(num_registers: usize) -> Self {
        Self {
            regs: vec![0.0; num_registers.max(1)],
        }
    }

    /// Execute a program with the given `[R, G, B]` inputs.
    ///
    /// With `inputs == None`, any input load fails with [`FormulaError::UnboundInput`].
    pub fn execute(&mut self, program: &CompiledProgram, inputs: Option<[f64; 3]>) -> Result<f64> {
        if self.regs.len() < program.num_registers {
            self.regs.resize(program.num_registers, 0.0);
        }
        for op in &program.ops {
            self.execute_op(op, inputs)?;
        }
        Ok(self.regs[program.output_reg])
    }

    fn execute_op(&mut self, op: &Op, inputs: Option<[f64; 3]>) -> Result<()> {
        match op {
            Op::LoadConst { dst, value } => self.regs[*dst] = *value,
            Op::LoadInput { dst, input } => {
                let values = inputs.ok_or(FormulaError::UnboundInput(input.name()))?;
                self.regs[*dst] = values[input.index()];
            }
            Op::BinOp { dst, a, b, op } => self.exec_binop(*dst, *a, *b, *op),
            Op::UnaryOp { dst, src, op } => {
                self.regs[*dst] = match op {
                    UnaryOp::Neg => -self.regs[*src],
                };
            }
            Op::Abs { dst, src } => self.exec_unary_fn(*dst, *src, f64::abs),
            Op::Sqrt { dst, src } => self.exec_unary_fn(*dst, *src, f64::sqrt),
            Op::Exp { dst, src } => self.exec_unary_fn(*dst, *src, f64::exp),
            Op::Floor { dst, src } => self.exec_unary_fn(*dst, *src, f64::floor),
            Op::Ceil { dst, src } => self.exec_unary_fn(*dst, *src, f64::ceil),
            Op::Round { dst, src } => self.exec_unary_fn(*dst, *src, f64::round),
            Op::Truncate { dst, src } => self.exec_unary_fn(*dst, *src, f64::trunc),
            Op::Min { dst, a, b } => self.regs[*dst] = self.regs[*a].min(self.regs[*b]),
            Op::Max { dst, a, b } => self.regs[*dst] = self.regs[*a].max(self.regs[*b]),
            Op::Clamp { dst, value, min, max } => {
                self.regs[*dst] = clamp(self.regs[*value], self.regs[*min], self.regs[*max]);
            }
        }
        Ok(())
    }

    fn exec_binop(&mut self, dst: usize, a: usize, b: usize, op: BinOp) {
        self.regs[dst] = op.apply(self.regs[a], self.regs[b]);
    }

    fn exec_unary_fn(&mut self, dst: usize, src: usize, f: fn(f64) -> f64) {
        self.regs[dst] = f(self.regs[src]);
    }
}

thread_local! {
    static CONTEXT: RefCell<ExecContext> = RefCell::new(ExecContext::new(0));
}

/// Evaluate a program on this thread's register file.
///
/// Every register is written before it is read, so leftovers from earlier
/// programs never leak into a result.
pub fn evaluate(program: &CompiledProgram, inputs: Option<[f64; 3]>) -> Result<f64> {
    CONTEXT.with(|ctx| match ctx.try_borrow_mut() {
        Ok(mut ctx) => ctx.execute(program, inputs),
        Err(_) => ExecContext::new(program.num_registers).execute(program, inputs),
    })
}
