//! Per-channel color formulas
//!
//! A [`ColorFormula`] holds one compiled formula per color channel. Formulas that
//! do not depend on their inputs are evaluated once at compile time. Formulas that
//! fail to compile or evaluate pass their channel through unchanged.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tracing::error;

use crate::compiler::{compile_formula, CompiledProgram};
use crate::error::{FormulaError, Result};
use crate::executor::evaluate;

/// Color channel a formula produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    pub fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
        })
    }
}

/// Truncate toward zero and clamp into the byte range
pub fn to_byte(value: f64) -> Result<u8> {
    if value.is_nan() {
        return Err(FormulaError::NotANumber);
    }
    Ok(value.trunc().clamp(0.0, 255.0) as u8)
}

#[derive(Debug)]
enum Evaluator {
    /// Input independent, computed once while compiling
    Constant(u8),
    /// Evaluated per call
    Program(CompiledProgram),
    /// Fallback for formulas that failed to compile
    Identity,
}

/// A compiled formula for a single channel
#[derive(Debug)]
pub struct ChannelFormula {
    channel: Channel,
    source: String,
    evaluator: Evaluator,
    compile_error: Option<FormulaError>,
    evaluations: AtomicU64,
    eval_error_reported: AtomicBool,
}

impl ChannelFormula {
    /// Compile `source` for `channel`. Never fails: errors are logged and the
    /// channel falls back to identity.
    pub fn compile(channel: Channel, source: &str) -> Self {
        let (evaluator, compile_error) = match compile_formula(source) {
            // Input-free formulas fold down to a single constant load
            Ok(program) => match program.as_constant().map(to_byte) {
                Some(Ok(byte)) => (Evaluator::Constant(byte), None),
                Some(Err(e)) => (Evaluator::Identity, Some(e)),
                None => (Evaluator::Program(program), None),
            },
            Err(e) => (Evaluator::Identity, Some(e)),
        };

        if let Some(e) = &compile_error {
            error!("{} formula '{}' is invalid ({}), keeping {} values unchanged", channel, source, e, channel);
        }

        Self {
            channel,
            source: source.to_string(),
            evaluator,
            compile_error,
            evaluations: AtomicU64::new(0),
            eval_error_reported: AtomicBool::new(false),
        }
    }

    /// Produce this channel's new value from an `[r, g, b]` color
    pub fn evaluate(&self, rgb: [u8; 3]) -> u8 {
        let current = rgb[self.channel.index()];
        match &self.evaluator {
            Evaluator::Constant(value) => *value,
            Evaluator::Identity => current,
            Evaluator::Program(program) => {
                self.evaluations.fetch_add(1, Ordering::Relaxed);
                let inputs = rgb.map(f64::from);
                match evaluate(program, Some(inputs)).and_then(to_byte) {
                    Ok(value) => value,
                    Err(e) => {
                        if !self.eval_error_reported.swap(true, Ordering::Relaxed) {
                            error!(
                                "{} formula '{}' failed for color {:?} ({}), keeping {} values unchanged",
                                self.channel, self.source, rgb, e, self.channel
                            );
                        }
                        current
                    }
                }
            }
        }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.evaluator, Evaluator::Constant(_))
    }

    /// The compile error, if this formula fell back to identity
    pub fn error(&self) -> Option<&FormulaError> {
        self.compile_error.as_ref()
    }

    /// Whether this formula failed to compile or failed on some color
    pub fn has_failed(&self) -> bool {
        self.compile_error.is_some() || self.eval_error_reported.load(Ordering::Relaxed)
    }

    /// Number of per-call program evaluations so far
    pub fn evaluations(&self) -> u64 {
        self.evaluations.load(Ordering::Relaxed)
    }
}

/// Red, green and blue formulas applied together
#[derive(Debug)]
pub struct ColorFormula {
    pub red: ChannelFormula,
    pub green: ChannelFormula,
    pub blue: ChannelFormula,
}

impl ColorFormula {
    pub fn compile(red: &str, green: &str, blue: &str) -> Self {
        Self {
            red: ChannelFormula::compile(Channel::Red, red),
            green: ChannelFormula::compile(Channel::Green, green),
            blue: ChannelFormula::compile(Channel::Blue, blue),
        }
    }

    /// Formulas that return every channel unchanged
    pub fn identity() -> Self {
        Self::compile("R", "G", "B")
    }

    pub fn apply(&self, rgb: [u8; 3]) -> [u8; 3] {
        [
            self.red.evaluate(rgb),
            self.green.evaluate(rgb),
            self.blue.evaluate(rgb),
        ]
    }

    pub fn channels(&self) -> [&ChannelFormula; 3] {
        [&self.red, &self.green, &self.blue]
    }

    /// Number of channels that failed to compile or evaluate
    pub fn error_count(&self) -> usize {
        self.channels().iter().filter(|c| c.has_failed()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_to_byte_truncates_then_clamps() {
        assert_eq!(to_byte(12.99).unwrap(), 12);
        assert_eq!(to_byte(-0.5).unwrap(), 0);
        assert_eq!(to_byte(-40.0).unwrap(), 0);
        assert_eq!(to_byte(255.9).unwrap(), 255);
        assert_eq!(to_byte(1e9).unwrap(), 255);
        assert_eq!(to_byte(f64::INFINITY).unwrap(), 255);
        assert_eq!(to_byte(f64::NAN), Err(FormulaError::NotANumber));
    }

    #[test]
    fn test_identity_never_changes_colors() {
        let formula = ColorFormula::identity();
        for rgb in [[0, 0, 0], [255, 255, 255], [12, 200, 99], [1, 2, 3]] {
            assert_eq!(formula.apply(rgb), rgb);
        }
    }

    #[test]
    fn test_constant_is_computed_once() {
        let formula = ColorFormula::compile("255", "G", "B");
        assert!(formula.red.is_constant());
        assert!(!formula.green.is_constant());

        for v in 0..=255u8 {
            assert_eq!(formula.apply([v, v, v])[0], 255);
        }
        assert_eq!(formula.red.evaluations(), 0);
        assert_eq!(formula.green.evaluations(), 256);
    }

    #[test]
    fn test_constant_is_clamped() {
        let formula = ChannelFormula::compile(Channel::Blue, "1000 - 2");
        assert!(formula.is_constant());
        assert_eq!(formula.evaluate([1, 2, 3]), 255);
    }

    #[test]
    fn test_brightening_curve() {
        let formula = ColorFormula::compile(
            "Pow(R/255.0,0.5)*255",
            "Pow(G/255.0,0.5)*255",
            "Pow(B/255.0,0.5)*255",
        );
        // sqrt(64/255)*255 = 127.75...
        assert_eq!(formula.apply([64, 0, 255]), [127, 0, 255]);
    }

    #[test]
    fn test_malformed_formula_falls_back_to_identity() {
        let formula = ColorFormula::compile("R +", "Pow(G)", "Bogus(B)");
        assert_eq!(formula.error_count(), 3);
        assert_eq!(formula.apply([10, 20, 30]), [10, 20, 30]);
    }

    #[test]
    fn test_nan_result_keeps_channel() {
        // 0/0 when R is zero
        let formula = ChannelFormula::compile(Channel::Red, "R / R * 100");
        assert_eq!(formula.evaluate([0, 5, 5]), 0);
        assert_eq!(formula.evaluate([7, 5, 5]), 100);
        assert!(formula.error().is_none());
        assert!(formula.has_failed());
    }

    #[test]
    fn test_constant_nan_is_a_compile_error() {
        let formula = ChannelFormula::compile(Channel::Green, "0 / 0");
        assert_eq!(formula.error(), Some(&FormulaError::NotANumber));
        assert_eq!(formula.evaluate([1, 2, 3]), 2);
        assert!(formula.has_failed());
    }

    #[test]
    fn test_evaluation_failures_are_counted() {
        let formula = ColorFormula::compile("R", "G / B", "B");
        assert_eq!(formula.error_count(), 0);
        formula.apply([1, 2, 3]);
        assert_eq!(formula.error_count(), 0);
        // 0 / 0
        formula.apply([1, 0, 0]);
        assert_eq!(formula.error_count(), 1);
    }

    #[test]
    fn test_shared_across_threads() {
        let formula = Arc::new(ColorFormula::compile("255 - R", "G / 2", "B"));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let formula = Arc::clone(&formula);
                std::thread::spawn(move || {
                    for v in 0..=255u8 {
                        let out = formula.apply([v, v, t]);
                        assert_eq!(out, [255 - v, v / 2, t]);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(formula.red.evaluations(), 8 * 256);
    }
}
