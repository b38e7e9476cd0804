//! Channel formula AST and parser
//!
//! Parses formula strings such as `Pow(R/255.0,0.5)*255` into an AST that can be compiled.

use crate::error::{FormulaError, Result};

/// AST node for channel formulas
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal number
    Const(f64),
    /// Channel input (R, G or B)
    Input(Input),
    /// Binary operation
    BinOp(Box<Expr>, BinOp, Box<Expr>),
    /// Unary operation
    UnaryOp(UnaryOp, Box<Expr>),
    /// Function call with positional arguments
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

/// One of the three named inputs a formula may read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Input {
    R,
    G,
    B,
}

impl Input {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "R" | "r" => Some(Self::R),
            "G" | "g" => Some(Self::G),
            "B" | "b" => Some(Self::B),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::R => 0,
            Self::G => 1,
            Self::B => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::R => "R",
            Self::G => "G",
            Self::B => "B",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Mod,
}

impl BinOp {
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => a / b,
            BinOp::Pow => a.powf(b),
            BinOp::Mod => a % b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    Neg,
}

/// Token for lexer
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    LParen,
    RParen,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    Eof,
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn next_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.next_char();
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        // Numbers
        if c.is_ascii_digit() || (c == '.' && self.input[self.pos + 1..].chars().next().map_or(false, |c| c.is_ascii_digit())) {
            return self.read_number();
        }

        // Identifiers
        if c.is_alphabetic() || c == '_' {
            return Ok(self.read_ident());
        }

        let start = self.pos;
        self.next_char();

        let token = match c {
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '^' => Token::Caret,
            '%' => Token::Percent,
            _ => return Err(FormulaError::UnexpectedChar { ch: c, pos: start }),
        };
        Ok(token)
    }

    fn read_number(&mut self) -> Result<Token> {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || c == '-' || c == '+' {
                // Sign only belongs to the literal right after an exponent marker
                if (c == '-' || c == '+') && self.pos > start {
                    let prev = self.input[..self.pos].chars().last();
                    if prev != Some('e') && prev != Some('E') {
                        break;
                    }
                }
                self.next_char();
            } else {
                break;
            }
        }
        let s = &self.input[start..self.pos];
        s.parse()
            .map(Token::Number)
            .map_err(|_| FormulaError::InvalidNumber(s.to_string()))
    }

    fn read_ident(&mut self) -> Token {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' {
                self.next_char();
            } else {
                break;
            }
        }
        Token::Ident(self.input[start..self.pos].to_string())
    }
}

/// Parser for channel formulas
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Result<Self> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        if self.current == expected {
            self.advance()
        } else {
            Err(FormulaError::Expected {
                expected: format!("{:?}", expected),
                found: format!("{:?}", self.current),
            })
        }
    }

    /// Parse the full expression, rejecting trailing input
    pub fn parse(&mut self) -> Result<Expr> {
        let expr = self.parse_additive()?;
        if self.current != Token::Eof {
            return Err(FormulaError::TrailingInput(format!("{:?}", self.current)));
        }
        Ok(expr)
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match &self.current {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = Expr::BinOp(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match &self.current {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                Token::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_unary()?;
            left = Expr::BinOp(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.current == Token::Minus {
            self.advance()?;
            let expr = self.parse_unary()?;
            return Ok(Expr::UnaryOp(UnaryOp::Neg, Box::new(expr)));
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_primary()?;
        if self.current == Token::Caret {
            self.advance()?;
            let exp = self.parse_unary()?; // right associative
            Ok(Expr::BinOp(Box::new(base), BinOp::Pow, Box::new(exp)))
        } else {
            Ok(base)
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.current.clone() {
            Token::Number(n) => {
                self.advance()?;
                Ok(Expr::Const(n))
            }
            Token::Ident(name) => {
                self.advance()?;

                if self.current == Token::LParen {
                    self.advance()?;
                    let args = self.parse_positional_args()?;
                    self.expect(Token::RParen)?;
                    Ok(Expr::Call { name, args })
                } else {
                    Input::from_name(&name)
                        .map(Expr::Input)
                        .ok_or(FormulaError::UnknownVariable(name))
                }
            }
            Token::LParen => {
                self.advance()?;
                let expr = self.parse_additive()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Token::Eof => Err(FormulaError::UnexpectedEnd),
            other => Err(FormulaError::UnexpectedToken(format!("{:?}", other))),
        }
    }

    fn parse_positional_args(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();

        if self.current == Token::RParen {
            return Ok(args);
        }

        loop {
            args.push(self.parse_additive()?);

            if self.current == Token::Comma {
                self.advance()?;
            } else {
                break;
            }
        }

        Ok(args)
    }
}

/// Parse a formula string
pub fn parse_expression(input: &str) -> Result<Expr> {
    let mut parser = Parser::new(input)?;
    parser.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        let expr = parse_expression("42").unwrap();
        assert_eq!(expr, Expr::Const(42.0));
    }

    #[test]
    fn test_parse_exponent_literal() {
        let expr = parse_expression("1e-2").unwrap();
        match expr {
            Expr::Const(n) => assert!((n - 0.01).abs() < 1e-12),
            _ => panic!("Expected Const"),
        }
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_expression("G").unwrap(), Expr::Input(Input::G));
        assert_eq!(parse_expression("b").unwrap(), Expr::Input(Input::B));
    }

    #[test]
    fn test_parse_binop_precedence() {
        let expr = parse_expression("1 + 2 * 3").unwrap();
        // Should parse as 1 + (2 * 3)
        match expr {
            Expr::BinOp(_, BinOp::Add, right) => match *right {
                Expr::BinOp(_, BinOp::Mul, _) => {}
                _ => panic!("Expected Mul on the right"),
            },
            _ => panic!("Expected Add at top level"),
        }
    }

    #[test]
    fn test_power_is_right_associative() {
        let expr = parse_expression("2 ^ 3 ^ 2").unwrap();
        match expr {
            Expr::BinOp(left, BinOp::Pow, right) => {
                assert_eq!(*left, Expr::Const(2.0));
                match *right {
                    Expr::BinOp(_, BinOp::Pow, _) => {}
                    _ => panic!("Expected nested Pow"),
                }
            }
            _ => panic!("Expected Pow"),
        }
    }

    #[test]
    fn test_negation_binds_looser_than_power() {
        // -2^2 is -(2^2)
        match parse_expression("-2^2").unwrap() {
            Expr::UnaryOp(UnaryOp::Neg, inner) => match *inner {
                Expr::BinOp(_, BinOp::Pow, _) => {}
                _ => panic!("Expected Pow under Neg"),
            },
            _ => panic!("Expected Neg"),
        }
    }

    #[test]
    fn test_parse_function_call() {
        let expr = parse_expression("Pow(R/255.0, 0.5)").unwrap();
        match expr {
            Expr::Call { name, args } => {
                assert_eq!(name, "Pow");
                assert_eq!(args.len(), 2);
                assert_eq!(args[1], Expr::Const(0.5));
            }
            _ => panic!("Expected Call"),
        }
    }

    #[test]
    fn test_unknown_variable_is_rejected() {
        assert_eq!(
            parse_expression("R + alpha"),
            Err(FormulaError::UnknownVariable("alpha".to_string()))
        );
    }

    #[test]
    fn test_malformed_input() {
        assert!(parse_expression("").is_err());
        assert!(parse_expression("(R + 1").is_err());
        assert!(parse_expression("R G").is_err());
        assert!(parse_expression("R $ 2").is_err());
        assert!(parse_expression("1.2.3").is_err());
    }
}
