//! Expression parsing using recursive descent.

use std::f64::consts::{E, PI};

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::functions::is_known_function;
use crate::error::{Error, Result};

/// Parse an objective expression from a string.
///
/// Bare identifiers are quantity references; identifiers followed by `(`
/// must name a built-in function.
pub fn parse_expression(input: &str) -> Result<Expr> {
    if input.trim().is_empty() {
        return Err(Error::Empty);
    }
    let mut parser = ExprParser::new(input);
    parser.parse()
}

/// Expression parser using recursive descent.
struct ExprParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> ExprParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::Parse {
            position: self.pos,
            message: message.into(),
        }
    }

    fn parse(&mut self) -> Result<Expr> {
        self.skip_whitespace();
        let expr = self.parse_additive()?;
        self.skip_whitespace();
        match self.peek() {
            Some(c) => Err(self.error(format!("unexpected character '{}'", c))),
            None => Ok(expr),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.as_bytes().get(self.pos).map(|&b| b as char)
    }

    fn advance(&mut self) {
        if self.pos < self.input.len() {
            self.pos += 1;
        }
    }

    fn check_str(&self, s: &str) -> bool {
        self.input.as_bytes()[self.pos..].starts_with(s.as_bytes())
    }

    fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            self.skip_whitespace();
            let op = match self.peek() {
                Some('+') => BinaryOp::Add,
                Some('-') => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Self::binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_power()?;

        loop {
            self.skip_whitespace();
            let op = match self.peek() {
                Some('*') if !self.check_str("**") => BinaryOp::Mul,
                Some('/') => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_power()?;
            left = Self::binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_unary()?;

        self.skip_whitespace();
        if self.peek() == Some('^') || self.check_str("**") {
            if self.peek() == Some('*') {
                self.advance(); // consume first *
            }
            self.advance(); // consume ^ or second *
            let exp = self.parse_power()?; // right associative
            Ok(Self::binary(BinaryOp::Pow, base, exp))
        } else {
            Ok(base)
        }
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        self.skip_whitespace();
        match self.peek() {
            Some('-') => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::UnaryOp {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                })
            }
            Some('+') => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        self.skip_whitespace();

        match self.peek() {
            Some('(') => {
                self.advance();
                let expr = self.parse_additive()?;
                self.skip_whitespace();
                if self.peek() != Some(')') {
                    return Err(self.error("expected ')'"));
                }
                self.advance();
                Ok(expr)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.parse_number(),
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.parse_identifier(),
            Some(c) => Err(self.error(format!("unexpected character '{}'", c))),
            None => Err(self.error("unexpected end of expression")),
        }
    }

    fn parse_number(&mut self) -> Result<Expr> {
        let start = self.pos;
        let mut has_dot = false;
        let mut has_exp = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else if c == '.' && !has_dot && !has_exp {
                has_dot = true;
                self.advance();
            } else if (c == 'e' || c == 'E') && !has_exp && self.exponent_follows() {
                has_exp = true;
                self.advance();
                if self.peek() == Some('+') || self.peek() == Some('-') {
                    self.advance();
                }
            } else {
                break;
            }
        }

        let num_str = &self.input[start..self.pos];
        let value: f64 = num_str.parse().map_err(|_| Error::Parse {
            position: start,
            message: format!("invalid number '{}'", num_str),
        })?;

        // Engineering suffix
        let suffix_start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphabetic() {
                self.advance();
            } else {
                break;
            }
        }
        let suffix = &self.input[suffix_start..self.pos];
        let multiplier = engineering_suffix(suffix).ok_or_else(|| Error::Parse {
            position: suffix_start,
            message: format!("unknown suffix '{}'", suffix),
        })?;

        Ok(Expr::Constant(value * multiplier))
    }

    /// Whether the `e` at the cursor starts an exponent rather than a suffix.
    fn exponent_follows(&self) -> bool {
        let rest = &self.input.as_bytes()[self.pos + 1..];
        match rest.first() {
            Some(b'+') | Some(b'-') => rest.get(1).is_some_and(u8::is_ascii_digit),
            Some(b) => b.is_ascii_digit(),
            None => false,
        }
    }

    fn parse_identifier(&mut self) -> Result<Expr> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let ident = &self.input[start..self.pos];

        self.skip_whitespace();

        if self.peek() == Some('(') {
            if !is_known_function(ident) {
                return Err(Error::UnknownFunction(ident.to_string()));
            }
            self.advance();
            let args = self.parse_function_args()?;
            return Ok(Expr::Function {
                name: ident.to_string(),
                args,
            });
        }

        match ident {
            "pi" => Ok(Expr::Constant(PI)),
            "e" => Ok(Expr::Constant(E)),
            _ => Ok(Expr::Quantity {
                name: ident.to_string(),
            }),
        }
    }

    fn parse_function_args(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();

        self.skip_whitespace();
        if self.peek() == Some(')') {
            self.advance();
            return Ok(args);
        }

        loop {
            let arg = self.parse_additive()?;
            args.push(arg);

            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.advance();
                }
                Some(')') => {
                    self.advance();
                    break;
                }
                _ => return Err(self.error("expected ',' or ')' in function arguments")),
            }
        }

        Ok(args)
    }
}

/// Multiplier for an engineering suffix, `None` if unrecognized.
fn engineering_suffix(suffix: &str) -> Option<f64> {
    let multiplier = match suffix.to_uppercase().as_str() {
        "" => 1.0,
        "T" => 1e12,
        "G" => 1e9,
        "MEG" => 1e6,
        "K" => 1e3,
        "M" => 1e-3,
        "U" => 1e-6,
        "N" => 1e-9,
        "P" => 1e-12,
        "F" => 1e-15,
        _ => return None,
    };
    Some(multiplier)
}
