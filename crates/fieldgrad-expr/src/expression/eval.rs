//! Expression evaluation and analysis.

use std::collections::HashMap;

use fieldgrad_core::QuantityVector;

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::functions::{derivative_function, eval_function};

/// Values bound to quantity names during evaluation.
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    pub quantities: HashMap<String, f64>,
}

impl EvalContext {
    /// Create a new empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind every entry of a quantity vector.
    pub fn from_quantities(quantities: &QuantityVector) -> Self {
        Self {
            quantities: quantities
                .iter()
                .map(|(name, value)| (name.clone(), *value))
                .collect(),
        }
    }

    pub fn set_quantity(&mut self, name: &str, value: f64) {
        self.quantities.insert(name.to_string(), value);
    }

    pub fn quantity(&self, name: &str) -> Option<f64> {
        self.quantities.get(name).copied()
    }
}

/// Derivative of `f^g` given both values and both derivatives.
pub(crate) fn power_derivative(f: f64, g: f64, df: f64, dg: f64) -> f64 {
    if dg == 0.0 {
        // Constant exponent: avoids ln(f) for negative bases.
        if df == 0.0 {
            return 0.0;
        }
        return g * f.powf(g - 1.0) * df;
    }
    if f.abs() < 1e-30 {
        return 0.0;
    }
    // d/dx (f^g) = f^g * (g' * ln(f) + g * f'/f)
    f.powf(g) * (dg * f.ln() + g * df / f)
}

impl Expr {
    /// Evaluate the expression in the given context.
    ///
    /// Unbound quantities evaluate to zero; callers that need strictness check
    /// [`Expr::quantities`] against the context first.
    pub fn eval(&self, ctx: &EvalContext) -> f64 {
        match self {
            Expr::Constant(v) => *v,
            Expr::Quantity { name } => ctx.quantity(name).unwrap_or(0.0),
            Expr::BinaryOp { op, left, right } => {
                let l = left.eval(ctx);
                let r = right.eval(ctx);
                match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => {
                        if r.abs() < 1e-30 {
                            if l >= 0.0 { 1e30 } else { -1e30 }
                        } else {
                            l / r
                        }
                    }
                    BinaryOp::Pow => l.powf(r),
                }
            }
            Expr::UnaryOp { op, operand } => {
                let v = operand.eval(ctx);
                match op {
                    UnaryOp::Neg => -v,
                }
            }
            Expr::Function { name, args } => {
                let arg_values: Vec<f64> = args.iter().map(|a| a.eval(ctx)).collect();
                eval_function(name, &arg_values)
            }
        }
    }

    /// Partial derivative with respect to the quantity `name`.
    ///
    /// Returns the symbolic derivative, evaluated at the given context.
    pub fn partial(&self, name: &str, ctx: &EvalContext) -> f64 {
        match self {
            Expr::Constant(_) => 0.0,
            Expr::Quantity { name: quantity } => {
                if quantity == name {
                    1.0
                } else {
                    0.0
                }
            }
            Expr::BinaryOp { op, left, right } => {
                let dl = left.partial(name, ctx);
                let dr = right.partial(name, ctx);
                match op {
                    BinaryOp::Add => dl + dr,
                    BinaryOp::Sub => dl - dr,
                    BinaryOp::Mul => dl * right.eval(ctx) + left.eval(ctx) * dr,
                    BinaryOp::Div => {
                        let l = left.eval(ctx);
                        let r = right.eval(ctx);
                        if r.abs() < 1e-30 {
                            0.0
                        } else {
                            (dl * r - l * dr) / (r * r)
                        }
                    }
                    BinaryOp::Pow => power_derivative(left.eval(ctx), right.eval(ctx), dl, dr),
                }
            }
            Expr::UnaryOp { op, operand } => {
                let d = operand.partial(name, ctx);
                match op {
                    UnaryOp::Neg => -d,
                }
            }
            Expr::Function { name: function, args } => {
                derivative_function(function, args, name, ctx)
            }
        }
    }

    /// Check if this expression contains quantity references.
    pub fn references_quantities(&self) -> bool {
        match self {
            Expr::Constant(_) => false,
            Expr::Quantity { .. } => true,
            Expr::BinaryOp { left, right, .. } => {
                left.references_quantities() || right.references_quantities()
            }
            Expr::UnaryOp { operand, .. } => operand.references_quantities(),
            Expr::Function { args, .. } => args.iter().any(|a| a.references_quantities()),
        }
    }

    /// All quantity names referenced, sorted and deduplicated.
    pub fn quantities(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_quantities(&mut names);
        names.sort();
        names.dedup();
        names
    }

    fn collect_quantities(&self, names: &mut Vec<String>) {
        match self {
            Expr::Quantity { name } => names.push(name.clone()),
            Expr::BinaryOp { left, right, .. } => {
                left.collect_quantities(names);
                right.collect_quantities(names);
            }
            Expr::UnaryOp { operand, .. } => operand.collect_quantities(names),
            Expr::Function { args, .. } => {
                for arg in args {
                    arg.collect_quantities(names);
                }
            }
            Expr::Constant(_) => {}
        }
    }
}
