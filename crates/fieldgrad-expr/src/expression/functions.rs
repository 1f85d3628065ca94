//! Built-in function evaluation and derivatives.

use super::eval::power_derivative;
use super::{EvalContext, Expr};

const FUNCTIONS: &[&str] = &[
    "SIN", "COS", "TAN", "ASIN", "ACOS", "ATAN", "ATAN2", "SINH", "COSH", "TANH", "EXP", "LOG",
    "LN", "LOG10", "SQRT", "POW", "ABS", "SGN", "SIGN", "MIN", "MAX", "LIMIT", "FLOOR", "CEIL",
    "ROUND", "IF",
];

/// Whether `name` is a built-in function (case-insensitive).
pub fn is_known_function(name: &str) -> bool {
    FUNCTIONS.contains(&name.to_uppercase().as_str())
}

/// Evaluate a built-in function.
pub fn eval_function(name: &str, args: &[f64]) -> f64 {
    let arg = |i: usize, default: f64| args.get(i).copied().unwrap_or(default);
    match name.to_uppercase().as_str() {
        // Trigonometric
        "SIN" => arg(0, 0.0).sin(),
        "COS" => arg(0, 0.0).cos(),
        "TAN" => arg(0, 0.0).tan(),
        "ASIN" => arg(0, 0.0).asin(),
        "ACOS" => arg(0, 0.0).acos(),
        "ATAN" => arg(0, 0.0).atan(),
        "ATAN2" => arg(0, 0.0).atan2(arg(1, 1.0)),
        "SINH" => arg(0, 0.0).sinh(),
        "COSH" => arg(0, 0.0).cosh(),
        "TANH" => arg(0, 0.0).tanh(),

        // Exponential/logarithmic
        "EXP" => arg(0, 0.0).exp(),
        "LOG" | "LN" => {
            let x = arg(0, 1.0);
            if x > 0.0 { x.ln() } else { -1e30 }
        }
        "LOG10" => {
            let x = arg(0, 1.0);
            if x > 0.0 { x.log10() } else { -1e30 }
        }
        "SQRT" => {
            let x = arg(0, 0.0);
            if x >= 0.0 { x.sqrt() } else { 0.0 }
        }
        "POW" => arg(0, 0.0).powf(arg(1, 1.0)),

        // Absolute value and sign
        "ABS" => arg(0, 0.0).abs(),
        "SGN" | "SIGN" => {
            let x = arg(0, 0.0);
            if x > 0.0 {
                1.0
            } else if x < 0.0 {
                -1.0
            } else {
                0.0
            }
        }

        "MIN" => args.iter().copied().fold(f64::INFINITY, f64::min),
        "MAX" => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),

        // limit(x, lo, hi) clamps x to [lo, hi]
        "LIMIT" => {
            let x = arg(0, 0.0);
            let lo = arg(1, f64::NEG_INFINITY);
            let hi = arg(2, f64::INFINITY);
            x.max(lo).min(hi)
        }

        "FLOOR" => arg(0, 0.0).floor(),
        "CEIL" => arg(0, 0.0).ceil(),
        "ROUND" => arg(0, 0.0).round(),

        // if(cond, then, else)
        "IF" => {
            if arg(0, 0.0) != 0.0 {
                arg(1, 0.0)
            } else {
                arg(2, 0.0)
            }
        }

        _ => 0.0,
    }
}

/// Partial derivative of a function call with respect to `quantity`.
pub fn derivative_function(name: &str, args: &[Expr], quantity: &str, ctx: &EvalContext) -> f64 {
    let name_upper = name.to_uppercase();

    // d/dq f(g(q)) = f'(g(q)) * g'(q)
    if args.len() == 1 {
        let dg = args[0].partial(quantity, ctx);
        if dg == 0.0 {
            return 0.0;
        }
        let g = args[0].eval(ctx);
        return single_arg_derivative(&name_upper, g) * dg;
    }

    multi_arg_derivative(&name_upper, args, quantity, ctx)
}

/// Derivative of single-argument functions.
fn single_arg_derivative(name: &str, g: f64) -> f64 {
    match name {
        "SIN" => g.cos(),
        "COS" => -g.sin(),
        "TAN" => 1.0 / g.cos().powi(2),
        "ASIN" => 1.0 / (1.0 - g * g).sqrt(),
        "ACOS" => -1.0 / (1.0 - g * g).sqrt(),
        "ATAN" => 1.0 / (1.0 + g * g),
        "SINH" => g.cosh(),
        "COSH" => g.sinh(),
        "TANH" => 1.0 / g.cosh().powi(2),
        "EXP" => g.exp(),
        "LOG" | "LN" => 1.0 / g,
        "LOG10" => 1.0 / (g * 10.0_f64.ln()),
        "SQRT" => {
            if g > 0.0 {
                0.5 / g.sqrt()
            } else {
                0.0
            }
        }
        "ABS" => {
            if g >= 0.0 {
                1.0
            } else {
                -1.0
            }
        }
        // Piecewise constant: zero almost everywhere.
        "SGN" | "SIGN" | "FLOOR" | "CEIL" | "ROUND" => 0.0,
        // Single-argument forms of the variadic functions are the identity.
        "MIN" | "MAX" => 1.0,
        _ => 0.0,
    }
}

/// Derivative of multi-argument functions.
fn multi_arg_derivative(name: &str, args: &[Expr], quantity: &str, ctx: &EvalContext) -> f64 {
    match name {
        "POW" if args.len() >= 2 => power_derivative(
            args[0].eval(ctx),
            args[1].eval(ctx),
            args[0].partial(quantity, ctx),
            args[1].partial(quantity, ctx),
        ),
        "ATAN2" if args.len() >= 2 => {
            let y = args[0].eval(ctx);
            let x = args[1].eval(ctx);
            let dy = args[0].partial(quantity, ctx);
            let dx = args[1].partial(quantity, ctx);
            let r2 = x * x + y * y;
            if r2 < 1e-30 {
                return 0.0;
            }
            (x * dy - y * dx) / r2
        }
        "MIN" | "MAX" if !args.is_empty() => {
            // Derivative of the selected argument
            let values = args.iter().map(|a| a.eval(ctx)).enumerate();
            let selected = if name == "MIN" {
                values.min_by(|a, b| a.1.total_cmp(&b.1))
            } else {
                values.max_by(|a, b| a.1.total_cmp(&b.1))
            };
            selected
                .map(|(idx, _)| args[idx].partial(quantity, ctx))
                .unwrap_or(0.0)
        }
        "IF" if args.len() >= 3 => {
            if args[0].eval(ctx) != 0.0 {
                args[1].partial(quantity, ctx)
            } else {
                args[2].partial(quantity, ctx)
            }
        }
        "LIMIT" if args.len() >= 3 => {
            let x = args[0].eval(ctx);
            let lo = args[1].eval(ctx);
            let hi = args[2].eval(ctx);
            if x < lo || x > hi {
                0.0
            } else {
                args[0].partial(quantity, ctx)
            }
        }
        _ => 0.0,
    }
}
