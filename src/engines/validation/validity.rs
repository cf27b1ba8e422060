//! Real-value sanity check for LLM-produced infix expressions.
//!
//! The expression is read symbolically, `square(x)` is taken as `x ** 2` and
//! `sqrt(x)` as a protected root that yields a tiny positive constant for a
//! negative argument. The variables are then substituted with a fixed sample
//! point and the expression is accepted only if the result is a finite real
//! number. Anything that would leave the reals (division by zero, a negative
//! base under a fractional power, the log of a non-positive number) rejects
//! the expression.

use crate::engines::generation::infix::{parse_infix, BinaryOp, InfixExpr};
use crate::error::ValidationFailure;

/// Values substituted for the input variables.
pub const SAMPLE_POINT: [(&str, f64); 2] = [("x1", 1.1), ("x2", 1.2)];

/// What the protected root returns for a negative argument.
pub const PROTECTED_ROOT_FLOOR: f64 = 1e-6;

/// Value of `text` at the sample point, or why it is not usable.
pub fn check_expression(text: &str) -> Result<f64, ValidationFailure> {
    let parsed =
        parse_infix(text, true).map_err(|e| ValidationFailure::Unparsable(e.to_string()))?;

    value_at_sample(&parsed)
}

/// True when `text` evaluates to a real number at the sample point.
/// Never fails: every problem simply makes the expression invalid.
pub fn is_valid(text: &str) -> bool {
    match check_expression(text) {
        Ok(_) => true,
        Err(e) => {
            log::debug!("Rejected expression {:?}: {}", text, e);
            false
        }
    }
}

fn real(value: f64, context: &str) -> Result<f64, ValidationFailure> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationFailure::NonReal(context.to_string()))
    }
}

fn value_at_sample(expr: &InfixExpr) -> Result<f64, ValidationFailure> {
    match expr {
        InfixExpr::Number(n) => Ok(n.value()),
        InfixExpr::Name(name) => lookup(name),
        InfixExpr::Neg(inner) => Ok(-value_at_sample(inner)?),
        InfixExpr::Binary { op, lhs, rhs } => {
            let a = value_at_sample(lhs)?;
            let b = value_at_sample(rhs)?;
            match op {
                BinaryOp::Add => real(a + b, "sum overflows"),
                BinaryOp::Sub => real(a - b, "difference overflows"),
                BinaryOp::Mul => real(a * b, "product overflows"),
                BinaryOp::Div => {
                    if b == 0.0 {
                        return Err(ValidationFailure::NonReal("division by zero".to_string()));
                    }
                    real(a / b, "quotient overflows")
                }
                BinaryOp::Pow => power(a, b),
            }
        }
        InfixExpr::Call { name, args } => {
            let values = args.iter().map(value_at_sample).collect::<Result<Vec<f64>, _>>()?;
            call(name, &values)
        }
    }
}

fn lookup(name: &str) -> Result<f64, ValidationFailure> {
    if let Some((_, value)) = SAMPLE_POINT.iter().find(|(var, _)| *var == name) {
        return Ok(*value);
    }
    match name {
        "pi" => Ok(std::f64::consts::PI),
        "E" => Ok(std::f64::consts::E),
        _ => Err(ValidationFailure::UnknownSymbol(name.to_string())),
    }
}

fn power(base: f64, exponent: f64) -> Result<f64, ValidationFailure> {
    if base < 0.0 && exponent.fract() != 0.0 {
        return Err(ValidationFailure::NonReal(format!(
            "({}) ** {} is complex",
            base, exponent
        )));
    }
    if base == 0.0 && exponent < 0.0 {
        return Err(ValidationFailure::NonReal("zero to a negative power".to_string()));
    }
    real(base.powf(exponent), "power overflows")
}

fn call(name: &str, args: &[f64]) -> Result<f64, ValidationFailure> {
    let arg = match args {
        [x] => *x,
        _ => {
            return Err(ValidationFailure::Unparsable(format!(
                "{} takes one argument, got {}",
                name,
                args.len()
            )))
        }
    };

    match name {
        "sqrt" => {
            if arg < 0.0 {
                Ok(PROTECTED_ROOT_FLOOR)
            } else {
                Ok(arg.sqrt())
            }
        }
        // An integer power: a negative base stays real.
        "square" => real(arg * arg, "square overflows"),
        "sin" => Ok(arg.sin()),
        "cos" => Ok(arg.cos()),
        "tan" => real(arg.tan(), "tangent is unbounded"),
        "abs" => Ok(arg.abs()),
        "exp" => real(arg.exp(), "exponential overflows"),
        "log" => {
            if arg <= 0.0 {
                return Err(ValidationFailure::NonReal(format!("log({})", arg)));
            }
            Ok(arg.ln())
        }
        _ => Err(ValidationFailure::UnknownSymbol(name.to_string())),
    }
}
