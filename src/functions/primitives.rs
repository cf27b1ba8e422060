use crate::functions::traits::{InfixForm, Primitive};

// --- Arithmetic ---
pub struct Add;
impl Primitive for Add {
    fn alias(&self) -> &'static str { "add" }
    fn arity(&self) -> usize { 2 }
    fn infix(&self) -> InfixForm { InfixForm::Binary { symbol: "+", precedence: 1 } }
    fn execute(&self, args: &[f64]) -> f64 {
        args[0] + args[1]
    }
}

pub struct Sub;
impl Primitive for Sub {
    fn alias(&self) -> &'static str { "sub" }
    fn arity(&self) -> usize { 2 }
    fn infix(&self) -> InfixForm { InfixForm::Binary { symbol: "-", precedence: 1 } }
    fn execute(&self, args: &[f64]) -> f64 {
        args[0] - args[1]
    }
}

pub struct Mul;
impl Primitive for Mul {
    fn alias(&self) -> &'static str { "mul" }
    fn arity(&self) -> usize { 2 }
    fn infix(&self) -> InfixForm { InfixForm::Binary { symbol: "*", precedence: 2 } }
    fn execute(&self, args: &[f64]) -> f64 {
        args[0] * args[1]
    }
}

// --- Protected operators ---
pub struct ProtectDiv;
impl Primitive for ProtectDiv {
    fn alias(&self) -> &'static str { "protect_div" }
    fn arity(&self) -> usize { 2 }
    fn infix(&self) -> InfixForm { InfixForm::Binary { symbol: "/", precedence: 2 } }
    fn execute(&self, args: &[f64]) -> f64 {
        protect_div(args[0], args[1])
    }
}

pub struct ProtectSqrt;
impl Primitive for ProtectSqrt {
    fn alias(&self) -> &'static str { "protect_sqrt" }
    fn arity(&self) -> usize { 1 }
    fn infix(&self) -> InfixForm { InfixForm::Function { name: "sqrt" } }
    fn execute(&self, args: &[f64]) -> f64 {
        protect_sqrt(args[0])
    }
}

// --- Unary ---
pub struct Neg;
impl Primitive for Neg {
    fn alias(&self) -> &'static str { "neg" }
    fn arity(&self) -> usize { 1 }
    fn infix(&self) -> InfixForm { InfixForm::Prefix { symbol: "-" } }
    fn execute(&self, args: &[f64]) -> f64 {
        -args[0]
    }
}

pub struct Sin;
impl Primitive for Sin {
    fn alias(&self) -> &'static str { "sin" }
    fn arity(&self) -> usize { 1 }
    fn infix(&self) -> InfixForm { InfixForm::Function { name: "sin" } }
    fn execute(&self, args: &[f64]) -> f64 {
        args[0].sin()
    }
}

pub struct Cos;
impl Primitive for Cos {
    fn alias(&self) -> &'static str { "cos" }
    fn arity(&self) -> usize { 1 }
    fn infix(&self) -> InfixForm { InfixForm::Function { name: "cos" } }
    fn execute(&self, args: &[f64]) -> f64 {
        args[0].cos()
    }
}

pub struct Square;
impl Primitive for Square {
    fn alias(&self) -> &'static str { "square" }
    fn arity(&self) -> usize { 1 }
    fn infix(&self) -> InfixForm { InfixForm::Function { name: "square" } }
    fn execute(&self, args: &[f64]) -> f64 {
        square(args[0])
    }
}

/// `x / y`, or `1` when the divisor is exactly zero.
pub fn protect_div(x: f64, y: f64) -> f64 {
    if y != 0.0 {
        x / y
    } else {
        1.0
    }
}

/// `sqrt(x)`, or `0` for negative input.
pub fn protect_sqrt(x: f64) -> f64 {
    if x >= 0.0 {
        x.sqrt()
    } else {
        0.0
    }
}

pub fn square(x: f64) -> f64 {
    x.powi(2)
}
