/// How a primitive is written in ordinary infix math.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixForm {
    /// `a <symbol> b` with the given binding strength.
    Binary { symbol: &'static str, precedence: u8 },
    /// `-a`
    Prefix { symbol: &'static str },
    /// `name(a)`
    Function { name: &'static str },
}

/// Binding strength of unary functions and prefix operators.
pub const UNARY_PRECEDENCE: u8 = 4;
/// Binding strength of `**`.
pub const POWER_PRECEDENCE: u8 = 3;

/// Primitive function trait
pub trait Primitive: Send + Sync {
    /// Name used in canonical prefix text.
    fn alias(&self) -> &'static str;

    fn arity(&self) -> usize;

    fn infix(&self) -> InfixForm;

    /// Numeric semantics over scalars. Total: protected variants never fail.
    fn execute(&self, args: &[f64]) -> f64;

    fn precedence(&self) -> u8 {
        match self.infix() {
            InfixForm::Binary { precedence, .. } => precedence,
            InfixForm::Prefix { .. } | InfixForm::Function { .. } => UNARY_PRECEDENCE,
        }
    }
}
