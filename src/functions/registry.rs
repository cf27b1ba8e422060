use crate::error::{GpError, ParseError, Result};
use crate::functions::{
    primitives::{Add, Cos, Mul, Neg, ProtectDiv, ProtectSqrt, Sin, Square, Sub},
    traits::Primitive,
};
use crate::types::{AstNode, Number};
use rand::Rng;
use std::{collections::HashMap, sync::Arc};

/// Terminal whose value is drawn fresh every time a tree picks it.
#[derive(Debug, Clone, PartialEq)]
pub struct EphemeralConstant {
    pub name: String,
    pub low: f64,
    pub high: f64,
    pub decimals: i32,
}

impl EphemeralConstant {
    pub fn new(name: impl Into<String>, low: f64, high: f64, decimals: i32) -> Self {
        Self {
            name: name.into(),
            low,
            high,
            decimals,
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Number {
        let raw = self.low + rng.gen::<f64>() * (self.high - self.low);
        let scale = 10f64.powi(self.decimals);
        Number::Float((raw * scale).round() / scale)
    }
}

/// The vocabulary a tree may be built from.
pub struct PrimitiveSet {
    primitives: Vec<Arc<dyn Primitive>>,
    by_alias: HashMap<String, usize>,
    variables: Vec<String>,
    constants: Vec<Number>,
    ephemeral: Option<EphemeralConstant>,
}

impl PrimitiveSet {
    pub fn new() -> Self {
        Self {
            primitives: Vec::new(),
            by_alias: HashMap::new(),
            variables: Vec::new(),
            constants: Vec::new(),
            ephemeral: None,
        }
    }

    /// `add, sub, mul, neg, protect_div, protect_sqrt, sin, cos, square` over
    /// `x1, x2`, the constants `-1, 1` and one ephemeral in `[0, 1]`.
    pub fn standard() -> Self {
        let mut pset = Self::new();
        pset.register_primitives();
        pset.add_variable("x1");
        pset.add_variable("x2");
        pset.set_ephemeral(EphemeralConstant::new("rand", 0.0, 1.0, 2));
        pset.add_constant(Number::Int(-1));
        pset.add_constant(Number::Int(1));
        pset
    }

    fn register_primitives(&mut self) {
        let primitives: Vec<Arc<dyn Primitive>> = vec![
            Arc::new(Add),
            Arc::new(Sub),
            Arc::new(Mul),
            Arc::new(Neg),
            Arc::new(ProtectDiv),
            Arc::new(ProtectSqrt),
            Arc::new(Sin),
            Arc::new(Cos),
            Arc::new(Square),
        ];

        for primitive in primitives {
            self.add_primitive(primitive);
        }
    }

    pub fn add_primitive(&mut self, primitive: Arc<dyn Primitive>) {
        self.by_alias
            .insert(primitive.alias().to_string(), self.primitives.len());
        self.primitives.push(primitive);
    }

    pub fn add_variable(&mut self, name: impl Into<String>) {
        self.variables.push(name.into());
    }

    pub fn add_constant(&mut self, value: Number) {
        self.constants.push(value);
    }

    pub fn set_ephemeral(&mut self, ephemeral: EphemeralConstant) {
        self.ephemeral = Some(ephemeral);
    }

    pub fn get_primitive(&self, alias: &str) -> Option<&Arc<dyn Primitive>> {
        self.by_alias.get(alias).map(|&i| &self.primitives[i])
    }

    pub fn primitives(&self) -> &[Arc<dyn Primitive>] {
        &self.primitives
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn constants(&self) -> &[Number] {
        &self.constants
    }

    pub fn ephemeral(&self) -> Option<&EphemeralConstant> {
        self.ephemeral.as_ref()
    }

    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v == name)
    }

    pub fn terminal_count(&self) -> usize {
        self.variables.len() + self.constants.len() + usize::from(self.ephemeral.is_some())
    }

    /// Share of terminals in the whole vocabulary; the grow strategy stops
    /// early with this probability.
    pub fn terminal_ratio(&self) -> f64 {
        let terminals = self.terminal_count() as f64;
        terminals / (terminals + self.primitives.len() as f64)
    }

    pub fn random_primitive<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Arc<dyn Primitive>> {
        if self.primitives.is_empty() {
            return None;
        }
        Some(&self.primitives[rng.gen_range(0..self.primitives.len())])
    }

    /// Uniform pick over variables, constants and the ephemeral slot.
    pub fn random_terminal<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<AstNode> {
        let total = self.terminal_count();
        if total == 0 {
            return Err(GpError::Configuration(
                "Primitive set has no terminals".to_string(),
            ));
        }

        let mut idx = rng.gen_range(0..total);
        if idx < self.variables.len() {
            return Ok(AstNode::Var(self.variables[idx].clone()));
        }
        idx -= self.variables.len();
        if let Some(ephemeral) = &self.ephemeral {
            if idx == 0 {
                return Ok(AstNode::Const(ephemeral.sample(rng)));
            }
            idx -= 1;
        }
        Ok(AstNode::Const(self.constants[idx]))
    }

    /// Checks that every call resolves and carries the right number of children.
    pub fn check(&self, node: &AstNode) -> std::result::Result<(), ParseError> {
        match node {
            AstNode::Call { function, args } => {
                let primitive = self
                    .get_primitive(function)
                    .ok_or_else(|| ParseError::UnknownOperator(function.clone()))?;

                if args.len() != primitive.arity() {
                    return Err(ParseError::ArityMismatch {
                        name: function.clone(),
                        expected: primitive.arity(),
                        actual: args.len(),
                    });
                }

                args.iter().try_for_each(|arg| self.check(arg))
            }
            AstNode::Var(name) => {
                if let Some(primitive) = self.get_primitive(name) {
                    return Err(ParseError::ArityMismatch {
                        name: name.clone(),
                        expected: primitive.arity(),
                        actual: 0,
                    });
                }
                match self.variable_index(name) {
                    Some(_) => Ok(()),
                    None => Err(ParseError::UnknownTerminal(name.clone())),
                }
            }
            AstNode::Const(_) => Ok(()),
        }
    }

    /// Numeric value of `node` for one input row (`row[i]` feeds variable `i`).
    pub fn evaluate(&self, node: &AstNode, row: &[f64]) -> Result<f64> {
        match node {
            AstNode::Const(number) => Ok(number.value()),
            AstNode::Var(name) => self
                .variable_index(name)
                .and_then(|i| row.get(i).copied())
                .ok_or_else(|| {
                    GpError::Evaluation(format!("No input column for variable {}", name))
                }),
            AstNode::Call { function, args } => {
                let primitive = self
                    .get_primitive(function)
                    .ok_or_else(|| ParseError::UnknownOperator(function.clone()))?;

                if args.len() != primitive.arity() {
                    return Err(ParseError::ArityMismatch {
                        name: function.clone(),
                        expected: primitive.arity(),
                        actual: args.len(),
                    }
                    .into());
                }

                let values = args
                    .iter()
                    .map(|arg| self.evaluate(arg, row))
                    .collect::<Result<Vec<f64>>>()?;

                Ok(primitive.execute(&values))
            }
        }
    }
}

impl Default for PrimitiveSet {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_registry_primitive_retrieval() {
        let pset = PrimitiveSet::standard();
        assert_eq!(pset.primitives().len(), 9);
        assert_eq!(pset.get_primitive("protect_div").unwrap().arity(), 2);
        assert_eq!(pset.get_primitive("square").unwrap().arity(), 1);
    }

    #[test]
    fn test_primitive_not_found() {
        let pset = PrimitiveSet::standard();
        assert!(pset.get_primitive("pow").is_none());
    }

    #[test]
    fn test_ephemeral_sample_range() {
        let ephemeral = EphemeralConstant::new("rand", 0.0, 1.0, 2);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let Number::Float(v) = ephemeral.sample(&mut rng) else {
                panic!("ephemeral must be a float literal");
            };
            assert!((0.0..=1.0).contains(&v));
            assert_eq!((v * 100.0).round() / 100.0, v);
        }
    }

    #[test]
    fn test_evaluate_uses_protection() {
        let pset = PrimitiveSet::standard();
        let node = AstNode::call(
            "add",
            vec![
                AstNode::call("protect_div", vec![AstNode::var("x1"), AstNode::int(0)]),
                AstNode::call("protect_sqrt", vec![AstNode::var("x2")]),
            ],
        );
        assert_eq!(pset.evaluate(&node, &[3.0, -4.0]).unwrap(), 1.0);
        assert_eq!(pset.evaluate(&node, &[3.0, 9.0]).unwrap(), 4.0);
    }

    #[test]
    fn test_check_rejects_arity_mismatch() {
        let pset = PrimitiveSet::standard();
        let node = AstNode::call("sin", vec![AstNode::var("x1"), AstNode::var("x2")]);
        assert!(matches!(
            pset.check(&node),
            Err(ParseError::ArityMismatch { expected: 1, actual: 2, .. })
        ));
        assert!(matches!(
            pset.check(&AstNode::var("x3")),
            Err(ParseError::UnknownTerminal(_))
        ));
        assert!(matches!(
            pset.check(&AstNode::var("cos")),
            Err(ParseError::ArityMismatch { expected: 1, actual: 0, .. })
        ));
    }

    #[test]
    fn test_terminal_ratio() {
        let pset = PrimitiveSet::standard();
        assert_eq!(pset.terminal_count(), 5);
        assert!((pset.terminal_ratio() - 5.0 / 14.0).abs() < 1e-12);
    }
}
