use serde::{Deserialize, Serialize};
use std::fmt;

use crate::engines::generation::ast::ExprTree;

/// Numeric literal carried by a terminal node.
///
/// Integer and float literals are kept apart so that `1` (a fixed constant)
/// and `1.0` (a sampled ephemeral value) render back to the text they were
/// read from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn value(&self) -> f64 {
        match self {
            Number::Int(i) => *i as f64,
            Number::Float(f) => *f,
        }
    }

    pub fn is_negative(&self) -> bool {
        self.value() < 0.0
    }

    /// Reads a literal token: no `.`/exponent means integer.
    pub fn parse_token(token: &str) -> Option<Number> {
        let is_float = token.contains(['.', 'e', 'E']);
        if is_float {
            token.parse::<f64>().ok().filter(|v| v.is_finite()).map(Number::Float)
        } else {
            token.parse::<i64>().ok().map(Number::Int)
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(v) => write!(f, "{:?}", v),
        }
    }
}

/// Expression tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AstNode {
    Call {
        function: String,
        args: Vec<AstNode>,
    },
    Var(String),
    Const(Number),
}

impl AstNode {
    pub fn call(function: impl Into<String>, args: Vec<AstNode>) -> Self {
        AstNode::Call {
            function: function.into(),
            args,
        }
    }

    pub fn var(name: impl Into<String>) -> Self {
        AstNode::Var(name.into())
    }

    pub fn int(value: i64) -> Self {
        AstNode::Const(Number::Int(value))
    }

    pub fn float(value: f64) -> Self {
        AstNode::Const(Number::Float(value))
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AstNode::Call { .. })
    }

    /// Edge count of the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        match self {
            AstNode::Call { args, .. } => {
                1 + args.iter().map(AstNode::height).max().unwrap_or(0)
            }
            _ => 0,
        }
    }

    pub fn size(&self) -> usize {
        match self {
            AstNode::Call { args, .. } => 1 + args.iter().map(AstNode::size).sum::<usize>(),
            _ => 1,
        }
    }
}

/// A scored (or not yet scored) member of the population.
#[derive(Debug, Clone)]
pub struct Individual {
    pub tree: ExprTree,
    /// Canonical prefix text, the cache key.
    pub expression: String,
    /// Error on the training set; `None` until evaluated.
    pub fitness: Option<f64>,
}

impl Individual {
    pub fn new(tree: ExprTree) -> Self {
        let expression = tree.render();
        Self {
            tree,
            expression,
            fitness: None,
        }
    }

    /// Swaps in a varied tree and forgets the stale fitness.
    pub fn replace_tree(&mut self, tree: ExprTree) {
        self.expression = tree.render();
        self.tree = tree;
        self.fitness = None;
    }

    /// Fitness used for ranking; unevaluated individuals rank last.
    pub fn rank_key(&self) -> f64 {
        self.fitness.unwrap_or(f64::INFINITY)
    }

    pub fn height(&self) -> usize {
        self.tree.height()
    }
}

/// One line of the results log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation: usize,
    pub expression: String,
    #[serde(with = "fitness_serde")]
    pub train_fitness: f64,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "optional_fitness_serde"
    )]
    pub test_fitness: Option<f64>,
}

/// JSON has no infinity; non-finite fitness is written as `null` and read back as `+inf`.
pub mod fitness_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

pub mod optional_fitness_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => super::fitness_serde::serialize(v, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        Ok(Some(
            Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY),
        ))
    }
}
