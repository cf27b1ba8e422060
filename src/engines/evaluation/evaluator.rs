use crate::data::Dataset;
use crate::engines::generation::ast::ExprTree;
use crate::error::GpError;
use crate::functions::PrimitiveSet;
use std::sync::Arc;

/// Scores one tree against the train and hold-out splits.
///
/// Must be pure: the fitness cache relies on identical trees getting
/// identical scores.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, tree: &ExprTree, train: &Dataset, test: &Dataset)
        -> anyhow::Result<(f64, f64)>;
}

impl<F> Evaluator for F
where
    F: Fn(&ExprTree, &Dataset, &Dataset) -> anyhow::Result<(f64, f64)> + Send + Sync,
{
    fn evaluate(
        &self,
        tree: &ExprTree,
        train: &Dataset,
        test: &Dataset,
    ) -> anyhow::Result<(f64, f64)> {
        self(tree, train, test)
    }
}

/// Mean squared error of the tree's output over each split.
pub struct MseEvaluator {
    pset: Arc<PrimitiveSet>,
}

impl MseEvaluator {
    pub fn new(pset: Arc<PrimitiveSet>) -> Self {
        Self { pset }
    }

    pub fn mse(&self, tree: &ExprTree, data: &Dataset) -> crate::error::Result<f64> {
        if data.is_empty() {
            return Err(GpError::Evaluation("Empty dataset".to_string()));
        }

        let mut total = 0.0;
        for (row, target) in data.rows() {
            let predicted = self.pset.evaluate(tree.as_node(), row)?;
            total += (predicted - target).powi(2);
        }

        let error = total / data.len() as f64;
        Ok(if error.is_finite() { error } else { f64::INFINITY })
    }
}

impl Evaluator for MseEvaluator {
    fn evaluate(
        &self,
        tree: &ExprTree,
        train: &Dataset,
        test: &Dataset,
    ) -> anyhow::Result<(f64, f64)> {
        Ok((self.mse(tree, train)?, self.mse(tree, test)?))
    }
}
