use crate::data::persistence::read_jsonl;
use crate::engines::generation::ast::ExprTree;
use crate::engines::llm::{infix_to_tree, SemanticOperators, INVALID_EXPRESSION};
use crate::error::Result;
use crate::functions::PrimitiveSet;
use rand::Rng;
use serde::Deserialize;
use std::path::Path;

/// Pre-parsed trees an initial population is sampled from.
#[derive(Debug, Clone, Default)]
pub struct SeedPool {
    trees: Vec<ExprTree>,
}

#[derive(Deserialize)]
struct SeedRecord {
    expression: String,
}

impl SeedPool {
    pub fn from_trees(trees: Vec<ExprTree>) -> Self {
        Self { trees }
    }

    /// Reads `{"expression": ...}` lines in infix or canonical form.
    /// Lines that fit neither the primitive set nor `height_limit` are skipped.
    pub fn from_jsonl<P: AsRef<Path>>(path: P, pset: &PrimitiveSet, height_limit: usize) -> Result<Self> {
        let records: Vec<SeedRecord> = read_jsonl(path)?;
        let total = records.len();
        let trees: Vec<ExprTree> = records
            .iter()
            .filter_map(|r| Self::read_expression(&r.expression, pset, height_limit))
            .collect();

        log::info!("Seed pool: kept {} of {} stored expressions", trees.len(), total);
        Ok(Self { trees })
    }

    /// Asks the model for `count` expressions; sentinels and expressions
    /// that do not convert are dropped.
    pub fn from_llm<R: Rng + ?Sized>(
        operators: &mut SemanticOperators,
        count: usize,
        pset: &PrimitiveSet,
        height_limit: usize,
        rng: &mut R,
    ) -> Self {
        let trees: Vec<ExprTree> = operators
            .collect_llm_generate_expressions(count, rng)
            .iter()
            .filter(|e| e.as_str() != INVALID_EXPRESSION)
            .filter_map(|e| Self::read_expression(e, pset, height_limit))
            .collect();

        log::info!("Seed pool: {} of {} generated expressions usable", trees.len(), count);
        Self { trees }
    }

    fn read_expression(text: &str, pset: &PrimitiveSet, height_limit: usize) -> Option<ExprTree> {
        match infix_to_tree(text, pset, height_limit) {
            Ok(tree) => Some(tree),
            Err(infix_err) => match ExprTree::parse(text, pset) {
                Ok(tree) if tree.height() <= height_limit => Some(tree),
                _ => {
                    log::debug!("Skipping seed {:?}: {}", text, infix_err);
                    None
                }
            },
        }
    }

    /// Uniform draw with replacement.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&ExprTree> {
        if self.trees.is_empty() {
            return None;
        }
        Some(&self.trees[rng.gen_range(0..self.trees.len())])
    }

    pub fn trees(&self) -> &[ExprTree] {
        &self.trees
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::persistence::write_jsonl;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    #[test]
    fn test_from_jsonl_skips_bad_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("init.jsonl");
        write_jsonl(
            &path,
            &[
                json!({"expression": "x1 + x2"}),
                json!({"expression": "mul(x1, x2)"}),
                json!({"expression": "x1 ** 2"}),
                json!({"expression": "tan(x1)"}),
            ],
        )
        .unwrap();

        let pset = PrimitiveSet::standard();
        let pool = SeedPool::from_jsonl(&path, &pset, 6).unwrap();
        let rendered: Vec<String> = pool.trees().iter().map(ExprTree::render).collect();
        assert_eq!(rendered, vec!["add(x1, x2)", "mul(x1, x2)"]);
    }

    #[test]
    fn test_sample_with_replacement() {
        let pset = PrimitiveSet::standard();
        let pool = SeedPool::from_trees(vec![ExprTree::parse("x1", &pset).unwrap()]);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..5 {
            assert_eq!(pool.sample(&mut rng).unwrap().render(), "x1");
        }
        assert!(SeedPool::default().sample(&mut rng).is_none());
    }
}
