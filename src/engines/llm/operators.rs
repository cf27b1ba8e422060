use super::client::LlmClient;
use super::prompts::{
    choose_operators, crossover_prompt, generation_prompt, mutation_prompt, TerminalSet, TreeStyle,
};
use super::response::{extract_crossover, extract_generation, extract_mutation};
use crate::config::LlmConfig;
use crate::engines::generation::ast::ExprTree;
use crate::engines::generation::infix::{canonical_to_infix, infix_to_canonical};
use crate::engines::generation::operators::check_height;
use crate::error::Result;
use crate::functions::PrimitiveSet;
use rand::Rng;
use std::sync::Arc;

/// What a failed generation call yields instead of an expression.
pub const INVALID_EXPRESSION: &str = "0";

/// Generation, crossover and mutation performed by a language model.
///
/// Every operator is total: an unreachable client, an unreadable answer or
/// an expression that fails the validity check all resolve to a fixed
/// fallback (the sentinel, the parents or the original).
pub struct SemanticOperators {
    client: Arc<dyn LlmClient>,
    terminals: TerminalSet,
    pub generation_temperature: f64,
    pub crossover_temperature: f64,
    pub mutation_temperature: f64,
}

impl SemanticOperators {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self::from_config(client, &LlmConfig::default())
    }

    pub fn from_config(client: Arc<dyn LlmClient>, config: &LlmConfig) -> Self {
        Self {
            client,
            terminals: TerminalSet::standard(),
            generation_temperature: config.generation_temperature,
            crossover_temperature: config.crossover_temperature,
            mutation_temperature: config.mutation_temperature,
        }
    }

    pub fn terminals(&self) -> &TerminalSet {
        &self.terminals
    }

    fn ask(&self, prompt: &str, temperature: f64) -> Option<String> {
        match self.client.generate(prompt, temperature) {
            Ok(response) => Some(response.content),
            Err(e) => {
                log::warn!("LLM request failed: {}", e);
                None
            }
        }
    }

    /// One fresh infix expression, or [`INVALID_EXPRESSION`].
    pub fn generate_expression<R: Rng + ?Sized>(&mut self, rng: &mut R) -> String {
        self.terminals.refresh(rng);
        let operators = choose_operators(rng);
        let style = TreeStyle::random(rng);
        let prompt = generation_prompt(&operators, &self.terminals, style);

        let Some(content) = self.ask(&prompt, self.generation_temperature) else {
            return INVALID_EXPRESSION.to_string();
        };

        match extract_generation(&content) {
            Ok(expression) => {
                log::info!("LLM generated: {}", expression);
                expression
            }
            Err(e) => {
                log::debug!("Discarding generated expression: {}", e);
                INVALID_EXPRESSION.to_string()
            }
        }
    }

    /// `count` generation calls, sentinels included.
    pub fn collect_llm_generate_expressions<R: Rng + ?Sized>(
        &mut self,
        count: usize,
        rng: &mut R,
    ) -> Vec<String> {
        (0..count).map(|_| self.generate_expression(rng)).collect()
    }

    /// Two valid children, or the parents unchanged.
    pub fn llm_crossover_expressions(&self, parents: [String; 2]) -> [String; 2] {
        let prompt = crossover_prompt(&parents);
        let Some(content) = self.ask(&prompt, self.crossover_temperature) else {
            return parents;
        };

        match extract_crossover(&content) {
            Ok(children) => {
                log::debug!("LLM crossover: {:?} -> {:?}", parents, children);
                children
            }
            Err(e) => {
                log::debug!("Keeping crossover parents: {}", e);
                parents
            }
        }
    }

    /// A valid rewrite, or `expression` unchanged.
    pub fn llm_mutated_expressions(&self, expression: &str) -> String {
        let prompt = mutation_prompt(expression);
        let Some(content) = self.ask(&prompt, self.mutation_temperature) else {
            return expression.to_string();
        };

        match extract_mutation(&content) {
            Ok(mutant) => {
                log::debug!("LLM mutation: {} -> {}", expression, mutant);
                mutant
            }
            Err(e) => {
                log::debug!("Keeping original expression: {}", e);
                expression.to_string()
            }
        }
    }

    /// Crossover on trees: parents go out as infix text and the children
    /// come back through the canonical codec. A child that cannot be read
    /// back or that breaks `height_limit` returns both parents.
    pub fn crossover_trees(
        &self,
        parent1: &ExprTree,
        parent2: &ExprTree,
        pset: &PrimitiveSet,
        height_limit: usize,
    ) -> (ExprTree, ExprTree) {
        let parents = [
            canonical_to_infix(parent1, pset),
            canonical_to_infix(parent2, pset),
        ];
        let [child1, child2] = self.llm_crossover_expressions(parents.clone());
        if [&child1, &child2] == [&parents[0], &parents[1]] {
            return (parent1.clone(), parent2.clone());
        }

        match (
            infix_to_tree(&child1, pset, height_limit),
            infix_to_tree(&child2, pset, height_limit),
        ) {
            (Ok(a), Ok(b)) => (a, b),
            (Err(e), _) | (_, Err(e)) => {
                log::debug!("Crossover children rejected: {}", e);
                (parent1.clone(), parent2.clone())
            }
        }
    }

    /// Mutation on trees, falling back to `tree` like [`Self::crossover_trees`].
    pub fn mutate_tree(&self, tree: &ExprTree, pset: &PrimitiveSet, height_limit: usize) -> ExprTree {
        let original = canonical_to_infix(tree, pset);
        let mutant = self.llm_mutated_expressions(&original);
        if mutant == original {
            return tree.clone();
        }

        match infix_to_tree(&mutant, pset, height_limit) {
            Ok(t) => t,
            Err(e) => {
                log::debug!("Mutant rejected: {}", e);
                tree.clone()
            }
        }
    }
}

/// Infix text to a tree that fits the primitive set and the height limit.
pub fn infix_to_tree(text: &str, pset: &PrimitiveSet, height_limit: usize) -> Result<ExprTree> {
    let canonical = infix_to_canonical(text)?;
    let tree = ExprTree::parse(&canonical, pset)?;
    check_height(&tree, height_limit)?;
    Ok(tree)
}
