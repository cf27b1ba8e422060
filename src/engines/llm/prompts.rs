//! Prompt text for the three semantic operators.

use rand::seq::SliceRandom;
use rand::Rng;

/// Symbols the model may build expressions from.
pub const OPERATOR_VOCABULARY: [&str; 8] = ["+", "*", "-", "/", "sqrt", "square", "cos", "sin"];

pub const BINARY_OPERATORS: [&str; 4] = ["+", "-", "*", "/"];

pub const FIXED_TERMINALS: [&str; 4] = ["x1", "x2", "-1", "1"];

/// Terminals offered to the model: the fixed ones plus exactly one sampled
/// literal once [`TerminalSet::refresh`] has run.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalSet {
    fixed: Vec<String>,
    live_literal: Option<String>,
}

impl TerminalSet {
    pub fn new(fixed: Vec<String>) -> Self {
        Self {
            fixed,
            live_literal: None,
        }
    }

    pub fn standard() -> Self {
        Self::new(FIXED_TERMINALS.iter().map(|s| s.to_string()).collect())
    }

    /// Replaces the live literal with a fresh `round(U[0,1], 2)` draw.
    pub fn refresh<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &str {
        let value = (rng.gen_range(0.0..=1.0_f64) * 100.0).round() / 100.0;
        self.live_literal.insert(format!("{:?}", value))
    }

    pub fn live_literal(&self) -> Option<&str> {
        self.live_literal.as_deref()
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.fixed
            .iter()
            .map(String::as_str)
            .chain(self.live_literal.as_deref())
            .collect()
    }
}

impl Default for TerminalSet {
    fn default() -> Self {
        Self::standard()
    }
}

/// Shape the generated expression should imitate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeStyle {
    Full,
    Grow,
}

impl TreeStyle {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen::<f64>() < 0.5 {
            TreeStyle::Full
        } else {
            TreeStyle::Grow
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TreeStyle::Full => "fully-expanded tree (genFull)",
            TreeStyle::Grow => "random-growth tree (genGrow)",
        }
    }
}

/// Two to four distinct operators in random order, at least one binary.
pub fn choose_operators<R: Rng + ?Sized>(rng: &mut R) -> Vec<&'static str> {
    let count = rng.gen_range(2..=4);
    let mut ops: Vec<&'static str> = OPERATOR_VOCABULARY
        .choose_multiple(rng, count)
        .copied()
        .collect();
    ops.shuffle(rng);

    if !ops.iter().any(|op| BINARY_OPERATORS.contains(op)) {
        if let Some(op) = BINARY_OPERATORS.choose(rng) {
            ops.push(*op);
        }
    }
    ops
}

fn symbol_list<S: AsRef<str>>(symbols: &[S]) -> String {
    let quoted: Vec<&str> = symbols.iter().map(AsRef::as_ref).collect();
    serde_json::to_string(&quoted).unwrap_or_default()
}

pub fn generation_prompt(operators: &[&str], terminals: &TerminalSet, style: TreeStyle) -> String {
    format!(
        r#"You are a mathematical expression generator.
### Generation Rules
1. Randomly select 2 to 4 operators from the allowed set.
2. Shuffle the selected operators to ensure diverse orderings.
3. Construct an expression using the selected operators:
   - Use {style} style.
   - Ensure variation in operand placement.
### Selected Operators
{operators}
### Allowed Variables & Constants (`terminals`)
{terminals}
### Your Task
- Generate a unique expression using randomly selected operators.
- Ensure different structures in each response.
- Provide no additional text in response. Format output in JSON as {{"expression": "<expression>"}}
"#,
        style = style.description(),
        operators = symbol_list(operators),
        terminals = symbol_list(&terminals.symbols()),
    )
}

pub fn crossover_prompt(parents: &[String; 2]) -> String {
    format!(
        r#"You are given two mathematical expressions {parents}.

Your task is to recombine these two expressions by performing a single-point crossover, similar to the crossover operation in genetic programming.

Steps:
1. Randomly select one point in each expression.
2. Swap the segments before the selected points in each expression.
3. Combine the first part of the first expression with the second part of the second expression, and vice versa, to create two new expressions.

Please ensure the syntax of the expressions is valid and that the recombined expressions use only the existing terms and operators from the original expressions.

Provide no additional text in response. Format your output in JSON as: {{"expressions": ["<expression>", "<expression>"]}}
"#,
        parents = parents.join(" and "),
    )
}

pub fn mutation_prompt(expression: &str) -> String {
    format!(
        r#"The goal is to evolve the mathematical expression and create a new expression that differs in structure from the original but still follows mathematical principles.

Given the expression: {expression}

Use the listed symbols {symbols}.

Provide no additional text in response. Format output in JSON as {{"new_expression": "<new expression>"}}
"#,
        expression = expression,
        symbols = symbol_list(&OPERATOR_VOCABULARY),
    )
}
