use crate::engines::generation::ast::ExprTree;
use crate::error::{GpError, Result};
use crate::functions::PrimitiveSet;
use crate::types::{AstNode, Individual};
use rand::Rng;

/// Tournament selection: pick best (lowest error) of K random candidates
pub fn tournament_selection<R: Rng + ?Sized>(
    population: &[Individual],
    tournament_size: usize,
    rng: &mut R,
) -> Individual {
    let mut best_idx = rng.gen_range(0..population.len());
    let mut best_fitness = population[best_idx].rank_key();

    for _ in 1..tournament_size {
        let idx = rng.gen_range(0..population.len());
        if population[idx].rank_key() < best_fitness {
            best_idx = idx;
            best_fitness = population[idx].rank_key();
        }
    }

    population[best_idx].clone()
}

/// The `k` lowest-error individuals, best first. Stable for ties.
pub fn select_best(population: &[Individual], k: usize) -> Vec<Individual> {
    let mut sorted = population.to_vec();
    sorted.sort_by(|a, b| a.rank_key().total_cmp(&b.rank_key()));
    sorted.truncate(k);
    sorted
}

/// How a random tree is grown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeShape {
    /// Every branch reaches the drawn height.
    Full,
    /// Branches may stop early once past the minimum depth.
    Grow,
    /// A fair coin picks `Full` or `Grow` per tree.
    HalfAndHalf,
}

/// Generate random tree with a height drawn uniformly from `min_depth..=max_depth`
pub fn random_tree<R: Rng + ?Sized>(
    pset: &PrimitiveSet,
    min_depth: usize,
    max_depth: usize,
    shape: TreeShape,
    rng: &mut R,
) -> Result<ExprTree> {
    if min_depth > max_depth {
        return Err(GpError::Configuration(format!(
            "min depth {} exceeds max depth {}",
            min_depth, max_depth
        )));
    }

    let shape = match shape {
        TreeShape::HalfAndHalf => {
            if rng.gen::<bool>() {
                TreeShape::Full
            } else {
                TreeShape::Grow
            }
        }
        other => other,
    };

    let height = rng.gen_range(min_depth..=max_depth);
    let root = grow_node(pset, shape, height, min_depth, 0, rng)?;
    Ok(ExprTree::new(root))
}

fn grow_node<R: Rng + ?Sized>(
    pset: &PrimitiveSet,
    shape: TreeShape,
    height: usize,
    min_depth: usize,
    depth: usize,
    rng: &mut R,
) -> Result<AstNode> {
    let stop = match shape {
        TreeShape::Full => depth == height,
        _ => depth == height || (depth >= min_depth && rng.gen::<f64>() < pset.terminal_ratio()),
    };

    if stop {
        return pset.random_terminal(rng);
    }

    let primitive = match pset.random_primitive(rng) {
        Some(p) => p.clone(),
        None => return pset.random_terminal(rng),
    };

    let args = (0..primitive.arity())
        .map(|_| grow_node(pset, shape, height, min_depth, depth + 1, rng))
        .collect::<Result<Vec<_>>>()?;

    Ok(AstNode::Call {
        function: primitive.alias().to_string(),
        args,
    })
}

/// Ok when `tree` fits under `limit`.
pub fn check_height(tree: &ExprTree, limit: usize) -> Result<()> {
    let height = tree.height();
    if height > limit {
        return Err(GpError::StructuralLimitViolation { height, limit });
    }
    Ok(())
}

/// Keeps `candidate` if it fits under `limit`, otherwise falls back to `original`.
pub fn static_limit(candidate: ExprTree, original: &ExprTree, limit: usize) -> ExprTree {
    match check_height(&candidate, limit) {
        Ok(()) => candidate,
        Err(e) => {
            log::debug!("Reverting offspring: {}", e);
            original.clone()
        }
    }
}

/// Subtree crossover: swap one random non-root subtree of each parent.
///
/// Each child that ends up taller than `height_limit` is replaced by its own
/// parent. Single-node parents pass through unchanged.
pub fn crossover<R: Rng + ?Sized>(
    parent1: &ExprTree,
    parent2: &ExprTree,
    height_limit: usize,
    rng: &mut R,
) -> (ExprTree, ExprTree) {
    if parent1.size() < 2 || parent2.size() < 2 {
        return (parent1.clone(), parent2.clone());
    }

    let point1 = rng.gen_range(1..parent1.size());
    let point2 = rng.gen_range(1..parent2.size());

    let (donor1, donor2) = match (parent1.subtree(point1), parent2.subtree(point2)) {
        (Some(a), Some(b)) => (a, b),
        _ => return (parent1.clone(), parent2.clone()),
    };

    let child1 = parent1.with_subtree(point1, donor2);
    let child2 = parent2.with_subtree(point2, donor1);

    (
        static_limit(child1, parent1, height_limit),
        static_limit(child2, parent2, height_limit),
    )
}

/// Subtree mutation: replace one random node with a fresh `Full` tree whose
/// height is drawn from `min_depth..=max_depth`.
pub fn mutate<R: Rng + ?Sized>(
    tree: &ExprTree,
    pset: &PrimitiveSet,
    min_depth: usize,
    max_depth: usize,
    height_limit: usize,
    rng: &mut R,
) -> ExprTree {
    let point = rng.gen_range(0..tree.size());
    let replacement = match random_tree(pset, min_depth, max_depth, TreeShape::Full, rng) {
        Ok(t) => t,
        Err(e) => {
            log::warn!("Mutation skipped: {}", e);
            return tree.clone();
        }
    };

    let mutant = tree.with_subtree(point, &replacement.root);
    static_limit(mutant, tree, height_limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_full_trees_reach_drawn_height() {
        let pset = PrimitiveSet::standard();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let tree = random_tree(&pset, 2, 2, TreeShape::Full, &mut rng).unwrap();
            assert_eq!(tree.height(), 2);
            pset.check(&tree.root).unwrap();
        }
    }

    #[test]
    fn test_half_and_half_bounds() {
        let pset = PrimitiveSet::standard();
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..200 {
            let tree = random_tree(&pset, 1, 3, TreeShape::HalfAndHalf, &mut rng).unwrap();
            assert!(tree.height() <= 3);
        }
    }

    #[test]
    fn test_inverted_depth_range_is_rejected() {
        let pset = PrimitiveSet::standard();
        let mut rng = StdRng::seed_from_u64(3);
        assert!(random_tree(&pset, 3, 1, TreeShape::Grow, &mut rng).is_err());
    }

    #[test]
    fn test_crossover_respects_height_limit() {
        let pset = PrimitiveSet::standard();
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..300 {
            let a = random_tree(&pset, 2, 6, TreeShape::HalfAndHalf, &mut rng).unwrap();
            let b = random_tree(&pset, 2, 6, TreeShape::HalfAndHalf, &mut rng).unwrap();
            let (c1, c2) = crossover(&a, &b, 6, &mut rng);
            assert!(c1.height() <= 6);
            assert!(c2.height() <= 6);
        }
    }

    #[test]
    fn test_crossover_single_node_passthrough() {
        let pset = PrimitiveSet::standard();
        let mut rng = StdRng::seed_from_u64(5);
        let leaf = ExprTree::parse("x1", &pset).unwrap();
        let other = ExprTree::parse("add(x1, x2)", &pset).unwrap();
        let (c1, c2) = crossover(&leaf, &other, 6, &mut rng);
        assert_eq!(c1, leaf);
        assert_eq!(c2, other);
    }

    #[test]
    fn test_mutation_reverts_when_too_tall() {
        let pset = PrimitiveSet::standard();
        let mut rng = StdRng::seed_from_u64(6);
        let tall = ExprTree::parse("neg(neg(neg(neg(neg(neg(x1))))))", &pset).unwrap();
        assert_eq!(tall.height(), 6);
        for _ in 0..100 {
            let mutant = mutate(&tall, &pset, 1, 2, 6, &mut rng);
            assert!(mutant.height() <= 6);
        }
    }

    #[test]
    fn test_static_limit() {
        let pset = PrimitiveSet::standard();
        let original = ExprTree::parse("x1", &pset).unwrap();
        let tall = ExprTree::parse("sin(cos(x1))", &pset).unwrap();
        assert_eq!(static_limit(tall.clone(), &original, 1), original);
        assert_eq!(static_limit(tall.clone(), &original, 2), tall);
        assert!(matches!(
            check_height(&tall, 1),
            Err(GpError::StructuralLimitViolation { height: 2, limit: 1 })
        ));
    }

    #[test]
    fn test_tournament_prefers_lower_error() {
        let pset = PrimitiveSet::standard();
        let mut population: Vec<Individual> = ["x1", "x2", "1"]
            .iter()
            .map(|t| Individual::new(ExprTree::parse(t, &pset).unwrap()))
            .collect();
        population[0].fitness = Some(3.0);
        population[1].fitness = Some(0.5);
        population[2].fitness = Some(9.0);

        let mut rng = StdRng::seed_from_u64(7);
        // A tournament as large as a few hundred draws always sees the best.
        let winner = tournament_selection(&population, 300, &mut rng);
        assert_eq!(winner.expression, "x2");

        let best = select_best(&population, 2);
        assert_eq!(best[0].expression, "x2");
        assert_eq!(best[1].expression, "x1");
    }
}
