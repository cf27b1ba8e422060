use crate::types::Individual;

use std::collections::HashSet;

/// Best individuals seen over a whole run, lowest error first.
pub struct HallOfFame {
    members: Vec<Individual>,
    max_size: usize,
    seen_expressions: HashSet<String>,
}

impl HallOfFame {
    pub fn new(max_size: usize) -> Self {
        Self {
            members: Vec::new(),
            max_size,
            seen_expressions: HashSet::new(),
        }
    }

    /// Attempt to add an evaluated individual
    pub fn try_add(&mut self, individual: &Individual) -> bool {
        let fitness = match individual.fitness {
            Some(f) => f,
            None => return false,
        };

        // Deduplication check
        if self.seen_expressions.contains(&individual.expression) {
            return false;
        }

        if self.members.len() >= self.max_size {
            match self.members.last() {
                Some(worst) if fitness < worst.rank_key() => {}
                _ => return false,
            }
        }

        self.members.push(individual.clone());
        self.seen_expressions.insert(individual.expression.clone());
        self.sort_and_trim();
        true
    }

    /// Offer every member of a freshly replaced population.
    pub fn update(&mut self, population: &[Individual]) {
        for individual in population {
            self.try_add(individual);
        }
    }

    fn sort_and_trim(&mut self) {
        // Stable: an earlier entry wins ties against a later one
        self.members
            .sort_by(|a, b| a.rank_key().total_cmp(&b.rank_key()));

        while self.members.len() > self.max_size {
            if let Some(removed) = self.members.pop() {
                self.seen_expressions.remove(&removed.expression);
            }
        }
    }

    pub fn best(&self) -> Option<&Individual> {
        self.members.first()
    }

    pub fn get_all(&self) -> &[Individual] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
