use crate::data::persistence::{read_json, write_json};
use crate::error::Result;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Canonical expression text -> fitness, for one run and one data split.
///
/// Entries are only ever inserted. On disk the map is a JSON object with
/// sorted keys; non-finite fitness is stored as `null` and read back as `+inf`.
#[derive(Debug, Clone, Default)]
pub struct FitnessCache {
    data: HashMap<String, f64>,
}

impl FitnessCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Missing file means an empty cache.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let stored: BTreeMap<String, Option<f64>> = read_json(path)?.unwrap_or_default();
        let data = stored
            .into_iter()
            .map(|(k, v)| (k, v.unwrap_or(f64::INFINITY)))
            .collect();
        Ok(Self { data })
    }

    /// Overwrites `path` with the full cache.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let stored: BTreeMap<&str, Option<f64>> = self
            .data
            .iter()
            .map(|(k, v)| (k.as_str(), v.is_finite().then_some(*v)))
            .collect();
        write_json(path, &stored)
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.data.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn insert(&mut self, key: String, fitness: f64) {
        self.data.insert(key, fitness);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
