use crate::error::{GpError, Result};

/// Feature rows and their targets. `features[i][j]` feeds variable `j`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub features: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
}

impl Dataset {
    pub fn new(features: Vec<Vec<f64>>, targets: Vec<f64>) -> Result<Self> {
        if features.len() != targets.len() {
            return Err(GpError::DataLoading(format!(
                "{} feature rows but {} targets",
                features.len(),
                targets.len()
            )));
        }

        if let Some(width) = features.first().map(Vec::len) {
            if let Some(bad) = features.iter().position(|row| row.len() != width) {
                return Err(GpError::DataLoading(format!(
                    "Row {} has {} features, expected {}",
                    bad,
                    features[bad].len(),
                    width
                )));
            }
        }

        Ok(Self { features, targets })
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn num_features(&self) -> usize {
        self.features.first().map(Vec::len).unwrap_or(0)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&[f64], f64)> {
        self.features
            .iter()
            .map(Vec::as_slice)
            .zip(self.targets.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_ragged_rows() {
        assert!(Dataset::new(vec![vec![1.0, 2.0], vec![3.0]], vec![0.0, 1.0]).is_err());
        assert!(Dataset::new(vec![vec![1.0]], vec![0.0, 1.0]).is_err());
    }

    #[test]
    fn test_rows() {
        let data = Dataset::new(vec![vec![1.0, 2.0], vec![3.0, 4.0]], vec![5.0, 6.0]).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.num_features(), 2);
        let rows: Vec<_> = data.rows().collect();
        assert_eq!(rows[1], (&[3.0, 4.0][..], 6.0));
    }
}
