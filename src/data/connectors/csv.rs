use super::validator::DataValidator;
use crate::data::dataset::Dataset;
use crate::data::paths::RunPaths;
use crate::error::{GpError, Result};
use polars::prelude::*;
use std::path::Path;

/// Source of the train and hold-out splits of one experiment.
pub trait DatasetProvider {
    fn load(&self, paths: &RunPaths) -> Result<(Dataset, Dataset)>;
}

/// Reads `train_data` / `test_data` CSV files with a header row. All
/// columns but the last are features in variable order; the last is the target.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvConnector;

impl CsvConnector {
    /// Load CSV file into DataFrame
    pub fn read_frame<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
            .finish()
            .map_err(|e| GpError::DataLoading(format!("Failed to read CSV: {}", e)))?;

        Ok(df)
    }

    pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset> {
        let df = Self::read_frame(&path)?;
        log::debug!(
            "Loaded {} rows x {} columns from {}",
            df.height(),
            df.width(),
            path.as_ref().display()
        );
        Self::frame_to_dataset(&df)
    }

    pub fn frame_to_dataset(df: &DataFrame) -> Result<Dataset> {
        DataValidator::validate_numeric(df)?;
        DataValidator::validate_minimum_rows(df, 1)?;

        let null_report = DataValidator::check_nulls(df);
        if !null_report.is_empty() {
            return Err(GpError::DataLoading(format!(
                "Null values detected: {:?}",
                null_report
            )));
        }

        let mut columns = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            let cast = column.cast(&DataType::Float64)?;
            let values: Vec<f64> = cast.f64()?.into_no_null_iter().collect();
            columns.push(values);
        }

        let targets = columns.pop().unwrap_or_default();
        let features = (0..df.height())
            .map(|row| columns.iter().map(|col| col[row]).collect())
            .collect();

        Dataset::new(features, targets)
    }
}

impl DatasetProvider for CsvConnector {
    fn load(&self, paths: &RunPaths) -> Result<(Dataset, Dataset)> {
        let train = Self::load_dataset(&paths.train_data)?;
        let test = Self::load_dataset(&paths.test_data)?;
        if train.num_features() != test.num_features() {
            return Err(GpError::DataLoading(format!(
                "Train data has {} features but hold-out data has {}",
                train.num_features(),
                test.num_features()
            )));
        }
        Ok((train, test))
    }
}
