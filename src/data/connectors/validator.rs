use crate::error::{GpError, Result};
use polars::prelude::*;

pub struct DataValidator;

impl DataValidator {
    /// Every column must be numeric and there must be at least one feature
    /// column besides the target.
    pub fn validate_numeric(df: &DataFrame) -> Result<()> {
        if df.width() < 2 {
            return Err(GpError::DataLoading(format!(
                "Need at least one feature column and a target, found {} columns",
                df.width()
            )));
        }

        for column in df.get_columns() {
            if !matches!(
                column.dtype(),
                DataType::Float64
                    | DataType::Float32
                    | DataType::Int64
                    | DataType::Int32
                    | DataType::UInt64
                    | DataType::UInt32
            ) {
                return Err(GpError::DataLoading(format!(
                    "Column '{}' must be numeric, found {:?}",
                    column.name(),
                    column.dtype()
                )));
            }
        }
        Ok(())
    }

    /// Check for minimum required rows
    pub fn validate_minimum_rows(df: &DataFrame, min_rows: usize) -> Result<()> {
        if df.height() < min_rows {
            return Err(GpError::DataLoading(format!(
                "Insufficient data: {} rows, minimum {} required",
                df.height(),
                min_rows
            )));
        }
        Ok(())
    }

    /// Columns holding nulls, with their null counts.
    pub fn check_nulls(df: &DataFrame) -> Vec<(String, usize)> {
        df.get_columns()
            .iter()
            .filter(|c| c.null_count() > 0)
            .map(|c| (c.name().to_string(), c.null_count()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn test_validate_good_data() {
        let df = df! {
            "x1" => &[1.0, 2.0, 3.0],
            "x2" => &[1, 2, 3],
            "y" => &[0.5, 0.25, 0.125],
        }
        .unwrap();

        assert!(DataValidator::validate_numeric(&df).is_ok());
        assert!(DataValidator::validate_minimum_rows(&df, 3).is_ok());
        assert!(DataValidator::validate_minimum_rows(&df, 4).is_err());
        assert!(DataValidator::check_nulls(&df).is_empty());
    }

    #[test]
    fn test_validate_text_column() {
        let df = df! {
            "x1" => &[1.0, 2.0],
            "label" => &["a", "b"],
        }
        .unwrap();

        assert!(DataValidator::validate_numeric(&df).is_err());
    }

    #[test]
    fn test_target_only_is_rejected() {
        let df = df! { "y" => &[1.0, 2.0] }.unwrap();
        assert!(DataValidator::validate_numeric(&df).is_err());
    }
}
