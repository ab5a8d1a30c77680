//! One-hot encoding of categorical fields into the model feature matrix
//!
//! Fit scans the TRAIN partition only; validation and test are transformed
//! with the same fitted state. Each field's vocabulary is its sorted distinct
//! values (sorted rather than first-seen so column order never depends on row
//! order or hasher seed). A value unseen at fit time encodes to an all-zero
//! block; it never errors and never grows the vocabulary.
//!
//! The output matrix is the concatenation of the one-hot blocks in schema
//! field order, followed by the numeric feature columns captured at fit time
//! (frame column order, excluding the timestamp and the target). Numeric
//! nulls surface as NaN.

use crate::error::{AirqualError, Result};
use crate::schema::{CATEGORICAL_FIELDS, TARGET_FIELD, TIMESTAMP_FIELD};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Fitted categorical encoder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// (field, sorted distinct values) in schema field order.
    vocabularies: Vec<(String, Vec<String>)>,
    /// Numeric columns appended after the one-hot blocks.
    numeric_fields: Vec<String>,
    is_fitted: bool,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit vocabularies and the numeric column list on the train partition.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        self.vocabularies.clear();
        self.numeric_fields.clear();

        for field in CATEGORICAL_FIELDS {
            let column = df
                .column(field)
                .map_err(|_| AirqualError::MissingColumn(field.to_string()))?;
            let ca = column.str().map_err(|e| AirqualError::DataError(e.to_string()))?;

            let mut seen: HashSet<&str> = HashSet::new();
            let mut distinct: Vec<String> = Vec::new();
            for value in ca.into_iter().flatten() {
                if seen.insert(value) {
                    distinct.push(value.to_string());
                }
            }
            distinct.sort();
            self.vocabularies.push((field.to_string(), distinct));
        }

        for column in df.get_columns() {
            let name = column.name().to_string();
            if name == TARGET_FIELD || name == TIMESTAMP_FIELD {
                continue;
            }
            let numeric = matches!(
                column.dtype(),
                DataType::Int8
                    | DataType::Int16
                    | DataType::Int32
                    | DataType::Int64
                    | DataType::UInt8
                    | DataType::UInt16
                    | DataType::UInt32
                    | DataType::UInt64
                    | DataType::Float32
                    | DataType::Float64
            );
            if numeric {
                self.numeric_fields.push(name);
            }
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Transform a partition into a dense feature matrix. Repeated calls on
    /// the same frame produce bit-identical output.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(AirqualError::ModelNotFitted);
        }

        let n = df.height();
        let width = self.width();

        // Per-field category indices, resolved once per column.
        let mut category_indices: Vec<Vec<Option<usize>>> = Vec::with_capacity(self.vocabularies.len());
        for (field, vocab) in &self.vocabularies {
            let column = df
                .column(field)
                .map_err(|_| AirqualError::MissingColumn(field.clone()))?;
            let ca = column.str().map_err(|e| AirqualError::DataError(e.to_string()))?;
            let indices = ca
                .into_iter()
                .map(|v| v.and_then(|s| vocab.binary_search_by(|x| x.as_str().cmp(s)).ok()))
                .collect();
            category_indices.push(indices);
        }

        let mut numeric_values: Vec<Vec<f64>> = Vec::with_capacity(self.numeric_fields.len());
        for field in &self.numeric_fields {
            let column = df
                .column(field)
                .map_err(|_| AirqualError::MissingColumn(field.clone()))?;
            let casted = column.cast(&DataType::Float64)?;
            let values = casted
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect();
            numeric_values.push(values);
        }

        let mut data = vec![0.0f64; n * width];
        for row in 0..n {
            let base = row * width;
            let mut offset = 0usize;

            for (field_idx, (_, vocab)) in self.vocabularies.iter().enumerate() {
                if let Some(idx) = category_indices[field_idx][row] {
                    data[base + offset + idx] = 1.0;
                }
                offset += vocab.len();
            }

            for values in &numeric_values {
                data[base + offset] = values[row];
                offset += 1;
            }
        }

        Array2::from_shape_vec((n, width), data).map_err(|e| AirqualError::ShapeError {
            expected: format!("{n} x {width}"),
            actual: e.to_string(),
        })
    }

    /// Column names aligned with the transform output.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.width());
        for (field, vocab) in &self.vocabularies {
            for value in vocab {
                names.push(format!("{field}_{value}"));
            }
        }
        names.extend(self.numeric_fields.iter().cloned());
        names
    }

    /// Total matrix width.
    pub fn width(&self) -> usize {
        let onehot: usize = self.vocabularies.iter().map(|(_, v)| v.len()).sum();
        onehot + self.numeric_fields.len()
    }
}
