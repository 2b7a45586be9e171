//! Dense and sparse query vectors

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Fixed-length embedding of a text (Value Object)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DenseVector(Vec<f32>);

impl DenseVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    fn scaled(&self, factor: f32) -> Self {
        Self(self.0.iter().map(|v| v * factor).collect())
    }
}

impl From<Vec<f32>> for DenseVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// Term-weight encoding of a text: parallel `indices` / `values` (Value Object)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SparseVector {
    indices: Vec<u32>,
    values: Vec<f32>,
}

impl SparseVector {
    pub fn new(indices: Vec<u32>, values: Vec<f32>) -> Result<Self, DomainError> {
        if indices.len() != values.len() {
            return Err(DomainError::SparseLengthMismatch {
                indices: indices.len(),
                values: values.len(),
            });
        }
        Ok(Self { indices, values })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    fn scaled(&self, factor: f32) -> Self {
        Self {
            indices: self.indices.clone(),
            values: self.values.iter().map(|v| v * factor).collect(),
        }
    }
}

/// Weight the dense and sparse signals against each other.
///
/// `alpha = 1.0` is pure dense search, `alpha = 0.0` pure keyword search.
pub fn hybrid_convex_scale(
    dense: &DenseVector,
    sparse: &SparseVector,
    alpha: f32,
) -> Result<(DenseVector, SparseVector), DomainError> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(DomainError::InvalidAlpha(alpha));
    }
    Ok((dense.scaled(alpha), sparse.scaled(1.0 - alpha)))
}
