use crate::preprocessing::tensor::Tensor;
use crate::shared::error::InferenceError;

/// Raw per-class model outputs, in model class order.
///
/// Not required to be a probability distribution; only the arg-max is used.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreVector(Vec<f32>);

impl ScoreVector {
    pub fn new(scores: Vec<f32>) -> Self {
        Self(scores)
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
}

impl From<Vec<f32>> for ScoreVector {
    fn from(scores: Vec<f32>) -> Self {
        Self(scores)
    }
}

/// Domain interface for expression classification.
///
/// One call at a time: `&mut self` keeps an instance on a single caller.
/// Low-confidence output is a valid result, never an error.
pub trait ExpressionModel: Send {
    fn run(&mut self, tensor: Tensor) -> Result<ScoreVector, InferenceError>;
}
