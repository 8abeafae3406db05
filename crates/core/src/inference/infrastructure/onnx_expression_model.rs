//! Expression classifier backed by an ONNX Runtime session.
//!
//! The artifact is memory-mapped and handed to the runtime as a byte slice,
//! so the file is read once at load time and never again.

use std::fs::File;
use std::path::Path;

use crate::inference::domain::expression_model::{ExpressionModel, ScoreVector};
use crate::preprocessing::tensor::{Tensor, TENSOR_CHANNELS};
use crate::shared::error::{InferenceError, ModelLoadError};

/// Intra-op worker threads for a single inference call.
pub const DEFAULT_INTRA_THREADS: usize = 4;

#[derive(Clone, Debug)]
pub struct InferenceOptions {
    /// Square input resolution the preprocessor produces.
    pub input_size: u32,
    /// Length every score vector must have.
    pub num_classes: usize,
    pub intra_threads: usize,
    /// Register the platform accelerator (CoreML / DirectML) when available.
    pub use_accelerator: bool,
}

impl InferenceOptions {
    pub fn new(input_size: u32, num_classes: usize) -> Self {
        Self {
            input_size,
            num_classes,
            intra_threads: DEFAULT_INTRA_THREADS,
            use_accelerator: true,
        }
    }
}

pub struct OnnxExpressionModel {
    session: ort::session::Session,
    input_size: u32,
    num_classes: usize,
}

impl OnnxExpressionModel {
    /// Map the artifact and build a session from it.
    ///
    /// When the model declares a static NHWC input shape, its spatial size
    /// must equal `options.input_size`.
    pub fn load(path: &Path, options: &InferenceOptions) -> Result<Self, ModelLoadError> {
        let mapped = map_artifact(path)?;

        let mut builder = ort::session::Session::builder()
            .map_err(backend_error(path))?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
            .map_err(backend_error(path))?
            .with_intra_threads(options.intra_threads.max(1))
            .map_err(backend_error(path))?;
        if options.use_accelerator {
            builder = builder
                .with_execution_providers(accelerator_providers())
                .map_err(backend_error(path))?;
        }
        let session = builder
            .commit_from_memory(&mapped)
            .map_err(backend_error(path))?;

        if let Some(declared) = declared_input_size(&session) {
            if declared != options.input_size {
                return Err(ModelLoadError::InputSize {
                    expected: declared,
                    configured: options.input_size,
                });
            }
        }

        log::info!(
            "Expression model loaded from {} ({} classes, {}x{} input)",
            path.display(),
            options.num_classes,
            options.input_size,
            options.input_size
        );

        Ok(Self {
            session,
            input_size: options.input_size,
            num_classes: options.num_classes,
        })
    }
}

impl ExpressionModel for OnnxExpressionModel {
    fn run(&mut self, tensor: Tensor) -> Result<ScoreVector, InferenceError> {
        let expected = Tensor::len_for(self.input_size);
        if tensor.len() != expected {
            return Err(InferenceError::TensorShape {
                expected,
                actual: tensor.len(),
            });
        }

        let input = tensor
            .into_nhwc()
            .map_err(|e| InferenceError::Backend(e.to_string()))?;
        let input_value = ort::value::Tensor::from_array(input)
            .map_err(|e| InferenceError::Backend(e.to_string()))?;
        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(|e| InferenceError::Backend(e.to_string()))?;
        if outputs.len() == 0 {
            return Err(InferenceError::NoOutput);
        }

        let scores: Vec<f32> = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| InferenceError::Backend(e.to_string()))?
            .iter()
            .copied()
            .collect();
        check_class_count(&scores, self.num_classes)?;

        Ok(ScoreVector::new(scores))
    }
}

fn check_class_count(scores: &[f32], expected: usize) -> Result<(), InferenceError> {
    if scores.len() != expected {
        return Err(InferenceError::ClassCount {
            expected,
            actual: scores.len(),
        });
    }
    Ok(())
}

fn map_artifact(path: &Path) -> Result<memmap2::Mmap, ModelLoadError> {
    if !path.exists() {
        return Err(ModelLoadError::NotFound(path.to_path_buf()));
    }
    let io_error = |source| ModelLoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_error)?;
    if file.metadata().map_err(io_error)?.len() == 0 {
        return Err(ModelLoadError::Empty(path.to_path_buf()));
    }
    // SAFETY: the mapping is read-only and dropped once the session is built.
    unsafe { memmap2::Mmap::map(&file) }.map_err(io_error)
}

fn backend_error<E: std::fmt::Display>(path: &Path) -> impl FnOnce(E) -> ModelLoadError + '_ {
    move |e| ModelLoadError::Backend {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// Spatial size from a static `[N, H, W, 3]` input, if the model declares one.
fn declared_input_size(session: &ort::session::Session) -> Option<u32> {
    session.inputs().first().and_then(|input| {
        if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
            if shape.len() == 4 && shape[3] == TENSOR_CHANNELS as i64 && shape[1] > 0 {
                Some(shape[1] as u32)
            } else {
                None
            }
        } else {
            None
        }
    })
}

fn accelerator_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_missing_file() {
        let result = OnnxExpressionModel::load(
            Path::new("/nonexistent/model.onnx"),
            &InferenceOptions::new(48, 7),
        );
        assert!(matches!(result, Err(ModelLoadError::NotFound(_))));
    }

    #[test]
    fn test_load_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.onnx");
        fs::write(&path, b"").unwrap();
        let result = OnnxExpressionModel::load(&path, &InferenceOptions::new(48, 7));
        assert!(matches!(result, Err(ModelLoadError::Empty(_))));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.onnx");
        fs::write(&path, b"definitely not a protobuf graph").unwrap();
        let mut options = InferenceOptions::new(48, 7);
        options.use_accelerator = false;
        let result = OnnxExpressionModel::load(&path, &options);
        assert!(matches!(result, Err(ModelLoadError::Backend { .. })));
    }

    #[test]
    fn test_class_count_check() {
        assert!(check_class_count(&[0.0; 7], 7).is_ok());
        assert!(matches!(
            check_class_count(&[0.0; 5], 7),
            Err(InferenceError::ClassCount {
                expected: 7,
                actual: 5
            })
        ));
    }

    #[test]
    fn test_default_options() {
        let o = InferenceOptions::new(48, 7);
        assert_eq!(o.intra_threads, DEFAULT_INTRA_THREADS);
        assert!(o.use_accelerator);
    }
}
