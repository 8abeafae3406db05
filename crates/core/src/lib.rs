//! Real-time facial expression recognition.
//!
//! Frames pass through orientation normalization, Haar cascade face
//! detection, per-face preprocessing and ONNX classification. Results are
//! drawn onto the frame and debounced into spoken announcements.

pub mod detection;
pub mod emotion;
pub mod feedback;
pub mod inference;
pub mod orientation;
pub mod overlay;
pub mod pipeline;
pub mod preprocessing;
pub mod shared;
pub mod video;
