//! Inference backend implementations
//!
//! The `tract` backend runs real ONNX saliency models in pure Rust. The
//! test utilities provide deterministic mock backends so the pipeline can be
//! exercised without model files.

#[cfg(feature = "tract")]
pub mod tract;

pub mod test_utils;

#[cfg(feature = "tract")]
pub use tract::TractBackend;

pub use test_utils::MockSaliencyBackend;
