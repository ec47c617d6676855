//! leafscan: plant leaf disease detection.
//!
//! On-device classification of leaf photographs with a bundled ONNX model
//! (via tract), plus an optional remote lookup that asks a chat-completion
//! API for symptom and management summaries of the detected disease.

pub mod ai;
pub mod classifier;
pub mod config;
pub mod errors;

pub use ai::{AiService, DiseaseInfo, ParseSource};
pub use classifier::{Classifier, Prediction};
pub use config::AiConfig;
pub use errors::{AppError, AppResult};
