//! Plant Disease Classifier
//!
//! Loads a plant-disease ONNX model plus its newline-delimited label file
//! from an assets directory and classifies leaf photographs. The heavy
//! lifting (resize, normalize, top-k selection) lives in the
//! `preprocess` and `ranker` submodules; inference itself is delegated to
//! tract.

use crate::errors::{AppError, AppResult};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tract_onnx::prelude::*;

pub mod preprocess;
pub mod ranker;

pub use ranker::{pretty_label, Prediction, CONFIDENCE_THRESHOLD, MAX_RESULTS};

pub type TractModel =
    RunnableModel<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

pub const MODEL_FILE: &str = "plant_disease_model.onnx";
pub const LABELS_FILE: &str = "labels.txt";
pub const SAMPLE_IMAGE_FILE: &str = "sample_img.jpg";

/// Model input side length; the input tensor is [1, 224, 224, 3].
pub const INPUT_SIZE: u32 = 224;

pub struct Classifier {
    model: TractModel,
    labels: Vec<String>,
    num_classes: usize,
    input_size: u32,
}

/// Check whether the model and label files are present in `assets_dir`.
pub fn assets_available(assets_dir: &Path) -> bool {
    assets_dir.join(MODEL_FILE).exists() && assets_dir.join(LABELS_FILE).exists()
}

/// Path to the bundled sample image, if one ships with the assets.
pub fn sample_image_path(assets_dir: &Path) -> Option<PathBuf> {
    let path = assets_dir.join(SAMPLE_IMAGE_FILE);
    path.exists().then_some(path)
}

impl Classifier {
    /// Load the model and label table from `assets_dir`. Both are read
    /// once and treated as read-only afterward.
    pub fn load(assets_dir: &Path) -> AppResult<Self> {
        let model_path = assets_dir.join(MODEL_FILE);
        if !model_path.exists() {
            return Err(AppError::ModelLoad(format!(
                "Model not found at {:?}",
                model_path
            )));
        }

        log::info!("Loading plant disease model from {:?}", model_path);

        let model = tract_onnx::onnx()
            .model_for_path(&model_path)
            .map_err(|e| AppError::ModelLoad(format!("Failed to load model: {}", e)))?
            .with_input_fact(
                0,
                f32::fact([1, INPUT_SIZE as usize, INPUT_SIZE as usize, 3]).into(),
            )
            .map_err(|e| AppError::ModelLoad(format!("Failed to set input: {}", e)))?
            .into_optimized()
            .map_err(|e| AppError::ModelLoad(format!("Failed to optimize: {}", e)))?
            .into_runnable()
            .map_err(|e| AppError::ModelLoad(format!("Failed to make runnable: {}", e)))?;

        let labels_path = assets_dir.join(LABELS_FILE);
        let labels_raw = std::fs::read_to_string(&labels_path)
            .map_err(|e| AppError::Labels(format!("Failed to read {:?}: {}", labels_path, e)))?;
        let labels = parse_labels(&labels_raw);
        if labels.is_empty() {
            return Err(AppError::Labels(format!(
                "Label file {:?} contains no labels",
                labels_path
            )));
        }

        // Read the class count from the model's declared output shape
        // instead of hard-coding it. The shape can still be symbolic at
        // this point; the label table length is the fallback.
        let num_classes = match model.model().output_fact(0) {
            Ok(fact) => fact
                .shape
                .as_concrete()
                .and_then(|dims| dims.last().copied())
                .unwrap_or(labels.len()),
            Err(_) => labels.len(),
        };

        if num_classes != labels.len() {
            log::warn!(
                "Model declares {} classes but label file has {} entries",
                num_classes,
                labels.len()
            );
        }

        log::info!(
            "Plant disease model loaded ({} classes, {} labels)",
            num_classes,
            labels.len()
        );

        Ok(Self {
            model,
            labels,
            num_classes,
            input_size: INPUT_SIZE,
        })
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Classify an in-memory image. Runs synchronously relative to the
    /// caller; wrap in `spawn_blocking` when calling from async code.
    ///
    /// Returns at most [`MAX_RESULTS`] predictions, highest confidence
    /// first. An empty vector means no class cleared the threshold.
    pub fn recognize(&self, img: &DynamicImage) -> AppResult<Vec<Prediction>> {
        let tensor = preprocess::image_to_tensor(img, self.input_size);

        let result = self
            .model
            .run(tvec!(tensor.into()))
            .map_err(|e| AppError::Inference(format!("Inference failed: {}", e)))?;

        let view = result[0]
            .to_array_view::<f32>()
            .map_err(|e| AppError::Inference(format!("Failed to read output: {}", e)))?;
        let probabilities = view
            .as_slice()
            .ok_or_else(|| AppError::Inference("Output tensor is not contiguous".to_string()))?;

        if probabilities.len() != self.labels.len() {
            log::debug!(
                "Output vector has {} entries for {} labels",
                probabilities.len(),
                self.labels.len()
            );
        }

        Ok(ranker::rank(probabilities, &self.labels))
    }

    /// Open an image file and classify it.
    pub fn recognize_file(&self, image_path: &Path) -> AppResult<Vec<Prediction>> {
        let img = image::open(image_path)
            .map_err(|e| AppError::InvalidInput(format!("Failed to open image: {}", e)))?;
        self.recognize(&img)
    }
}

/// Parse a newline-delimited label file. Line order defines the
/// index-to-label mapping; blank lines are skipped.
pub fn parse_labels(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
