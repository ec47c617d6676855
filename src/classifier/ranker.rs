//! Threshold filtering and bounded top-k selection over the raw
//! probability vector produced by the model.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Minimum confidence for a class to be reported at all.
pub const CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Maximum number of predictions returned per image.
pub const MAX_RESULTS: usize = 3;

/// Placeholder for output indices beyond the label table.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// A single ranked classification result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Column index in the model's output vector.
    pub id: usize,
    /// Class label from the label table, or [`UNKNOWN_LABEL`].
    pub title: String,
    /// Model confidence in [0, 1].
    pub confidence: f32,
}

impl std::fmt::Display for Prediction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({:.1}%)",
            pretty_label(&self.title),
            self.confidence * 100.0
        )
    }
}

/// Heap ordering by confidence only. Kept private so `Prediction`'s own
/// equality stays field-wise.
struct ByConfidence(Prediction);

impl PartialEq for ByConfidence {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ByConfidence {}

impl PartialOrd for ByConfidence {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ByConfidence {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.confidence.total_cmp(&other.0.confidence)
    }
}

/// Select at most [`MAX_RESULTS`] predictions with confidence at or above
/// [`CONFIDENCE_THRESHOLD`], highest confidence first. Ties break
/// arbitrarily. An empty result means "no disease detected" and is valid.
pub fn rank(probabilities: &[f32], labels: &[String]) -> Vec<Prediction> {
    let mut heap = BinaryHeap::new();

    for (i, &confidence) in probabilities.iter().enumerate() {
        if confidence >= CONFIDENCE_THRESHOLD {
            heap.push(ByConfidence(Prediction {
                id: i,
                title: labels
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
                confidence,
            }));
        }
    }

    let count = heap.len().min(MAX_RESULTS);
    let mut predictions = Vec::with_capacity(count);
    for _ in 0..count {
        if let Some(ByConfidence(p)) = heap.pop() {
            predictions.push(p);
        }
    }
    predictions
}

/// Turn a raw class name like `Tomato___Early_blight` into a display form
/// like `tomato early blight`.
pub fn pretty_label(label: &str) -> String {
    label.replace("___", " ").replace('_', " ").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_rank_caps_results_and_sorts_descending() {
        let probs = [0.6, 0.9, 0.7, 0.8, 0.55];
        let labels = labels(&["a", "b", "c", "d", "e"]);
        let ranked = rank(&probs, &labels);

        assert_eq!(ranked.len(), MAX_RESULTS);
        assert_eq!(ranked[0].title, "b");
        assert_eq!(ranked[1].title, "d");
        assert_eq!(ranked[2].title, "c");
        for pair in ranked.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
        for p in &ranked {
            assert!(p.confidence >= CONFIDENCE_THRESHOLD);
        }
    }

    #[test]
    fn test_rank_filters_below_threshold() {
        let probs = [0.49, 0.3, 0.0];
        let ranked = rank(&probs, &labels(&["a", "b", "c"]));
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_rank_out_of_bounds_index_uses_placeholder() {
        let probs = [0.2, 0.95];
        let ranked = rank(&probs, &labels(&["only"]));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, 1);
        assert_eq!(ranked[0].title, UNKNOWN_LABEL);
    }

    #[test]
    fn test_rank_keeps_exact_threshold() {
        let probs = [CONFIDENCE_THRESHOLD];
        let ranked = rank(&probs, &labels(&["a"]));
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn test_prediction_equality_considers_all_fields() {
        let a = Prediction {
            id: 0,
            title: "Apple___scab".to_string(),
            confidence: 0.9,
        };
        let b = Prediction {
            id: 1,
            title: "Tomato___Early_blight".to_string(),
            confidence: 0.9,
        };
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_pretty_label() {
        assert_eq!(
            pretty_label("Tomato___Early_blight"),
            "tomato early blight"
        );
        assert_eq!(pretty_label("Healthy"), "healthy");
    }
}
