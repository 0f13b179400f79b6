//! Caption cues burned onto the final video.

use serde::{Deserialize, Serialize};

/// A single on-screen caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionCue {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    pub text: String,
}

impl CaptionCue {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// A cue is renderable when it has text and a positive duration.
    pub fn is_valid(&self) -> bool {
        self.end > self.start && !self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_validity() {
        assert!(CaptionCue::new(0.0, 1.0, "hi").is_valid());
        assert!(!CaptionCue::new(1.0, 1.0, "hi").is_valid());
        assert!(!CaptionCue::new(0.0, 1.0, "  ").is_valid());
        assert!((CaptionCue::new(0.5, 2.0, "x").duration() - 1.5).abs() < 1e-9);
    }
}
