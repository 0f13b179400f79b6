//! Scene scripts produced by the language model.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Description used when the model leaves it out.
pub const DEFAULT_DESCRIPTION: &str =
    "Created automatically by YT_BOT v1.0\nTools: OpenRouter, Edge-TTS, Whisper, Pexels, FFmpeg.";

/// Tags used when the model returns none.
pub const DEFAULT_TAGS: [&str; 2] = ["AI", "Automation"];

/// One scene: a slice of narration and the stock footage terms that illustrate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Scene {
    /// Voiceover text spoken during this scene
    pub narration: String,

    /// Stock footage search terms, most specific first
    #[serde(default)]
    pub search_terms: Vec<String>,
}

impl Scene {
    pub fn new(narration: impl Into<String>, search_terms: Vec<String>) -> Self {
        Self {
            narration: narration.into(),
            search_terms,
        }
    }

    /// Narration length in characters (used to apportion screen time).
    pub fn char_count(&self) -> usize {
        self.narration.chars().count()
    }
}

/// A full short-video script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Script {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub tags: Vec<String>,

    pub scenes: Vec<Scene>,
}

/// Reasons a model-produced script is unusable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error("script contains no scenes")]
    NoScenes,

    #[error("scene {0} has empty narration")]
    EmptyNarration(usize),
}

impl Script {
    /// Narration of all scenes joined with spaces, as it will be spoken.
    pub fn full_narration(&self) -> String {
        self.scenes
            .iter()
            .map(|s| s.narration.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Rough spoken length at 2.5 words per second.
    pub fn estimated_duration_secs(&self) -> f64 {
        self.full_narration().split_whitespace().count() as f64 / 2.5
    }

    /// Trim every field, fill defaults and validate against `topic`.
    ///
    /// Scenes without search terms fall back to the topic itself.
    pub fn normalized(mut self, topic: &str) -> Result<Self, ScriptError> {
        if self.scenes.is_empty() {
            return Err(ScriptError::NoScenes);
        }

        for (idx, scene) in self.scenes.iter_mut().enumerate() {
            scene.narration = scene.narration.trim().to_string();
            if scene.narration.is_empty() {
                return Err(ScriptError::EmptyNarration(idx));
            }
            scene.search_terms = scene
                .search_terms
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            if scene.search_terms.is_empty() {
                scene.search_terms.push(topic.trim().to_string());
            }
        }

        self.title = self.title.trim().to_string();
        if self.title.is_empty() {
            self.title = format!("The Evolution of {}", topic.trim());
        }

        self.description = self.description.trim().to_string();
        if self.description.is_empty() {
            self.description = DEFAULT_DESCRIPTION.to_string();
        }

        self.tags = self
            .tags
            .iter()
            .map(|t| t.trim().trim_start_matches('#').to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if self.tags.is_empty() {
            self.tags = DEFAULT_TAGS.iter().map(|t| t.to_string()).collect();
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_script() -> Script {
        Script {
            title: "  ".to_string(),
            description: String::new(),
            tags: vec!["#science".to_string(), " ".to_string()],
            scenes: vec![
                Scene::new("  Stars are born in clouds.  ", vec!["nebula".to_string()]),
                Scene::new("They burn for billions of years.", vec!["  ".to_string()]),
            ],
        }
    }

    #[test]
    fn test_normalized_fills_defaults() {
        let script = raw_script().normalized("Stars").unwrap();
        assert_eq!(script.title, "The Evolution of Stars");
        assert_eq!(script.description, DEFAULT_DESCRIPTION);
        assert_eq!(script.tags, vec!["science".to_string()]);
        assert_eq!(script.scenes[0].narration, "Stars are born in clouds.");
        assert_eq!(script.scenes[1].search_terms, vec!["Stars".to_string()]);
    }

    #[test]
    fn test_normalized_rejects_empty() {
        let empty = Script {
            title: String::new(),
            description: String::new(),
            tags: vec![],
            scenes: vec![],
        };
        assert_eq!(empty.normalized("x"), Err(ScriptError::NoScenes));

        let mut script = raw_script();
        script.scenes[1].narration = "   ".to_string();
        assert_eq!(script.normalized("x"), Err(ScriptError::EmptyNarration(1)));
    }

    #[test]
    fn test_full_narration_and_estimate() {
        let script = raw_script().normalized("Stars").unwrap();
        assert_eq!(
            script.full_narration(),
            "Stars are born in clouds. They burn for billions of years."
        );
        // 11 words at 2.5 words/s
        assert!((script.estimated_duration_secs() - 4.4).abs() < 1e-9);
    }

    #[test]
    fn test_char_count_counts_unicode_scalars() {
        assert_eq!(Scene::new("héllo", vec![]).char_count(), 5);
    }
}
