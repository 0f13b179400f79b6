//! Render layout settings for vertical shorts.

use serde::{Deserialize, Serialize};

/// Caption appearance, rendered as an ASS `force_style` string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionStyle {
    pub font_name: String,
    pub font_size: u32,
    /// ASS colour, `&HAABBGGRR`
    pub primary_colour: String,
    pub outline_colour: String,
    pub outline: u32,
    pub bold: bool,
    /// ASS numpad alignment (2 = bottom centre, 5 = middle centre)
    pub alignment: u32,
    pub margin_v: u32,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_name: "Arial".to_string(),
            font_size: 18,
            primary_colour: "&H00FFFFFF".to_string(),
            outline_colour: "&H00000000".to_string(),
            outline: 2,
            bold: true,
            alignment: 2,
            margin_v: 60,
        }
    }
}

impl CaptionStyle {
    pub fn to_force_style(&self) -> String {
        format!(
            "FontName={},FontSize={},PrimaryColour={},OutlineColour={},BorderStyle=1,Outline={},Bold={},Alignment={},MarginV={}",
            self.font_name,
            self.font_size,
            self.primary_colour,
            self.outline_colour,
            self.outline,
            if self.bold { -1 } else { 0 },
            self.alignment,
            self.margin_v
        )
    }
}

/// Output geometry and timing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Overlap between consecutive scenes
    pub crossfade_secs: f64,
    /// Lower bound for a scene's screen time
    pub min_scene_secs: f64,
    /// Ken-Burns end zoom (1.0 disables the effect)
    pub zoom_end: f64,
    pub max_words_per_caption: usize,
    /// Background music gain relative to the voiceover
    pub music_volume: f64,
    pub caption_style: CaptionStyle,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 30,
            crossfade_secs: 0.5,
            min_scene_secs: 1.5,
            zoom_end: 1.15,
            max_words_per_caption: 3,
            music_volume: 0.12,
            caption_style: CaptionStyle::default(),
        }
    }
}

impl RenderSettings {
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}
