//! FFmpeg filter graph fragments for vertical shorts.

use std::path::Path;

use ytbot_models::{CaptionStyle, RenderSettings};

use crate::timeline::KenBurns;

/// Escape a value for use inside a filter option.
///
/// `:` and `,` separate options and filters, `\` escapes.
pub fn escape_filter_value(raw: &str) -> String {
    raw.replace('\\', r"\\")
        .replace(':', r"\:")
        .replace(',', r"\,")
        .replace('\'', r"\'")
}

/// Scale to cover the frame, then centre-crop the overflow.
pub fn cover_crop(width: u32, height: u32) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},setsar=1",
        w = width,
        h = height
    )
}

/// Centred zoompan producing one output frame per input frame.
pub fn ken_burns(kb: &KenBurns, width: u32, height: u32, fps: u32) -> String {
    let delta = kb.to_zoom - kb.from_zoom;
    let zoom_expr = if kb.is_static() {
        format!("{:.4}", kb.from_zoom)
    } else {
        format!(
            "{:.4}+({:.4})*min(on/{},1)",
            kb.from_zoom,
            delta,
            kb.frames.max(1)
        )
    };

    format!(
        "zoompan=z='{}':x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':d=1:s={}x{}:fps={}",
        zoom_expr, width, height, fps
    )
}

/// Per-scene normalization: cover crop, fixed fps, Ken-Burns, cut to length.
pub fn scene_filter(kb: &KenBurns, clip_duration: f64, settings: &RenderSettings) -> String {
    let mut parts = vec![
        cover_crop(settings.width, settings.height),
        format!("fps={}", settings.fps),
    ];
    if !kb.is_static() {
        parts.push(ken_burns(kb, settings.width, settings.height, settings.fps));
    }
    parts.push(format!("trim=duration={:.3}", clip_duration));
    parts.push("setpts=PTS-STARTPTS".to_string());
    parts.push("format=yuv420p".to_string());
    parts.join(",")
}

/// Chain `xfade` transitions across `offsets.len() + 1` video inputs.
///
/// Output label is `[vout]`. Returns `None` for fewer than two inputs.
pub fn xfade_chain(offsets: &[f64], crossfade: f64) -> Option<String> {
    if offsets.is_empty() {
        return None;
    }

    let mut graph = Vec::with_capacity(offsets.len());
    let mut previous = "[0:v]".to_string();
    for (i, offset) in offsets.iter().enumerate() {
        let next_input = format!("[{}:v]", i + 1);
        let label = if i + 1 == offsets.len() {
            "[vout]".to_string()
        } else {
            format!("[x{}]", i + 1)
        };
        graph.push(format!(
            "{}{}xfade=transition=fade:duration={:.3}:offset={:.3}{}",
            previous, next_input, crossfade, offset, label
        ));
        previous = label;
    }

    Some(graph.join(";"))
}

/// Burn SRT captions with a forced ASS style.
pub fn subtitles(srt_path: &Path, style: &CaptionStyle) -> String {
    format!(
        "subtitles='{}':force_style='{}'",
        escape_filter_value(&srt_path.to_string_lossy()),
        style.to_force_style()
    )
}

/// Mix the voiceover (`voice`) with quieter background music (`music`).
///
/// The mix lasts as long as the voice. Output label is `[aout]`.
pub fn voice_with_music(voice: &str, music: &str, music_volume: f64) -> String {
    format!(
        "[{music}]volume={vol:.3}[bgm];[{voice}][bgm]amix=inputs=2:duration=first:dropout_transition=0:normalize=0[aout]",
        music = music,
        voice = voice,
        vol = music_volume
    )
}
