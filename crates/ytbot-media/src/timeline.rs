//! Scene timing: duration split, crossfade overlap, clip fitting and
//! Ken-Burns parameters.
//!
//! All functions here are pure so the render graph can be checked without
//! FFmpeg.

use serde::{Deserialize, Serialize};

use ytbot_models::RenderSettings;

use crate::error::{MediaError, MediaResult};

/// Tolerance for comparing durations.
const EPSILON: f64 = 1e-6;

/// Split `total` seconds across scenes in proportion to `weights`.
///
/// Each scene gets at least `min_secs` when `total` allows it; otherwise the
/// split is purely proportional. The result always sums to `total`.
pub fn apportion_durations(weights: &[usize], total: f64, min_secs: f64) -> Vec<f64> {
    let n = weights.len();
    if n == 0 || total <= 0.0 {
        return vec![0.0; n];
    }

    let weight_sum: usize = weights.iter().sum();
    // Empty narration everywhere: split evenly
    let weights: Vec<f64> = if weight_sum == 0 {
        vec![1.0; n]
    } else {
        weights.iter().map(|&w| w as f64).collect()
    };

    if min_secs <= 0.0 || min_secs * n as f64 > total {
        let sum: f64 = weights.iter().sum();
        return weights.iter().map(|w| total * w / sum).collect();
    }

    // Pin scenes under the floor to the floor and re-split the remainder
    // among the rest until nothing else drops below it.
    let mut pinned = vec![false; n];
    loop {
        let pinned_count = pinned.iter().filter(|p| **p).count();
        let remaining = total - min_secs * pinned_count as f64;
        let free_weight: f64 = weights
            .iter()
            .zip(&pinned)
            .filter(|(_, p)| !**p)
            .map(|(w, _)| *w)
            .sum();

        let durations: Vec<f64> = weights
            .iter()
            .zip(&pinned)
            .map(|(w, p)| {
                if *p {
                    min_secs
                } else if free_weight > 0.0 {
                    remaining * w / free_weight
                } else {
                    0.0
                }
            })
            .collect();

        let mut changed = false;
        for (i, d) in durations.iter().enumerate() {
            if !pinned[i] && *d < min_secs - EPSILON {
                pinned[i] = true;
                changed = true;
            }
        }

        if !changed {
            return durations;
        }
    }
}

/// Crossfade limited to half the shortest scene; zero for a single scene.
pub fn effective_crossfade(durations: &[f64], crossfade: f64) -> f64 {
    if durations.len() < 2 || crossfade <= 0.0 {
        return 0.0;
    }
    let shortest = durations.iter().copied().fold(f64::INFINITY, f64::min);
    crossfade.min(shortest / 2.0).max(0.0)
}

/// `xfade` offsets: transition `i` starts at the cumulative end of scene `i`.
pub fn xfade_offsets(durations: &[f64]) -> Vec<f64> {
    durations
        .iter()
        .take(durations.len().saturating_sub(1))
        .scan(0.0, |acc, d| {
            *acc += d;
            Some(*acc)
        })
        .collect()
}

/// How a stock clip is stretched or cut to fill its slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ClipFit {
    /// Loop the clip `count` extra times, then cut at the slot length
    Loop { count: u32 },
    /// Read `slot` seconds starting at `start`
    Trim { start: f64 },
}

/// Decide how a clip of `clip_secs` fills a slot of `slot_secs`.
pub fn fit_clip(clip_secs: f64, slot_secs: f64) -> MediaResult<ClipFit> {
    if clip_secs <= 0.0 {
        return Err(MediaError::InvalidMedia(format!(
            "clip duration must be positive, got {}",
            clip_secs
        )));
    }
    if clip_secs + EPSILON < slot_secs {
        let count = (slot_secs / clip_secs).ceil() as u32 - 1;
        Ok(ClipFit::Loop {
            count: count.max(1),
        })
    } else {
        Ok(ClipFit::Trim {
            start: ((clip_secs - slot_secs) / 2.0).max(0.0),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Slow centred zoom across one scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KenBurns {
    pub from_zoom: f64,
    pub to_zoom: f64,
    /// Output frames the zoom spans
    pub frames: u32,
}

impl KenBurns {
    pub fn new(direction: ZoomDirection, zoom_end: f64, frames: u32) -> Self {
        let zoom_end = zoom_end.max(1.0);
        let (from_zoom, to_zoom) = match direction {
            ZoomDirection::In => (1.0, zoom_end),
            ZoomDirection::Out => (zoom_end, 1.0),
        };
        Self {
            from_zoom,
            to_zoom,
            frames: frames.max(1),
        }
    }

    pub fn is_static(&self) -> bool {
        (self.from_zoom - self.to_zoom).abs() < EPSILON
    }
}

/// One scene on the output timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSlot {
    pub index: usize,
    /// Start on the output timeline
    pub start: f64,
    /// Screen time excluding the overlap into the next scene
    pub duration: f64,
    /// Length of the rendered scene clip, overlap included
    pub clip_duration: f64,
    pub ken_burns: KenBurns,
}

impl SceneSlot {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Full scene layout for one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub slots: Vec<SceneSlot>,
    pub crossfade: f64,
    pub total_duration: f64,
}

impl Timeline {
    /// Lay out scenes with the given narration weights over `total` seconds.
    pub fn plan(weights: &[usize], total: f64, settings: &RenderSettings) -> MediaResult<Self> {
        if weights.is_empty() {
            return Err(MediaError::invalid_input("timeline needs at least one scene"));
        }
        if total.is_nan() || total <= 0.0 {
            return Err(MediaError::invalid_input(format!(
                "voiceover duration must be positive, got {}",
                total
            )));
        }

        let durations = apportion_durations(weights, total, settings.min_scene_secs);
        let crossfade = effective_crossfade(&durations, settings.crossfade_secs);
        let last = durations.len() - 1;

        let mut start = 0.0;
        let slots = durations
            .iter()
            .enumerate()
            .map(|(index, &duration)| {
                let clip_duration = if index < last {
                    duration + crossfade
                } else {
                    duration
                };
                let direction = if index % 2 == 0 {
                    ZoomDirection::In
                } else {
                    ZoomDirection::Out
                };
                let frames = (clip_duration * settings.fps as f64).round() as u32;
                let slot = SceneSlot {
                    index,
                    start,
                    duration,
                    clip_duration,
                    ken_burns: KenBurns::new(direction, settings.zoom_end, frames),
                };
                start += duration;
                slot
            })
            .collect();

        Ok(Self {
            slots,
            crossfade,
            total_duration: total,
        })
    }

    pub fn durations(&self) -> Vec<f64> {
        self.slots.iter().map(|s| s.duration).collect()
    }

    pub fn xfade_offsets(&self) -> Vec<f64> {
        xfade_offsets(&self.durations())
    }

    /// Output length after all crossfades are applied.
    pub fn rendered_duration(&self) -> f64 {
        let clips: f64 = self.slots.iter().map(|s| s.clip_duration).sum();
        clips - self.crossfade * self.slots.len().saturating_sub(1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_apportion_proportional() {
        let d = apportion_durations(&[100, 300], 40.0, 1.5);
        assert!(approx(d[0], 10.0));
        assert!(approx(d[1], 30.0));
    }

    #[test]
    fn test_apportion_enforces_minimum() {
        let d = apportion_durations(&[1, 1, 98], 10.0, 1.5);
        assert!(approx(d[0], 1.5));
        assert!(approx(d[1], 1.5));
        assert!(approx(d[2], 7.0));
        assert!(approx(d.iter().sum::<f64>(), 10.0));
    }

    #[test]
    fn test_apportion_minimum_impossible() {
        let d = apportion_durations(&[1, 3], 2.0, 1.5);
        assert!(approx(d[0], 0.5));
        assert!(approx(d[1], 1.5));
    }

    #[test]
    fn test_apportion_zero_weights() {
        let d = apportion_durations(&[0, 0, 0], 9.0, 1.5);
        assert!(d.iter().all(|x| approx(*x, 3.0)));
    }

    #[test]
    fn test_effective_crossfade() {
        assert!(approx(effective_crossfade(&[4.0, 5.0], 0.5), 0.5));
        assert!(approx(effective_crossfade(&[0.6, 5.0], 0.5), 0.3));
        assert_eq!(effective_crossfade(&[4.0], 0.5), 0.0);
    }

    #[test]
    fn test_xfade_offsets() {
        let offsets = xfade_offsets(&[3.0, 4.0, 5.0]);
        assert_eq!(offsets, vec![3.0, 7.0]);
        assert!(xfade_offsets(&[3.0]).is_empty());
    }

    #[test]
    fn test_fit_clip_loop() {
        assert_eq!(fit_clip(4.0, 9.0).unwrap(), ClipFit::Loop { count: 2 });
        assert_eq!(fit_clip(4.0, 8.0).unwrap(), ClipFit::Loop { count: 1 });
    }

    #[test]
    fn test_fit_clip_trim_centres() {
        assert_eq!(fit_clip(10.0, 4.0).unwrap(), ClipFit::Trim { start: 3.0 });
        assert_eq!(fit_clip(4.0, 4.0).unwrap(), ClipFit::Trim { start: 0.0 });
        assert!(fit_clip(0.0, 4.0).is_err());
    }

    #[test]
    fn test_ken_burns_alternates() {
        let tl = Timeline::plan(&[10, 10, 10], 9.0, &RenderSettings::default()).unwrap();
        assert_eq!(tl.slots[0].ken_burns.from_zoom, 1.0);
        assert_eq!(tl.slots[0].ken_burns.to_zoom, 1.15);
        assert_eq!(tl.slots[1].ken_burns.from_zoom, 1.15);
        assert_eq!(tl.slots[2].ken_burns.to_zoom, 1.15);
    }

    #[test]
    fn test_timeline_plan() {
        let settings = RenderSettings::default();
        let tl = Timeline::plan(&[100, 100, 200], 20.0, &settings).unwrap();

        assert!(approx(tl.crossfade, 0.5));
        assert!(approx(tl.slots[0].duration, 5.0));
        assert!(approx(tl.slots[0].clip_duration, 5.5));
        assert!(approx(tl.slots[2].clip_duration, 10.0));
        assert!(approx(tl.slots[2].start, 10.0));
        assert_eq!(tl.xfade_offsets(), vec![5.0, 10.0]);
        assert!(approx(tl.rendered_duration(), 20.0));
        assert_eq!(tl.slots[0].ken_burns.frames, 165);
    }

    #[test]
    fn test_timeline_rejects_bad_input() {
        let settings = RenderSettings::default();
        assert!(Timeline::plan(&[], 10.0, &settings).is_err());
        assert!(Timeline::plan(&[1], 0.0, &settings).is_err());
    }
}
