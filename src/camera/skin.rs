//! Heuristic skin/motion tracker
//!
//! Works on small downsampled RGBA frames. Each sample:
//! 1. Converts to grayscale and diffs against the previous frame
//! 2. Classifies skin pixels (RGB rule AND YCbCr chroma window)
//! 3. Tracks the topmost band of moving skin as a fingertip proxy
//! 4. Blends it with the motion-weighted centroid and smooths the pointer
//!
//! No external model is needed, so this tracker is always available.

use glam::Vec2;

use super::{CameraFrame, GestureTracker, PointerState, TrackerKind};
use crate::consts::{CAM_H, CAM_W};
use crate::error::CameraError;
use crate::lerp;

/// Rows above this fraction of the height are ignored
const TOP_INSET: f32 = 0.1;
/// Rows below this fraction of the height are ignored
const BOTTOM_INSET: f32 = 0.94;

/// Gray difference for a skin pixel to count as moving
const SKIN_MOTION_DIFF: u8 = 10;
/// Gray difference for a non-skin pixel to count as motion
const BACKGROUND_MOTION_DIFF: u8 = 24;
/// Weight of non-skin motion relative to skin motion
const BACKGROUND_WEIGHT: f32 = 0.35;
/// Rows around the topmost moving skin row that belong to the fingertip band
const TOP_BAND_ROWS: i32 = 4;

const MIN_TOP_COUNT: u32 = 4;
const MIN_MOVING_SKIN: u32 = 24;
const MIN_SKIN: u32 = 80;
const MIN_MOTION: f32 = 900.0;

const SKIN_TOP_CONFIDENCE: f32 = 0.55;
const MOTION_CONFIDENCE: f32 = 0.45;
/// Pull of the motion centroid on the fingertip estimate
const CENTROID_BLEND: f32 = 0.28;
/// Per-sample decay while nothing is tracked
const LOST_DECAY: f32 = 0.85;

/// BT.601 luma, rounded
#[inline]
fn gray(r: u8, g: u8, b: u8) -> u8 {
    (r as f32 * 0.299 + g as f32 * 0.587 + b as f32 * 0.114).round() as u8
}

/// Skin classification: RGB heuristic followed by a YCbCr chroma window
pub fn is_skin_pixel(r: u8, g: u8, b: u8) -> bool {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let rgb_rule = r > 95
        && g > 40
        && b > 20
        && max - min > 15
        && r.abs_diff(g) > 15
        && r > g
        && r > b;
    if !rgb_rule {
        return false;
    }

    let (r, g, b) = (r as f32, g as f32, b as f32);
    let cb = 128.0 - 0.168736 * r - 0.331264 * g + 0.5 * b;
    let cr = 128.0 + 0.5 * r - 0.418688 * g - 0.081312 * b;
    (135.0..=180.0).contains(&cr) && (85.0..=135.0).contains(&cb)
}

/// Frame-differencing tracker with double-buffered grayscale frames
#[derive(Debug)]
pub struct SkinMotionTracker {
    width: usize,
    height: usize,
    prev: Vec<u8>,
    curr: Vec<u8>,
    baseline_ready: bool,
}

impl Default for SkinMotionTracker {
    fn default() -> Self {
        Self::new(CAM_W, CAM_H)
    }
}

impl SkinMotionTracker {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            prev: vec![0; width * height],
            curr: vec![0; width * height],
            baseline_ready: false,
        }
    }
}

/// Per-frame accumulators
#[derive(Default)]
struct FrameStats {
    motion: f32,
    motion_x: f32,
    motion_y: f32,
    skin: u32,
    moving_skin: u32,
    top_y: i32,
    top_x_sum: f32,
    top_count: u32,
}

impl GestureTracker for SkinMotionTracker {
    fn kind(&self) -> TrackerKind {
        TrackerKind::Heuristic
    }

    fn reset(&mut self) {
        self.baseline_ready = false;
    }

    fn track(&mut self, frame: &CameraFrame<'_>, pointer: &mut PointerState) -> Result<bool, CameraError> {
        let pixels = self.width * self.height;
        let expected = pixels * 4;
        if frame.rgba.len() != expected {
            return Err(CameraError::FrameSize {
                expected,
                actual: frame.rgba.len(),
            });
        }

        if !self.baseline_ready {
            for (i, px) in frame.rgba.chunks_exact(4).enumerate() {
                self.prev[i] = gray(px[0], px[1], px[2]);
            }
            self.baseline_ready = true;
            return Ok(false);
        }

        let min_y = self.height as f32 * TOP_INSET;
        let max_y = self.height as f32 * BOTTOM_INSET;
        let mut stats = FrameStats {
            top_y: self.height as i32 + 1,
            ..Default::default()
        };

        for (i, px) in frame.rgba.chunks_exact(4).enumerate() {
            let (r, g, b) = (px[0], px[1], px[2]);
            let luma = gray(r, g, b);
            self.curr[i] = luma;
            let diff = luma.abs_diff(self.prev[i]);

            let x = (i % self.width) as i32;
            let y = (i / self.width) as i32;
            if (y as f32) < min_y || (y as f32) > max_y {
                continue;
            }

            let skin = is_skin_pixel(r, g, b);
            if skin {
                stats.skin += 1;
            }

            if skin && diff > SKIN_MOTION_DIFF {
                let d = diff as f32;
                stats.moving_skin += 1;
                stats.motion += d;
                stats.motion_x += x as f32 * d;
                stats.motion_y += y as f32 * d;

                if y < stats.top_y - 1 {
                    stats.top_y = y;
                    stats.top_x_sum = x as f32;
                    stats.top_count = 1;
                } else if (y - stats.top_y).abs() <= TOP_BAND_ROWS {
                    stats.top_x_sum += x as f32;
                    stats.top_count += 1;
                }
            } else if diff > BACKGROUND_MOTION_DIFF {
                let d = diff as f32 * BACKGROUND_WEIGHT;
                stats.motion += d;
                stats.motion_x += x as f32 * d;
                stats.motion_y += y as f32 * d;
            }
        }

        std::mem::swap(&mut self.prev, &mut self.curr);

        let w = self.width as f32;
        let h = self.height as f32;
        let has_skin_top =
            stats.top_count >= MIN_TOP_COUNT && stats.moving_skin > MIN_MOVING_SKIN && stats.skin > MIN_SKIN;
        let has_motion = stats.motion > MIN_MOTION;

        let mut estimate: Option<Vec2> = None;
        let mut confidence = 0.0;

        if has_skin_top {
            estimate = Some(Vec2::new(
                stats.top_x_sum / stats.top_count as f32 / w,
                stats.top_y as f32 / h,
            ));
            confidence += SKIN_TOP_CONFIDENCE;
        }

        if has_motion {
            let centroid = Vec2::new(
                stats.motion_x / stats.motion / w,
                stats.motion_y / stats.motion / h,
            );
            estimate = Some(match estimate {
                Some(top) => top.lerp(centroid, CENTROID_BLEND),
                None => centroid,
            });
            confidence += MOTION_CONFIDENCE;
        }

        match estimate {
            Some(target) => {
                let target = target.clamp(Vec2::ZERO, Vec2::ONE);
                let (smooth_x, smooth_y) = if has_skin_top { (0.38, 0.34) } else { (0.3, 0.3) };
                pointer.pos.x = lerp(pointer.pos.x, target.x, smooth_x);
                pointer.pos.y = lerp(pointer.pos.y, target.y, smooth_y);
                pointer.last_motion = stats.motion;
                pointer.confidence = f32::clamp(confidence, 0.0, 1.0);
            }
            None => {
                pointer.last_motion = (pointer.last_motion * LOST_DECAY).max(0.0);
                pointer.confidence = (pointer.confidence * LOST_DECAY).max(0.0);
            }
        }

        Ok(true)
    }
}
