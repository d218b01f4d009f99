//! Per-frame mean-color features.

use std::path::PathBuf;

use image::{GrayImage, RgbImage};
use serde::Serialize;

use crate::models::{MoveId, Player};

use super::kmeans::Point;

/// Where a sample's pixels come from.
#[derive(Debug, Clone)]
pub enum FrameSource {
    Image(RgbImage),
    Path(PathBuf),
    /// Frame with an already-resolved foreground mask.
    Masked { frame: RgbImage, mask: GrayImage },
}

#[derive(Debug, Clone)]
pub struct BatchSample {
    pub move_id: MoveId,
    pub source: FrameSource,
    pub existing_label: Option<Player>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSample {
    pub move_id: MoveId,
    /// `[r/255, g/255, b/255]` of the mean foreground color.
    pub feature: Point,
    pub existing_label: Option<Player>,
    pub pixel_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    LoadFailed(String),
    ProviderFailed,
    /// Mask `(width, height)` does not match the frame it came with.
    MaskMismatch((u32, u32)),
    TooFewPixels(usize),
    WorkerFailed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFrame {
    pub move_id: MoveId,
    pub reason: SkipReason,
}

/// Mean color over pixels where `mask` is non-zero (all pixels without a
/// mask). `Err(count)` when fewer than `min_pixels` qualify.
pub fn mean_color(frame: &RgbImage, mask: Option<&GrayImage>, min_pixels: usize) -> Result<(Point, usize), usize> {
    let mut sum = [0u64; 3];
    let mut count = 0usize;

    for (x, y, px) in frame.enumerate_pixels() {
        if let Some(mask) = mask {
            if mask.get_pixel(x, y).0[0] == 0 {
                continue;
            }
        }
        sum[0] += px.0[0] as u64;
        sum[1] += px.0[1] as u64;
        sum[2] += px.0[2] as u64;
        count += 1;
    }

    if count == 0 || count < min_pixels {
        return Err(count);
    }

    let n = count as f64 * 255.0;
    Ok(([sum[0] as f64 / n, sum[1] as f64 / n, sum[2] as f64 / n], count))
}
