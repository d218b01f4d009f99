use image::RgbImage;

use crate::color::Rgb;

/// A square-ish pixel window clamped to the frame. Sides shrink at the frame
/// edge instead of shifting the window inward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roi {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Roi {
    /// Window of `side` pixels centred on `(cx, cy)`. `None` when the clamped
    /// window is empty (centre far outside the frame, or zero side).
    pub fn centered(cx: i64, cy: i64, side: u32, frame_width: u32, frame_height: u32) -> Option<Self> {
        let half = (side / 2) as i64;
        let x1 = (cx - half).max(0);
        let y1 = (cy - half).max(0);
        let x2 = (cx + half).min(frame_width as i64);
        let y2 = (cy + half).min(frame_height as i64);

        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        Some(Self {
            x: x1 as u32,
            y: y1 as u32,
            width: (x2 - x1) as u32,
            height: (y2 - y1) as u32,
        })
    }

    pub fn frame_center(side: u32, frame_width: u32, frame_height: u32) -> Option<Self> {
        Self::centered(
            (frame_width / 2) as i64,
            (frame_height / 2) as i64,
            side,
            frame_width,
            frame_height,
        )
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Every `stride`-th pixel along both axes.
    pub fn pixels<'a>(&self, frame: &'a RgbImage, stride: u32) -> impl Iterator<Item = Rgb> + 'a {
        let stride = stride.max(1) as usize;
        let Roi { x: x0, y: y0, width, height } = *self;
        (y0..y0 + height).step_by(stride).flat_map(move |y| {
            (x0..x0 + width)
                .step_by(stride)
                .map(move |x| Rgb::from(*frame.get_pixel(x, y)))
        })
    }
}
