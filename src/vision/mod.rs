//! The external vision provider seam: hand detection and foreground
//! segmentation are black boxes behind [`VisionProvider`].

use std::ops::Deref;
use std::panic::{catch_unwind, AssertUnwindSafe};

use anyhow::Result;
use image::{GrayImage, RgbImage};

use crate::models::HandObservation;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

pub trait VisionProvider: Send + Sync {
    fn detect_hands(&self, frame: &RgbImage) -> Result<Vec<HandObservation>>;

    /// Non-zero pixels belong to a person.
    fn segment_foreground(&self, frame: &RgbImage) -> Result<GrayImage>;

    /// Release model resources. Called exactly once by [`ScopedProvider`].
    fn close(&self) {}
}

/// Owns a provider for a bounded scope and closes it on drop, so a test can
/// hand in a fake and a live session can never leak a loaded model.
pub struct ScopedProvider<P: VisionProvider> {
    provider: P,
}

impl<P: VisionProvider> ScopedProvider<P> {
    pub fn acquire(provider: P) -> Self {
        log_debug!("vision provider acquired");
        Self { provider }
    }

    /// Explicit release; equivalent to dropping the guard.
    pub fn dispose(self) {}
}

impl<P: VisionProvider> Deref for ScopedProvider<P> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.provider
    }
}

impl<P: VisionProvider> Drop for ScopedProvider<P> {
    fn drop(&mut self) {
        self.provider.close();
        log_debug!("vision provider released");
    }
}

impl<P: VisionProvider> VisionProvider for ScopedProvider<P> {
    fn detect_hands(&self, frame: &RgbImage) -> Result<Vec<HandObservation>> {
        (**self).detect_hands(frame)
    }

    fn segment_foreground(&self, frame: &RgbImage) -> Result<GrayImage> {
        (**self).segment_foreground(frame)
    }
}

/// Hands in `frame`, or none at all when the provider fails, panics or
/// reports coordinates that cannot be real.
pub fn observe_hands<P: VisionProvider + ?Sized>(provider: &P, frame: &RgbImage) -> Vec<HandObservation> {
    match catch_unwind(AssertUnwindSafe(|| provider.detect_hands(frame))) {
        Ok(Ok(hands)) => {
            let total = hands.len();
            let valid: Vec<_> = hands.into_iter().filter(|h| h.is_well_formed()).collect();
            if valid.len() < total {
                log_warn!(
                    "dropped {} malformed hand observation(s) from provider",
                    total - valid.len()
                );
            }
            valid
        }
        Ok(Err(err)) => {
            log_warn!("hand detection failed, treating frame as no observation: {err:#}");
            Vec::new()
        }
        Err(_) => {
            log_warn!("hand detection panicked, treating frame as no observation");
            Vec::new()
        }
    }
}

/// Foreground mask for `frame`, or `None` on provider failure or a mask whose
/// size does not match the frame.
pub fn observe_foreground<P: VisionProvider + ?Sized>(provider: &P, frame: &RgbImage) -> Option<GrayImage> {
    match catch_unwind(AssertUnwindSafe(|| provider.segment_foreground(frame))) {
        Ok(Ok(mask)) if mask.dimensions() == frame.dimensions() => Some(mask),
        Ok(Ok(mask)) => {
            log_warn!(
                "foreground mask is {:?} but frame is {:?}; ignoring",
                mask.dimensions(),
                frame.dimensions()
            );
            None
        }
        Ok(Err(err)) => {
            log_warn!("segmentation failed: {err:#}");
            None
        }
        Err(_) => {
            log_warn!("segmentation panicked");
            None
        }
    }
}
