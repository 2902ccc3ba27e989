//! Memory image loader.
//!
//! This module copies an executable's segments into the device. It performs:
//! 1. **State check:** Loading is accepted only while the device is in reset or loaded.
//! 2. **Segment writes:** Each non-empty segment becomes one write request, driven through the
//!    codec and scheduler in image order. The loader is the only caller allowed to write
//!    while the device is held in reset.
//! 3. **Commit:** Once every segment is written the device becomes `Loaded` with the entry
//!    point recorded. A failed write leaves the device state unchanged.

use tracing::{debug, info};

use super::driver::Driver;
use super::image::Segment;
use crate::common::Result;
use crate::core::Hart;

/// Loads segment lists into a driver's device.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageLoader;

impl ImageLoader {
    /// Writes `segments` in order, then marks the device loaded at `entry_point`.
    ///
    /// # Arguments
    ///
    /// * `driver` - Driver owning the device.
    /// * `entry_point` - Address execution will start at.
    /// * `segments` - Blocks to write, in order. Empty blocks are skipped.
    ///
    /// # Returns
    ///
    /// Total bytes written.
    ///
    /// # Errors
    ///
    /// `Precondition::InvalidState` outside `Reset`/`Loaded`, or the first error from a
    /// segment write. The device state is not changed on error.
    pub fn load<H: Hart>(
        driver: &mut Driver<H>,
        entry_point: u64,
        segments: &[Segment],
    ) -> Result<u64> {
        driver.controller().ensure_loadable()?;

        let mut written = 0;
        for segment in segments.iter().filter(|s| !s.data.is_empty()) {
            debug!(addr = %segment.addr, len = segment.data.len(), "load segment");
            driver.write_segment(segment.addr, &segment.data)?;
            written += segment.data.len() as u64;
        }

        driver.controller_mut().mark_loaded(entry_point)?;
        info!(
            entry = format_args!("{entry_point:#x}"),
            segments = segments.len(),
            bytes = written,
            "image loaded"
        );
        Ok(written)
    }
}
