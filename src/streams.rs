//! In-memory point and analog sample streams.
//!
//! Both streams are stored frame-major, the same order the data section uses,
//! so slicing a frame range is a single contiguous copy.

use crate::{Error, Result};

/// One marker sample: coordinates plus the residual word.
///
/// The residual word is kept as stored. A negative value marks the sample as
/// invalid; otherwise the low byte times `|scale|` is the residual and the
/// high byte is the camera mask.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub residual: f32,
}

impl PointSample {
    pub fn new(x: f32, y: f32, z: f32, residual: f32) -> Self {
        Self { x, y, z, residual }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.residual >= 0.0
    }

    /// Residual in physical units, `None` for an invalid sample.
    pub fn residual_value(&self, scale: f32) -> Option<f32> {
        if !self.is_valid() {
            return None;
        }
        Some(((self.residual as i32) & 0xff) as f32 * scale.abs())
    }

    /// Cameras that contributed to the sample, one bit per camera.
    pub fn camera_mask(&self) -> u8 {
        if !self.is_valid() {
            return 0;
        }
        (((self.residual as i32) >> 8) & 0xff) as u8
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.x, self.y, self.z, self.residual]
    }
}

fn check_range(start: usize, end: usize, frame_count: usize) -> Result<()> {
    if start > end || end > frame_count {
        return Err(Error::RangeOutOfBounds {
            start: start as i64,
            end: end as i64,
            frame_count,
        });
    }
    Ok(())
}

fn check_shape(what: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::Serialization(format!(
            "{what}: shape requires {expected} samples, got {actual}"
        )));
    }
    Ok(())
}

/// Marker trajectories, shape `(marker_count, 4, frame_count)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointStream {
    marker_count: usize,
    frame_count: usize,
    samples: Vec<PointSample>,
}

impl PointStream {
    /// Build a stream from frame-major samples (`frame * marker_count + marker`).
    pub fn new(marker_count: usize, frame_count: usize, samples: Vec<PointSample>) -> Result<Self> {
        check_shape("point stream", marker_count * frame_count, samples.len())?;
        Ok(Self {
            marker_count,
            frame_count,
            samples,
        })
    }

    pub fn marker_count(&self) -> usize {
        self.marker_count
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// `(marker_count, 4, frame_count)`
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.marker_count, 4, self.frame_count)
    }

    pub fn samples(&self) -> &[PointSample] {
        &self.samples
    }

    /// All markers of one frame.
    pub fn frame(&self, frame: usize) -> Option<&[PointSample]> {
        if frame >= self.frame_count {
            return None;
        }
        let start = frame * self.marker_count;
        Some(&self.samples[start..start + self.marker_count])
    }

    pub fn get(&self, marker: usize, frame: usize) -> Option<&PointSample> {
        if marker >= self.marker_count {
            return None;
        }
        self.frame(frame)?.get(marker)
    }

    /// Trajectory of one marker across all frames.
    pub fn trajectory(&self, marker: usize) -> Option<Vec<PointSample>> {
        if marker >= self.marker_count {
            return None;
        }
        Some(
            self.samples
                .chunks(self.marker_count)
                .map(|frame| frame[marker])
                .collect(),
        )
    }

    /// Frames `start..end` as a new stream.
    pub fn slice(&self, start: usize, end: usize) -> Result<Self> {
        check_range(start, end, self.frame_count)?;
        Ok(Self {
            marker_count: self.marker_count,
            frame_count: end - start,
            samples: self.samples[start * self.marker_count..end * self.marker_count].to_vec(),
        })
    }
}

/// Analog channels, shape `(channel_count, 1, analog_frame_count)`.
///
/// Values are kept as stored; see
/// [`Document::analog_values`](crate::Document::analog_values) for physical units.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalogStream {
    channel_count: usize,
    frame_count: usize,
    samples: Vec<f32>,
}

impl AnalogStream {
    /// Build a stream from frame-major samples (`frame * channel_count + channel`).
    pub fn new(channel_count: usize, frame_count: usize, samples: Vec<f32>) -> Result<Self> {
        check_shape("analog stream", channel_count * frame_count, samples.len())?;
        Ok(Self {
            channel_count,
            frame_count,
            samples,
        })
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// `(channel_count, 1, frame_count)`
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.channel_count, 1, self.frame_count)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn get(&self, channel: usize, frame: usize) -> Option<f32> {
        if channel >= self.channel_count || frame >= self.frame_count {
            return None;
        }
        Some(self.samples[frame * self.channel_count + channel])
    }

    /// All samples of one channel, in time order.
    pub fn channel(&self, channel: usize) -> Option<Vec<f32>> {
        if channel >= self.channel_count {
            return None;
        }
        Some(
            self.samples
                .chunks(self.channel_count)
                .map(|frame| frame[channel])
                .collect(),
        )
    }

    /// Analog frames `start..end` as a new stream.
    pub fn slice(&self, start: usize, end: usize) -> Result<Self> {
        check_range(start, end, self.frame_count)?;
        Ok(Self {
            channel_count: self.channel_count,
            frame_count: end - start,
            samples: self.samples[start * self.channel_count..end * self.channel_count].to_vec(),
        })
    }
}
