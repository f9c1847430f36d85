// src/blocks/data_block.rs
//! Data section codec.
//!
//! Each point frame is stored as `marker_count * 4` point values (x, y, z,
//! residual word) followed by `samples_per_frame * channel_count` analog
//! values, sample-major. Integer storage uses 16-bit words; float storage
//! uses 32-bit floats.

use crate::{
    Error, Result,
    blocks::common::{ByteReader, ByteWriter, block_offset},
    streams::{AnalogStream, PointSample, PointStream},
    types::{Processor, StorageFormat},
};
use tracing::debug;

/// Shape and encoding of the analog part of each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalogLayout {
    pub channel_count: usize,
    pub samples_per_frame: usize,
    /// `ANALOG:FORMAT` is `"UNSIGNED"`: integer samples are `u16`.
    pub unsigned: bool,
}

impl AnalogLayout {
    pub fn values_per_frame(&self) -> usize {
        self.channel_count * self.samples_per_frame
    }
}

/// Decode `frame_count` frames starting at 1-based block `data_start`.
///
/// # Arguments
/// * `file` - The complete file contents.
/// * `data_start` - Block number from the header.
/// * `frame_count` - Number of point frames to read.
/// * `marker_count` - Markers per frame.
/// * `format` - Storage format from the header scale sign.
/// * `scale` - Header scale factor, applied to integer coordinates.
/// * `analog` - Analog channel layout.
/// * `processor` - Byte order and float encoding.
#[allow(clippy::too_many_arguments)]
pub fn decode_samples(
    file: &[u8],
    data_start: u16,
    frame_count: usize,
    marker_count: usize,
    format: StorageFormat,
    scale: f32,
    analog: AnalogLayout,
    processor: Processor,
) -> Result<(PointStream, AnalogStream)> {
    let values_per_frame = marker_count * 4 + analog.values_per_frame();
    if data_start == 0 && frame_count > 0 && values_per_frame > 0 {
        return Err(Error::InvalidBlockPointer {
            field: "data start",
            block: 0,
        });
    }
    let offset = block_offset(data_start as usize);
    let available = file.len().saturating_sub(offset);
    let needed = frame_count
        .checked_mul(values_per_frame)
        .and_then(|n| n.checked_mul(format.value_size()))
        .unwrap_or(usize::MAX);
    if needed > available {
        return Err(Error::TruncatedInput {
            offset,
            needed,
            available,
        });
    }
    debug!(
        data_start,
        frame_count,
        marker_count,
        analog_channels = analog.channel_count,
        ?format,
        "decoding data section"
    );

    let mut r = ByteReader::at(file, offset, processor);
    let mut points = Vec::with_capacity(frame_count * marker_count);
    let mut analogs = Vec::with_capacity(frame_count * analog.values_per_frame());

    // Without stored values the frame count is unchecked by the length test.
    let frames_to_read = if values_per_frame == 0 { 0 } else { frame_count };
    for _ in 0..frames_to_read {
        for _ in 0..marker_count {
            let sample = match format {
                StorageFormat::Integer => PointSample {
                    x: r.read_i16()? as f32 * scale,
                    y: r.read_i16()? as f32 * scale,
                    z: r.read_i16()? as f32 * scale,
                    residual: r.read_i16()? as f32,
                },
                StorageFormat::Float => PointSample {
                    x: r.read_f32()?,
                    y: r.read_f32()?,
                    z: r.read_f32()?,
                    residual: r.read_f32()?,
                },
            };
            points.push(sample);
        }
        for _ in 0..analog.values_per_frame() {
            let value = match format {
                StorageFormat::Integer if analog.unsigned => r.read_u16()? as f32,
                StorageFormat::Integer => r.read_i16()? as f32,
                StorageFormat::Float => r.read_f32()?,
            };
            analogs.push(value);
        }
    }

    Ok((
        PointStream::new(marker_count, frame_count, points)?,
        AnalogStream::new(
            analog.channel_count,
            frame_count.saturating_mul(analog.samples_per_frame),
            analogs,
        )?,
    ))
}

fn to_i16(value: f32) -> i16 {
    value.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

fn to_u16(value: f32) -> u16 {
    value.round().clamp(0.0, u16::MAX as f32) as u16
}

/// Append the data section for `points` and `analogs` to `w`.
///
/// The analog stream must hold exactly `samples_per_frame` analog frames per
/// point frame. The caller pads the section to a block boundary.
pub fn encode_samples(
    w: &mut ByteWriter,
    points: &PointStream,
    analogs: &AnalogStream,
    format: StorageFormat,
    scale: f32,
    analog: AnalogLayout,
) -> Result<()> {
    let frame_count = points.frame_count();
    if analogs.channel_count() != analog.channel_count
        || analogs.frame_count() != frame_count * analog.samples_per_frame
    {
        return Err(Error::Serialization(format!(
            "analog stream {:?} does not match {} point frames at {} samples per frame",
            analogs.shape(),
            frame_count,
            analog.samples_per_frame
        )));
    }
    if format == StorageFormat::Integer && scale == 0.0 && points.marker_count() > 0 {
        return Err(Error::Serialization(
            "integer storage requires a non-zero scale factor".to_string(),
        ));
    }

    let markers = points.marker_count();
    let per_frame = analog.values_per_frame();
    for frame in 0..frame_count {
        for sample in &points.samples()[frame * markers..(frame + 1) * markers] {
            match format {
                StorageFormat::Integer => {
                    w.write_i16(to_i16(sample.x / scale));
                    w.write_i16(to_i16(sample.y / scale));
                    w.write_i16(to_i16(sample.z / scale));
                    w.write_i16(to_i16(sample.residual));
                }
                StorageFormat::Float => {
                    w.write_f32(sample.x);
                    w.write_f32(sample.y);
                    w.write_f32(sample.z);
                    w.write_f32(sample.residual);
                }
            }
        }
        for &value in &analogs.samples()[frame * per_frame..(frame + 1) * per_frame] {
            match format {
                StorageFormat::Integer if analog.unsigned => w.write_u16(to_u16(value)),
                StorageFormat::Integer => w.write_i16(to_i16(value)),
                StorageFormat::Float => w.write_f32(value),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::BLOCK_SIZE;

    fn layout(channels: usize, spf: usize) -> AnalogLayout {
        AnalogLayout {
            channel_count: channels,
            samples_per_frame: spf,
            unsigned: false,
        }
    }

    fn streams() -> (PointStream, AnalogStream) {
        let points = PointStream::new(
            2,
            3,
            (0..6)
                .map(|i| PointSample::new(i as f32 * 0.5, -(i as f32), 100.0, 0x0102 as f32))
                .collect(),
        )
        .unwrap();
        let analogs = AnalogStream::new(2, 6, (0..12).map(|i| i as f32 - 6.0).collect()).unwrap();
        (points, analogs)
    }

    fn roundtrip(format: StorageFormat, scale: f32, processor: Processor) -> Result<()> {
        let (points, analogs) = streams();
        let mut w = ByteWriter::new(processor);
        w.write_bytes(&[0u8; BLOCK_SIZE]);
        encode_samples(&mut w, &points, &analogs, format, scale, layout(2, 2))?;
        let (p, a) = decode_samples(
            w.as_slice(),
            2,
            3,
            2,
            format,
            scale,
            layout(2, 2),
            processor,
        )?;
        assert_eq!(p, points);
        assert_eq!(a, analogs);
        Ok(())
    }

    #[test]
    fn integer_and_float_roundtrip() -> Result<()> {
        roundtrip(StorageFormat::Integer, 0.5, Processor::Intel)?;
        roundtrip(StorageFormat::Float, -1.0, Processor::Intel)?;
        roundtrip(StorageFormat::Integer, 0.25, Processor::Mips)?;
        roundtrip(StorageFormat::Float, -0.1, Processor::Dec)
    }

    #[test]
    fn short_payload_is_truncated_input() -> Result<()> {
        let (points, analogs) = streams();
        let mut w = ByteWriter::new(Processor::Intel);
        w.write_bytes(&[0u8; BLOCK_SIZE]);
        encode_samples(&mut w, &points, &analogs, StorageFormat::Float, -1.0, layout(2, 2))?;
        let bytes = &w.as_slice()[..w.len() - 1];
        assert!(matches!(
            decode_samples(
                bytes,
                2,
                3,
                2,
                StorageFormat::Float,
                -1.0,
                layout(2, 2),
                Processor::Intel
            ),
            Err(Error::TruncatedInput { .. })
        ));
        Ok(())
    }

    #[test]
    fn unsigned_analog_samples() -> Result<()> {
        let points = PointStream::new(0, 2, Vec::new())?;
        let analogs = AnalogStream::new(1, 2, vec![0.0, 65535.0])?;
        let unsigned = AnalogLayout {
            unsigned: true,
            ..layout(1, 1)
        };
        let mut w = ByteWriter::new(Processor::Intel);
        w.write_bytes(&[0u8; BLOCK_SIZE]);
        encode_samples(&mut w, &points, &analogs, StorageFormat::Integer, 1.0, unsigned)?;
        assert_eq!(&w.as_slice()[BLOCK_SIZE..], &[0, 0, 0xff, 0xff]);
        let (_, a) = decode_samples(
            w.as_slice(),
            2,
            2,
            0,
            StorageFormat::Integer,
            1.0,
            unsigned,
            Processor::Intel,
        )?;
        assert_eq!(a.samples(), &[0.0, 65535.0]);
        Ok(())
    }

    #[test]
    fn mismatched_analog_stream_rejected() {
        let (points, analogs) = streams();
        let mut w = ByteWriter::new(Processor::Intel);
        assert!(
            encode_samples(
                &mut w,
                &points,
                &analogs,
                StorageFormat::Float,
                -1.0,
                layout(2, 3)
            )
            .is_err()
        );
    }
}
