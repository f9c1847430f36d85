use crate::{
    Document, Error, Result,
    blocks::{AnalogLayout, Header, ParameterDirectory, decode_samples},
    document::is_unsigned,
};
use tracing::{debug, warn};

/// Parse a complete C3D file from a byte buffer.
///
/// The parameter section is read first: its header holds the processor type
/// that fixes the byte order of the header block.
///
/// # Arguments
/// * `bytes` - Complete file contents.
///
/// # Returns
/// The decoded [`Document`], or:
/// - [`Error::NotAC3DFile`](crate::Error::NotAC3DFile) when the key byte is wrong
/// - [`Error::TruncatedInput`](crate::Error::TruncatedInput) when a section is cut short
/// - [`Error::ParameterNotFound`](crate::Error::ParameterNotFound) when `POINT:USED`
///   or `ANALOG:USED` is missing while the header declares points or channels
/// - [`Error::InvalidAnalogLayout`](crate::Error::InvalidAnalogLayout) when the analog values per frame do not
///   split into whole channels
pub fn decode(bytes: &[u8]) -> Result<Document> {
    let parameter_block = Header::parameter_block_of(bytes)?;
    let parameters = ParameterDirectory::from_bytes(bytes, parameter_block)?;
    let processor = parameters.processor;
    let mut header = Header::from_bytes(bytes, processor)?;

    let marker_count = header.point_count as usize;
    if marker_count > 0 {
        let used = parameters.require("POINT", "USED")?.number().unwrap_or(0.0);
        if used as usize != marker_count {
            warn!(
                header = marker_count,
                parameter = used,
                "POINT:USED disagrees with the header point count"
            );
        }
    }

    let values_per_frame = header.analog_per_frame;
    let samples_per_frame = header.analog_samples_per_frame;
    if values_per_frame > 0 && (samples_per_frame == 0 || values_per_frame % samples_per_frame != 0)
    {
        return Err(Error::InvalidAnalogLayout {
            values_per_frame,
            samples_per_frame,
        });
    }

    let channel_count = header.analog_channel_count();
    if channel_count > 0 {
        let used = parameters.require("ANALOG", "USED")?.number().unwrap_or(0.0);
        if used as usize != channel_count {
            warn!(
                header = channel_count,
                parameter = used,
                "ANALOG:USED disagrees with the header channel count"
            );
        }
    }

    let frame_count = point_frame_count(&header, &parameters);
    let layout = AnalogLayout {
        channel_count,
        samples_per_frame: header.analog_samples_per_frame as usize,
        unsigned: is_unsigned(&parameters),
    };
    let (points, analogs) = decode_samples(
        bytes,
        header.data_start,
        frame_count,
        marker_count,
        header.storage_format(),
        header.scale_factor,
        layout,
        processor,
    )?;

    let spf = layout.samples_per_frame as u32;
    let analog_first = (header.first_frame as u32).saturating_sub(1) * spf + 1;
    let analog_frames = u32::try_from(frame_count)
        .unwrap_or(u32::MAX)
        .saturating_mul(spf);
    header.set_analog_frame_bounds(
        analog_first,
        (analog_first - 1).saturating_add(analog_frames),
    );

    debug!(
        %processor,
        frames = frame_count,
        markers = marker_count,
        analog_channels = channel_count,
        "decoded C3D document"
    );
    Ok(Document::from_parts(header, parameters, points, analogs))
}

/// Number of point frames in the data section.
///
/// The header's 16-bit last frame saturates at 65535; longer recordings carry
/// the real count in `POINT:LONG_FRAMES`.
fn point_frame_count(header: &Header, parameters: &ParameterDirectory) -> usize {
    if header.last_frame == u16::MAX {
        if let Some(long_frames) = parameters.number("POINT", "LONG_FRAMES") {
            // Absurd counts saturate; the data section length check rejects them.
            if long_frames.is_finite() && long_frames >= 0.0 {
                return long_frames as usize;
            }
            warn!(long_frames, "ignoring unusable POINT:LONG_FRAMES");
        }
    }
    header.point_frame_count()
}
