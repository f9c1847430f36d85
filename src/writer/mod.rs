//! C3D file writer.
//!
//! [`encode`] turns a [`Document`] back into a complete byte stream:
//!
//! ```text
//! block 1                header
//! blocks 2..p            zero filled, when the header points further out
//! block p..              parameter section (header byte 0 = p)
//! block d..              data section (header data_start = d)
//! ```
//!
//! Every pointer is recomputed from the encoded sizes: the parameter block
//! count, the data start block in both the header and `POINT:DATA_START`, and
//! the per-frame point/analog counts in the header. Nothing is copied from the
//! decoded file that could have gone stale.

use crate::{
    Document, Error, Result,
    blocks::{BLOCK_SIZE, ByteWriter, common::blocks_for, encode_samples},
};
use tracing::debug;

/// Serialize `document` to a complete C3D byte stream.
///
/// # Errors
/// [`Error::Serialization`] when the document cannot be represented: header
/// frame bounds disagreeing with the point stream, counts beyond the 16-bit
/// header fields, or parameter records too large for their offsets.
pub fn encode(document: &Document) -> Result<Vec<u8>> {
    let processor = document.processor();
    let points = document.points();
    let analogs = document.analogs();
    let layout = document.analog_layout();
    let mut header = document.header().clone();
    let mut parameters = document.parameters().clone();

    let frame_count = points.frame_count();
    if header.last_frame != u16::MAX && header.point_frame_count() != frame_count {
        return Err(Error::Serialization(format!(
            "header frames {}..={} do not match {} point frames",
            header.first_frame, header.last_frame, frame_count
        )));
    }

    header.point_count = u16::try_from(points.marker_count()).map_err(|_| {
        Error::Serialization(format!("{} markers exceed the header limit", points.marker_count()))
    })?;
    header.analog_per_frame = u16::try_from(layout.values_per_frame()).map_err(|_| {
        Error::Serialization(format!(
            "{} analog values per frame exceed the header limit",
            layout.values_per_frame()
        ))
    })?;

    // The section size does not depend on the DATA_START value, so the first
    // encoding fixes where the data goes.
    let parameter_block = header.parameter_block as usize;
    if parameter_block < 2 {
        return Err(Error::InvalidBlockPointer {
            field: "parameter block",
            block: parameter_block,
        });
    }
    let section_blocks = blocks_for(parameters.to_bytes()?.len());
    let data_start = parameter_block + section_blocks;
    header.data_start = u16::try_from(data_start).map_err(|_| {
        Error::Serialization(format!("data start block {data_start} exceeds 65535"))
    })?;
    if let Some(p) = parameters.get_mut("POINT", "DATA_START") {
        p.set_numbers(&[data_start as f64])?;
    }
    let section = parameters.to_bytes()?;

    let format = header.storage_format();
    let payload = frame_count * (points.marker_count() * 4 + layout.values_per_frame());
    let capacity = (data_start - 1) * BLOCK_SIZE + payload * format.value_size() + BLOCK_SIZE;
    let mut w = ByteWriter::with_capacity(processor, capacity);

    // 1. Header block
    w.write_bytes(&header.to_bytes(processor)?);

    // 2. Gap up to the parameter section, if the header points past block 2
    w.write_bytes(&vec![0u8; (parameter_block - 2) * BLOCK_SIZE]);

    // 3. Parameter section (already block aligned)
    w.write_bytes(&section);

    // 4. Data section
    encode_samples(
        &mut w,
        points,
        analogs,
        format,
        header.scale_factor,
        layout,
    )?;
    w.pad_to_block();

    debug!(
        %processor,
        parameter_blocks = section_blocks,
        data_start,
        frames = frame_count,
        bytes = w.len(),
        "encoded C3D document"
    );
    Ok(w.into_inner())
}
