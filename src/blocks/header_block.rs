// src/blocks/header_block.rs
use super::{BLOCK_SIZE, C3D_KEY, EVENT_KEY, MAX_EVENTS};
use crate::{
    Error, Result,
    blocks::common::{ByteReader, ByteWriter},
    types::{Processor, StorageFormat},
};

// Byte ranges of the header words this codec does not interpret.
const RESERVED_MAIN: core::ops::Range<usize> = 24..294;
const LABEL_RANGE: core::ops::Range<usize> = 294..298;
const EVENT_TIMES: usize = 304;
const EVENT_FLAGS: usize = 376;
const EVENT_LABELS: usize = 396;
const RESERVED_TAIL: core::ops::Range<usize> = 468..512;

/// One entry of the header event table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    /// Label, at most 4 characters.
    pub label: String,
    /// Event time in seconds.
    pub time: f32,
    /// Display flag byte as stored.
    pub display_flag: u8,
}

/// Header section - the fixed 512-byte block at the start of every C3D file.
///
/// All 16-bit and float fields are stored in the byte order of the file's
/// processor type, which is only known after looking at the parameter section
/// header (see [`Header::parameter_block_of`]).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Header {
    pub parameter_block: u8,            // byte 0
    pub point_count: u16,               // bytes[2..4]
    pub analog_per_frame: u16,          // bytes[4..6], channels * samples per frame
    pub first_frame: u16,               // bytes[6..8], 1-based
    pub last_frame: u16,                // bytes[8..10], inclusive
    pub max_interpolation_gap: u16,     // bytes[10..12]
    pub scale_factor: f32,              // bytes[12..16], negative for float storage
    pub data_start: u16,                // bytes[16..18], 1-based block
    pub analog_samples_per_frame: u16,  // bytes[18..20]
    pub frame_rate: f32,                // bytes[20..24]
    pub events_supported: bool,         // bytes[298..300] == 12345
    pub events: Vec<Event>,             // bytes[300..468]
    /// Analog frame bounds. Not stored in the file; derived on decode.
    pub analog_first_frame: u32,
    pub analog_last_frame: u32,
    /// Raw header bytes, kept so reserved words survive a rewrite.
    #[cfg_attr(feature = "serde", serde(skip))]
    reserved: Vec<u8>,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            parameter_block: 2,
            point_count: 0,
            analog_per_frame: 0,
            first_frame: 1,
            last_frame: 0,
            max_interpolation_gap: 0,
            scale_factor: -1.0,
            data_start: 0,
            analog_samples_per_frame: 0,
            frame_rate: 0.0,
            events_supported: true,
            events: Vec::new(),
            analog_first_frame: 1,
            analog_last_frame: 0,
            reserved: vec![0u8; BLOCK_SIZE],
        }
    }
}

impl Header {
    /// Validate the key byte and return the parameter section's block number.
    ///
    /// This is readable before the processor type is known: both values are
    /// single bytes.
    pub fn parameter_block_of(bytes: &[u8]) -> Result<u8> {
        if bytes.len() < BLOCK_SIZE {
            return Err(Error::TruncatedInput {
                offset: 0,
                needed: BLOCK_SIZE,
                available: bytes.len(),
            });
        }
        if bytes[1] != C3D_KEY {
            return Err(Error::NotAC3DFile { found: bytes[1] });
        }
        if bytes[0] < 2 {
            return Err(Error::InvalidBlockPointer {
                field: "parameter block",
                block: bytes[0] as usize,
            });
        }
        Ok(bytes[0])
    }

    /// Parse the header from the first 512 bytes of `bytes`.
    pub fn from_bytes(bytes: &[u8], processor: Processor) -> Result<Self> {
        let parameter_block = Self::parameter_block_of(bytes)?;
        let raw = &bytes[..BLOCK_SIZE];
        let mut r = ByteReader::at(raw, 2, processor);

        let point_count = r.read_u16()?;
        let analog_per_frame = r.read_u16()?;
        let first_frame = r.read_u16()?;
        let last_frame = r.read_u16()?;
        let max_interpolation_gap = r.read_u16()?;
        let scale_factor = r.read_f32()?;
        let data_start = r.read_u16()?;
        let analog_samples_per_frame = r.read_u16()?;
        let frame_rate = r.read_f32()?;

        r.seek(298);
        let events_supported = r.read_u16()? == EVENT_KEY;
        let event_count = (r.read_u16()? as usize).min(MAX_EVENTS);

        let mut events = Vec::with_capacity(event_count);
        for i in 0..event_count {
            r.seek(EVENT_TIMES + i * 4);
            let time = r.read_f32()?;
            r.seek(EVENT_FLAGS + i);
            let display_flag = r.read_u8()?;
            r.seek(EVENT_LABELS + i * 4);
            let label = r.read_string(4)?;
            events.push(Event {
                label,
                time,
                display_flag,
            });
        }

        let spf = analog_samples_per_frame as u32;
        let mut reserved = raw.to_vec();
        // The label/range section is never carried over.
        reserved[LABEL_RANGE].fill(0);

        Ok(Self {
            parameter_block,
            point_count,
            analog_per_frame,
            first_frame,
            last_frame,
            max_interpolation_gap,
            scale_factor,
            data_start,
            analog_samples_per_frame,
            frame_rate,
            events_supported,
            events,
            analog_first_frame: (first_frame as u32).saturating_sub(1) * spf + 1,
            analog_last_frame: last_frame as u32 * spf,
            reserved,
        })
    }

    /// Serializes the header to its 512-byte block.
    ///
    /// Reserved words and unused event slots are copied from the decoded
    /// block; the label/range pointer is cleared.
    pub fn to_bytes(&self, processor: Processor) -> Result<Vec<u8>> {
        if self.events.len() > MAX_EVENTS {
            return Err(Error::Serialization(format!(
                "header holds at most {MAX_EVENTS} events, found {}",
                self.events.len()
            )));
        }
        let template: &[u8] = if self.reserved.len() == BLOCK_SIZE {
            &self.reserved
        } else {
            &[0u8; BLOCK_SIZE]
        };

        let mut w = ByteWriter::with_capacity(processor, BLOCK_SIZE);

        // 1. Pointers and point/analog layout (24 bytes)
        w.write_u8(self.parameter_block);
        w.write_u8(C3D_KEY);
        w.write_u16(self.point_count);
        w.write_u16(self.analog_per_frame);
        w.write_u16(self.first_frame);
        w.write_u16(self.last_frame);
        w.write_u16(self.max_interpolation_gap);
        w.write_f32(self.scale_factor);
        w.write_u16(self.data_start);
        w.write_u16(self.analog_samples_per_frame);
        w.write_f32(self.frame_rate);

        // 2. Reserved words, then the cleared label/range key and block
        w.write_bytes(&template[RESERVED_MAIN]);
        w.write_u16(0);
        w.write_u16(0);

        // 3. Event section
        w.write_u16(if self.events_supported { EVENT_KEY } else { 0 });
        w.write_u16(self.events.len() as u16);
        w.write_bytes(&template[302..EVENT_TIMES]);
        for i in 0..MAX_EVENTS {
            match self.events.get(i) {
                Some(event) => w.write_f32(event.time),
                None => w.write_bytes(&template[EVENT_TIMES + i * 4..EVENT_TIMES + i * 4 + 4]),
            }
        }
        for i in 0..MAX_EVENTS {
            match self.events.get(i) {
                Some(event) => w.write_u8(event.display_flag),
                None => w.write_u8(template[EVENT_FLAGS + i]),
            }
        }
        w.write_bytes(&template[394..EVENT_LABELS]);
        for i in 0..MAX_EVENTS {
            match self.events.get(i) {
                Some(event) => w.write_padded_str(&event.label, 4),
                None => w.write_bytes(&template[EVENT_LABELS + i * 4..EVENT_LABELS + i * 4 + 4]),
            }
        }

        // 4. Reserved tail
        w.write_bytes(&template[RESERVED_TAIL]);

        if w.len() != BLOCK_SIZE {
            return Err(Error::Serialization(format!(
                "header must be exactly {BLOCK_SIZE} bytes, got {}",
                w.len()
            )));
        }
        Ok(w.into_inner())
    }

    /// Storage format implied by the sign of the scale factor.
    pub fn storage_format(&self) -> StorageFormat {
        StorageFormat::from_scale(self.scale_factor)
    }

    /// Point sampling rate in Hz.
    pub fn point_rate(&self) -> f64 {
        self.frame_rate as f64
    }

    /// Analog sampling rate in Hz.
    pub fn analog_rate(&self) -> f64 {
        self.frame_rate as f64 * self.analog_samples_per_frame as f64
    }

    /// Number of point frames declared by the first/last frame fields.
    pub fn point_frame_count(&self) -> usize {
        if self.last_frame < self.first_frame {
            return 0;
        }
        (self.last_frame - self.first_frame) as usize + 1
    }

    /// Number of analog channels implied by the per-frame analog fields.
    pub fn analog_channel_count(&self) -> usize {
        if self.analog_samples_per_frame == 0 {
            return 0;
        }
        (self.analog_per_frame / self.analog_samples_per_frame) as usize
    }

    pub fn set_point_frame_bounds(&mut self, first: u16, last: u16) {
        self.first_frame = first;
        self.last_frame = last;
    }

    pub fn set_analog_frame_bounds(&mut self, first: u32, last: u32) {
        self.analog_first_frame = first;
        self.analog_last_frame = last;
    }
}
