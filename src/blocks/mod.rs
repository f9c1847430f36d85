// src/blocks/mod.rs

// ============================================================================
// Section Constants (internal use only)
// ============================================================================
// A C3D file is a sequence of 512-byte blocks: the header block, the
// parameter section and the data section. Block numbers stored in the file are
// 1-based.

/// Size of one block (and of the header section).
pub(crate) const BLOCK_SIZE: usize = 512;

/// Key byte stored at offset 1 of the header and of the parameter section.
pub(crate) const C3D_KEY: u8 = 0x50;

/// Header key marking the event section as present (4-character labels).
pub(crate) const EVENT_KEY: u16 = 12345;

/// Number of event slots in the header.
pub(crate) const MAX_EVENTS: usize = 18;

/// Label count from which `POINT:LABELS2` continues `POINT:LABELS`.
pub(crate) const LABELS_OVERFLOW: usize = 255;

// ============================================================================
// Submodules
// ============================================================================

pub(crate) mod common;
mod data_block;
mod header_block;
mod parameter;
mod parameter_block;

pub use common::{ByteReader, ByteWriter};
pub use data_block::{AnalogLayout, decode_samples, encode_samples};
pub use header_block::{Event, Header};
pub use parameter::{Parameter, ParameterValue};
pub use parameter_block::{Group, OpaqueRecord, ParameterDirectory};
