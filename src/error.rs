//! Error types for C3D operations.
//!
//! This module defines the [`Error`] enum which represents all possible failures
//! that can occur when decoding, cropping, or encoding C3D files.
//!
//! # Example
//!
//! ```no_run
//! use c3d_crop::{Document, Error, Result};
//!
//! fn load(path: &str) -> Result<()> {
//!     match Document::from_file(path) {
//!         Ok(doc) => {
//!             println!("Loaded {} point frames", doc.points().frame_count());
//!             Ok(())
//!         }
//!         Err(Error::NotAC3DFile { found }) => {
//!             eprintln!("Not a C3D file (key byte {found:#04x})");
//!             Err(Error::NotAC3DFile { found })
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! ```

use thiserror::Error;

/// Errors that can occur during C3D file operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The second byte of the header is not the C3D key `0x50`.
    #[error("not a C3D file: expected key byte 0x50, found {found:#04x}")]
    NotAC3DFile {
        /// The byte found where the key was expected
        found: u8,
    },

    /// A read would run past the end of the input.
    ///
    /// This typically indicates file corruption or an incomplete copy.
    #[error("truncated input at offset {offset}: need {needed} bytes, {available} available")]
    TruncatedInput {
        /// Absolute offset of the failed read
        offset: usize,
        /// Number of bytes the read required
        needed: usize,
        /// Number of bytes left in the buffer
        available: usize,
    },

    /// A parameter the operation cannot do without is missing.
    #[error("parameter {group}:{name} not found")]
    ParameterNotFound {
        /// Group name
        group: String,
        /// Parameter name
        name: String,
    },

    /// `analog_rate / point_rate` is not a positive integer.
    #[error("analog rate {analog_rate} Hz is not a positive integer multiple of point rate {point_rate} Hz")]
    UnsupportedRateRatio {
        /// `ANALOG:RATE`
        analog_rate: f64,
        /// `POINT:RATE`
        point_rate: f64,
    },

    /// The requested frame indices fall outside the stream.
    #[error("frame range {start}..{end} is outside the available range 0..{frame_count}")]
    RangeOutOfBounds {
        /// Inclusive start index
        start: i64,
        /// Exclusive end index
        end: i64,
        /// Number of frames in the stream
        frame_count: usize,
    },

    /// The requested window selects no frames.
    #[error("frame range {start}..{end} is empty")]
    EmptyRange {
        /// Inclusive start index
        start: i64,
        /// Exclusive end index
        end: i64,
    },

    /// A block pointer in the header or parameter section is unusable.
    #[error("invalid {field} pointer: block {block}")]
    InvalidBlockPointer {
        /// Which pointer was rejected
        field: &'static str,
        /// The stored block number
        block: usize,
    },

    /// The header's analog values per frame is not a whole number of
    /// channels at its samples per frame.
    #[error(
        "header declares {values_per_frame} analog values per frame, not a multiple of {samples_per_frame} samples per frame"
    )]
    InvalidAnalogLayout {
        /// Header word 3: channels times samples per frame
        values_per_frame: u16,
        /// Header word 10
        samples_per_frame: u16,
    },

    /// The parameter section declares a processor type other than Intel, DEC or MIPS.
    #[error("unsupported processor type {0} (expected 84, 85 or 86)")]
    UnsupportedProcessor(u8),

    /// The in-memory model cannot be represented in the container.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred while reading or writing a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn parameter_not_found(group: &str, name: &str) -> Self {
        Error::ParameterNotFound {
            group: group.to_string(),
            name: name.to_string(),
        }
    }
}

/// A specialized Result type for C3D operations.
///
/// This is defined as `core::result::Result<T, Error>` for convenience.
pub type Result<T> = core::result::Result<T, Error>;
