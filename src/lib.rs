#![forbid(unsafe_code)]

//! # c3d-crop
//!
//! A Rust library for reading, cropping and writing C3D motion-capture files.
//!
//! C3D is the binary format used by optical motion-capture systems and force
//! platforms to store 3D marker trajectories together with analog signals
//! (force plates, EMG) and a self-describing parameter section.
//!
//! ## Features
//!
//! - **Reading**: Decode the header, the full parameter section and both data
//!   streams from Intel, DEC and MIPS files, integer or float storage
//! - **Cropping**: Keep the frames covering a time window and bring the
//!   header and parameters in line with the new frame count
//! - **Writing**: Re-encode a document with recomputed section pointers, in the
//!   processor format it was read with
//! - **Inspection**: A [`Summary`] of rates, labels and parameter groups,
//!   printable or serialized to JSON
//!
//! ## Quick Start
//!
//! ### Cropping a file
//!
//! ```no_run
//! use c3d_crop::{Result, crop_file, cropped_path};
//!
//! fn main() -> Result<()> {
//!     let input = "walk.c3d";
//!     crop_file(input, cropped_path(input), 5.1, 6.2)?;
//!     Ok(())
//! }
//! ```
//!
//! ### Working with a decoded document
//!
//! ```no_run
//! use c3d_crop::{Document, Result};
//!
//! fn main() -> Result<()> {
//!     let doc = Document::from_file("walk.c3d")?;
//!     println!("{} markers at {} Hz", doc.points().marker_count(), doc.point_rate());
//!
//!     for (marker, label) in doc.point_labels().iter().enumerate() {
//!         let visible = doc
//!             .points()
//!             .trajectory(marker)
//!             .map(|t| t.iter().filter(|s| s.is_valid()).count())
//!             .unwrap_or(0);
//!         println!("  {label}: visible in {visible} frames");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`blocks`] | Header, parameter section and data section codecs |
//! | [`parsing`] | Whole-file decoding into a [`Document`] |
//! | [`writer`] | Whole-file encoding of a [`Document`] |
//! | [`crop`] | Time-based frame extraction |
//! | [`streams`] | Point and analog sample containers |
//! | [`summary`] | Document overview for inspection |
//! | [`error`] | Error types and [`Result`] alias |
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`], which is an alias for
//! `std::result::Result<T, Error>`. The [`Error`] enum covers I/O errors,
//! malformed input, missing parameters and unsupported crop requests.

pub mod blocks;
pub mod parsing;

mod document;

pub mod crop;
pub mod error;
pub mod streams;
pub mod summary;
pub mod types;
pub mod writer;

// Re-export commonly used types at the crate root
pub use blocks::{Event, Header, Parameter, ParameterDirectory, ParameterValue};
pub use crop::{crop, crop_file, cropped_path};
pub use document::Document;
pub use error::{Error, Result};
pub use parsing::decode;
pub use streams::{AnalogStream, PointSample, PointStream};
pub use summary::Summary;
pub use types::{ParameterType, Processor, StorageFormat};
pub use writer::encode;
