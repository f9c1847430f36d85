//! Whole-file decoding.

mod c3d_file;

pub use c3d_file::decode;
