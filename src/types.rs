//! Shared types used across the library.

use crate::{Error, Result};

/// Processor type declared in the parameter section header.
///
/// It fixes the byte order of every 16/32-bit field in the file and the
/// floating-point encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Processor {
    /// Little-endian, IEEE-754 floats.
    #[default]
    Intel,
    /// Little-endian words, DEC F-floating floats.
    Dec,
    /// Big-endian, IEEE-754 floats.
    Mips,
}

impl Processor {
    /// Parse the processor byte (`83 + type`).
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            84 => Ok(Processor::Intel),
            85 => Ok(Processor::Dec),
            86 => Ok(Processor::Mips),
            other => Err(Error::UnsupportedProcessor(other)),
        }
    }

    /// Processor byte written to the parameter section header.
    pub fn to_u8(self) -> u8 {
        match self {
            Processor::Intel => 84,
            Processor::Dec => 85,
            Processor::Mips => 86,
        }
    }

    /// Whether integers and floats are stored most significant byte first.
    ///
    /// DEC files are little-endian integers with VAX floats.
    #[inline]
    pub fn is_big_endian(self) -> bool {
        matches!(self, Processor::Mips)
    }
}

impl core::fmt::Display for Processor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Processor::Intel => write!(f, "Intel"),
            Processor::Dec => write!(f, "DEC"),
            Processor::Mips => write!(f, "MIPS"),
        }
    }
}

/// How point and analog samples are stored in the data section.
///
/// The header scale factor carries this: a negative scale means floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StorageFormat {
    /// 16-bit integers; point coordinates are multiplied by the scale factor.
    Integer,
    /// 32-bit floats in physical units.
    Float,
}

impl StorageFormat {
    /// Storage implied by the header scale factor: negative means floats.
    pub fn from_scale(scale: f32) -> Self {
        if scale < 0.0 {
            StorageFormat::Float
        } else {
            StorageFormat::Integer
        }
    }

    /// Size in bytes of one stored sample value.
    #[inline]
    pub fn value_size(self) -> usize {
        match self {
            StorageFormat::Integer => 2,
            StorageFormat::Float => 4,
        }
    }
}

/// Element type of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParameterType {
    Char,
    Byte,
    Integer,
    Float,
}

impl ParameterType {
    /// Convert the stored type code to a `ParameterType`.
    /// Codes other than -1, 1, 2 and 4 yield `None`.
    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            -1 => Some(ParameterType::Char),
            1 => Some(ParameterType::Byte),
            2 => Some(ParameterType::Integer),
            4 => Some(ParameterType::Float),
            _ => None,
        }
    }

    pub fn code(self) -> i8 {
        match self {
            ParameterType::Char => -1,
            ParameterType::Byte => 1,
            ParameterType::Integer => 2,
            ParameterType::Float => 4,
        }
    }

    /// Number of bytes per element.
    #[inline]
    pub fn size(self) -> usize {
        self.code().unsigned_abs() as usize
    }
}

impl core::fmt::Display for ParameterType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ParameterType::Char => write!(f, "char"),
            ParameterType::Byte => write!(f, "int8"),
            ParameterType::Integer => write!(f, "int16"),
            ParameterType::Float => write!(f, "float32"),
        }
    }
}
