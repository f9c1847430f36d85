// src/blocks/parameter.rs
use crate::{
    Error, Result,
    blocks::common::{ByteReader, ByteWriter, trim_text},
    types::{ParameterType, Processor},
};

/// Typed value array of a parameter.
///
/// Elements are stored column-major in the order the file holds them; the
/// owning [`Parameter`] carries the dimensions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParameterValue {
    Char(Vec<u8>),
    Byte(Vec<i8>),
    Integer(Vec<i16>),
    Float(Vec<f32>),
}

impl ParameterValue {
    pub fn parameter_type(&self) -> ParameterType {
        match self {
            ParameterValue::Char(_) => ParameterType::Char,
            ParameterValue::Byte(_) => ParameterType::Byte,
            ParameterValue::Integer(_) => ParameterType::Integer,
            ParameterValue::Float(_) => ParameterType::Float,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            ParameterValue::Char(v) => v.len(),
            ParameterValue::Byte(v) => v.len(),
            ParameterValue::Integer(v) => v.len(),
            ParameterValue::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element `index` as a number. Character values yield `None`.
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        match self {
            ParameterValue::Char(_) => None,
            ParameterValue::Byte(v) => v.get(index).map(|&x| x as f64),
            ParameterValue::Integer(v) => v.get(index).map(|&x| x as f64),
            ParameterValue::Float(v) => v.get(index).map(|&x| x as f64),
        }
    }

    fn read(r: &mut ByteReader<'_>, kind: ParameterType, count: usize) -> Result<Self> {
        Ok(match kind {
            ParameterType::Char => ParameterValue::Char(r.take(count)?.to_vec()),
            ParameterType::Byte => {
                ParameterValue::Byte(r.take(count)?.iter().map(|&b| b as i8).collect())
            }
            ParameterType::Integer => {
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(r.read_i16()?);
                }
                ParameterValue::Integer(values)
            }
            ParameterType::Float => {
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(r.read_f32()?);
                }
                ParameterValue::Float(values)
            }
        })
    }

    fn write(&self, w: &mut ByteWriter) {
        match self {
            ParameterValue::Char(v) => w.write_bytes(v),
            ParameterValue::Byte(v) => v.iter().for_each(|&x| w.write_i8(x)),
            ParameterValue::Integer(v) => v.iter().for_each(|&x| w.write_i16(x)),
            ParameterValue::Float(v) => v.iter().for_each(|&x| w.write_f32(x)),
        }
    }
}

/// A named, typed, dimensioned value inside a parameter group.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Parameter {
    pub name: String,
    pub description: String,
    /// Locked parameters are stored with a negative name length.
    pub locked: bool,
    /// Extents, first index varying fastest. Empty for a scalar.
    pub dimensions: Vec<u8>,
    pub value: ParameterValue,
}

impl Parameter {
    pub fn new(name: &str, dimensions: Vec<u8>, value: ParameterValue) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            locked: false,
            dimensions,
            value,
        }
    }

    pub fn scalar_i16(name: &str, value: i16) -> Self {
        Self::new(name, Vec::new(), ParameterValue::Integer(vec![value]))
    }

    pub fn scalar_f32(name: &str, value: f32) -> Self {
        Self::new(name, Vec::new(), ParameterValue::Float(vec![value]))
    }

    /// Build a 2-D character array: one fixed-width, space-padded entry per string.
    ///
    /// Strings longer than 255 bytes are truncated.
    pub fn from_strings<S: AsRef<str>>(name: &str, strings: &[S]) -> Result<Self> {
        let width = strings
            .iter()
            .map(|s| s.as_ref().len())
            .max()
            .unwrap_or(0)
            .min(u8::MAX as usize);
        let count = u8::try_from(strings.len()).map_err(|_| {
            Error::Serialization(format!(
                "{name}: {} strings exceed the 255-entry dimension limit",
                strings.len()
            ))
        })?;
        let mut w = ByteWriter::new(Processor::Intel);
        for s in strings {
            w.write_padded_str(s.as_ref(), width);
        }
        Ok(Self::new(
            name,
            vec![width as u8, count],
            ParameterValue::Char(w.into_inner()),
        ))
    }

    /// Number of elements the dimensions declare.
    pub fn element_count(&self) -> usize {
        self.dimensions.iter().map(|&d| d as usize).product()
    }

    pub fn parameter_type(&self) -> ParameterType {
        self.value.parameter_type()
    }

    /// First element as a number.
    pub fn number(&self) -> Option<f64> {
        self.value.get_f64(0)
    }

    /// All elements as numbers; empty for character parameters.
    pub fn numbers(&self) -> Vec<f64> {
        (0..self.value.len())
            .filter_map(|i| self.value.get_f64(i))
            .collect()
    }

    /// Character data split into entries of `dimensions[0]` bytes, trimmed.
    pub fn strings(&self) -> Vec<String> {
        let ParameterValue::Char(data) = &self.value else {
            return Vec::new();
        };
        match self.dimensions.first() {
            None => vec![trim_text(data)],
            Some(&width) if width == 0 => Vec::new(),
            Some(&width) => data.chunks(width as usize).map(trim_text).collect(),
        }
    }

    /// Number of string entries declared by the dimensions.
    pub fn string_count(&self) -> usize {
        match self.dimensions.len() {
            0 | 1 => 1,
            _ => self.dimensions[1..].iter().map(|&d| d as usize).product(),
        }
    }

    /// Overwrite the numeric elements while keeping the declared element type.
    ///
    /// When the element count changes the dimensions become `[len]` (or a
    /// scalar for a single value). Integer and byte values that overflow the
    /// signed range but fit the unsigned one are stored as their unsigned bit
    /// pattern, which is how C3D writers extend 16-bit counts.
    pub fn set_numbers(&mut self, values: &[f64]) -> Result<()> {
        let name = &self.name;
        let value = match self.value {
            ParameterValue::Char(_) => {
                return Err(Error::Serialization(format!(
                    "{name}: cannot store numbers in a character parameter"
                )));
            }
            ParameterValue::Byte(_) => ParameterValue::Byte(
                values
                    .iter()
                    .map(|&v| {
                        let v = v.round() as i64;
                        if (i8::MIN as i64..=u8::MAX as i64).contains(&v) {
                            Ok(v as u8 as i8)
                        } else {
                            Err(Error::Serialization(format!("{name}: {v} does not fit 8 bits")))
                        }
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            ParameterValue::Integer(_) => ParameterValue::Integer(
                values
                    .iter()
                    .map(|&v| {
                        let v = v.round() as i64;
                        if (i16::MIN as i64..=u16::MAX as i64).contains(&v) {
                            Ok(v as u16 as i16)
                        } else {
                            Err(Error::Serialization(format!("{name}: {v} does not fit 16 bits")))
                        }
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            ParameterValue::Float(_) => {
                ParameterValue::Float(values.iter().map(|&v| v as f32).collect())
            }
        };
        if value.len() != self.value.len() {
            self.dimensions = match value.len() {
                1 if self.dimensions.is_empty() => Vec::new(),
                n => vec![u8::try_from(n).map_err(|_| {
                    Error::Serialization(format!("{name}: {n} elements exceed one dimension"))
                })?],
            };
        }
        self.value = value;
        Ok(())
    }

    /// Remove every entry of a character array, keeping its entry width.
    pub fn clear_strings(&mut self) {
        let width = self.dimensions.first().copied().unwrap_or(0);
        self.dimensions = vec![width, 0];
        self.value = ParameterValue::Char(Vec::new());
    }

    /// Parse the part of a parameter record that follows the offset field.
    ///
    /// Returns `Ok(None)` when the record is not understood (unknown type code
    /// or data running past the record), so the caller can keep it opaque.
    pub(crate) fn decode_body(
        name: String,
        locked: bool,
        body: &[u8],
        processor: Processor,
    ) -> Result<Option<Self>> {
        let mut r = ByteReader::new(body, processor);
        let Ok(code) = r.read_i8() else {
            return Ok(None);
        };
        let Some(kind) = ParameterType::from_code(code) else {
            return Ok(None);
        };
        let Ok(rank) = r.read_u8() else {
            return Ok(None);
        };
        let Ok(dims) = r.take(rank as usize) else {
            return Ok(None);
        };
        let dimensions = dims.to_vec();
        let count: usize = dimensions.iter().map(|&d| d as usize).product();
        if count * kind.size() > r.remaining() {
            return Ok(None);
        }
        let value = ParameterValue::read(&mut r, kind, count)?;

        // Some writers end the last record without a description.
        let description = match r.read_u8() {
            Ok(len) => {
                let len = (len as usize).min(r.remaining());
                r.read_string(len)?
            }
            Err(_) => String::new(),
        };

        Ok(Some(Self {
            name,
            description,
            locked,
            dimensions,
            value,
        }))
    }

    /// Serialize everything after the offset field.
    pub(crate) fn encode_body(&self, processor: Processor) -> Result<Vec<u8>> {
        if self.value.len() != self.element_count() {
            return Err(Error::Serialization(format!(
                "{}: dimensions {:?} declare {} elements, value holds {}",
                self.name,
                self.dimensions,
                self.element_count(),
                self.value.len()
            )));
        }
        let rank = u8::try_from(self.dimensions.len()).map_err(|_| {
            Error::Serialization(format!("{}: too many dimensions", self.name))
        })?;
        let description_len = u8::try_from(self.description.len()).map_err(|_| {
            Error::Serialization(format!("{}: description longer than 255 bytes", self.name))
        })?;

        let mut w = ByteWriter::new(processor);
        w.write_i8(self.parameter_type().code());
        w.write_u8(rank);
        w.write_bytes(&self.dimensions);
        self.value.write(&mut w);
        w.write_u8(description_len);
        w.write_bytes(self.description.as_bytes());
        Ok(w.into_inner())
    }
}
