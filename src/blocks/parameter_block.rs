// src/blocks/parameter_block.rs
//! Parameter section: the self-describing group/parameter directory.
//!
//! # Layout
//!
//! ```text
//! byte 0      first parameter block hint (usually 1)
//! byte 1      key 0x50
//! byte 2      number of 512-byte blocks in the section
//! byte 3      processor type (84 Intel, 85 DEC, 86 MIPS)
//! records...  one per group or parameter:
//!   i8        name length, negative when locked, 0 ends the directory
//!   i8        id: negative group id for a group, owning group id for a parameter
//!   [u8]      name
//!   u16       offset from this field to the next record, 0 for the last record
//!   ...       group description, or parameter type/dimensions/data/description
//! ```

use super::{BLOCK_SIZE, C3D_KEY};
use crate::{
    Error, Result,
    blocks::{
        common::{ByteReader, ByteWriter, block_offset, blocks_for},
        parameter::{Parameter, ParameterValue},
    },
    types::Processor,
};
use tracing::{debug, trace};

/// A named set of parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Group {
    /// Group id (1..=127); parameters refer to their group by it.
    pub id: u8,
    pub name: String,
    pub description: String,
    pub locked: bool,
    pub parameters: Vec<Parameter>,
}

impl Group {
    pub fn new(id: u8, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            description: String::new(),
            locked: false,
            parameters: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.parameters
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Add a parameter, replacing any parameter of the same name in place.
    pub fn insert(&mut self, parameter: Parameter) {
        match self.get_mut(&parameter.name) {
            Some(existing) => *existing = parameter,
            None => self.parameters.push(parameter),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Parameter> {
        let idx = self
            .parameters
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))?;
        Some(self.parameters.remove(idx))
    }
}

/// A record kept byte-for-byte because it could not be interpreted.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpaqueRecord {
    pub name_len: i8,
    pub id: i8,
    pub name: Vec<u8>,
    /// Bytes following the offset field, up to the next record.
    pub body: Vec<u8>,
}

/// The decoded parameter section.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterDirectory {
    pub processor: Processor,
    pub groups: Vec<Group>,
    pub opaque: Vec<OpaqueRecord>,
    first_block_hint: u8,
}

impl Default for ParameterDirectory {
    fn default() -> Self {
        Self {
            processor: Processor::Intel,
            groups: Vec::new(),
            opaque: Vec::new(),
            first_block_hint: 1,
        }
    }
}

impl ParameterDirectory {
    pub fn new(processor: Processor) -> Self {
        Self {
            processor,
            ..Self::default()
        }
    }

    /// Parse the parameter section starting at 1-based block `parameter_block`.
    ///
    /// # Arguments
    /// * `file` - The complete file contents.
    /// * `parameter_block` - Block number from header byte 0.
    pub fn from_bytes(file: &[u8], parameter_block: u8) -> Result<Self> {
        let start = block_offset(parameter_block as usize);
        let mut r = ByteReader::at(file, start, Processor::Intel);
        let first_block_hint = r.read_u8()?;
        let _key = r.read_u8()?;
        let block_count = r.read_u8()? as usize;
        let processor = Processor::from_u8(r.read_u8()?)?;

        let end = if block_count == 0 {
            file.len()
        } else {
            (start + block_count * BLOCK_SIZE).min(file.len())
        };
        debug!(
            parameter_block,
            block_count,
            %processor,
            "decoding parameter section"
        );

        let section = &file[..end];
        let mut r = ByteReader::at(section, start + 4, processor);
        let mut groups: Vec<Group> = Vec::new();
        let mut pending: Vec<(u8, Parameter)> = Vec::new();
        let mut opaque = Vec::new();

        while r.remaining() >= 2 {
            let name_len = r.read_i8()?;
            if name_len == 0 {
                break;
            }
            let id = r.read_i8()?;
            if id == 0 {
                break;
            }
            let name_bytes = r.take(name_len.unsigned_abs() as usize)?;
            let offset_pos = r.position();
            let offset = r.read_u16()? as usize;
            let last = offset == 0;
            let record_end = if last {
                end
            } else {
                (offset_pos + offset).min(end)
            };
            if record_end < r.position() {
                debug!(offset_pos, offset, "record offset points backwards, stopping");
                break;
            }
            let body = &section[r.position()..record_end];
            let name = String::from_utf8_lossy(name_bytes).into_owned();
            let locked = name_len < 0;

            // Group ids are 1..=127; -128 has no positive counterpart that a
            // parameter could reference.
            let kind = match id {
                i8::MIN => {
                    debug!(record = %name, "group id -128 kept opaque");
                    RecordKind::Opaque
                }
                id if id < 0 => RecordKind::Group,
                _ => RecordKind::Parameter,
            };

            if kind == RecordKind::Group {
                let mut br = ByteReader::new(body, processor);
                let description = match br.read_u8() {
                    Ok(len) => {
                        let len = (len as usize).min(br.remaining());
                        br.read_string(len)?
                    }
                    Err(_) => String::new(),
                };
                trace!(group = %name, id = id.unsigned_abs(), "group record");
                groups.push(Group {
                    id: id.unsigned_abs(),
                    name,
                    description,
                    locked,
                    parameters: Vec::new(),
                });
            } else {
                let parameter = match kind {
                    RecordKind::Parameter => {
                        Parameter::decode_body(name, locked, body, processor)?
                    }
                    _ => None,
                };
                match parameter {
                    Some(parameter) => pending.push((id as u8, parameter)),
                    None => {
                        // The last record runs to the end of the section; its
                        // block padding is not part of it.
                        let body = if last { trim_trailing_zeros(body) } else { body };
                        opaque.push(OpaqueRecord {
                            name_len,
                            id,
                            name: name_bytes.to_vec(),
                            body: body.to_vec(),
                        })
                    }
                }
            }

            if last {
                break;
            }
            r.seek(record_end);
        }

        for (group_id, parameter) in pending {
            match groups.iter_mut().find(|g| g.id == group_id) {
                Some(group) => group.parameters.push(parameter),
                None => {
                    debug!(group_id, parameter = %parameter.name, "parameter without group kept opaque");
                    let body = parameter.encode_body(processor)?;
                    opaque.push(OpaqueRecord {
                        name_len: parameter_name_len(&parameter)?,
                        id: group_id as i8,
                        name: parameter.name.into_bytes(),
                        body,
                    });
                }
            }
        }

        debug!(
            groups = groups.len(),
            opaque = opaque.len(),
            "parameter section decoded"
        );
        Ok(Self {
            processor,
            groups,
            opaque,
            first_block_hint,
        })
    }

    /// Serialize the section, padded to whole blocks.
    ///
    /// Every record offset and the block count are recomputed from the
    /// current contents.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut records: Vec<(i8, i8, &[u8], Vec<u8>)> = Vec::new();
        for group in &self.groups {
            if group.id == 0 || group.id > i8::MAX as u8 {
                return Err(Error::Serialization(format!(
                    "group {} has invalid id {}",
                    group.name, group.id
                )));
            }
            let description_len = u8::try_from(group.description.len()).map_err(|_| {
                Error::Serialization(format!("group {}: description too long", group.name))
            })?;
            let mut body = Vec::with_capacity(1 + group.description.len());
            body.push(description_len);
            body.extend_from_slice(group.description.as_bytes());
            records.push((
                signed_name_len(&group.name, group.locked)?,
                -(group.id as i8),
                group.name.as_bytes(),
                body,
            ));

            for parameter in &group.parameters {
                records.push((
                    parameter_name_len(parameter)?,
                    group.id as i8,
                    parameter.name.as_bytes(),
                    parameter.encode_body(self.processor)?,
                ));
            }
        }
        for record in &self.opaque {
            records.push((
                record.name_len,
                record.id,
                record.name.as_slice(),
                record.body.clone(),
            ));
        }

        let mut w = ByteWriter::new(self.processor);
        w.write_u8(self.first_block_hint);
        w.write_u8(C3D_KEY);
        w.write_u8(0); // block count, patched below
        w.write_u8(self.processor.to_u8());

        let record_count = records.len();
        for (i, (name_len, id, name, body)) in records.into_iter().enumerate() {
            let next = body.len() + 2;
            if next > u16::MAX as usize {
                return Err(Error::Serialization(format!(
                    "record {} is {} bytes, more than a 16-bit offset can span",
                    String::from_utf8_lossy(name),
                    next
                )));
            }
            w.write_i8(name_len);
            w.write_i8(id);
            w.write_bytes(name);
            w.write_u16(if i + 1 == record_count { 0 } else { next as u16 });
            w.write_bytes(&body);
        }

        let blocks = blocks_for(w.len()).max(1);
        let blocks = u8::try_from(blocks).map_err(|_| {
            Error::Serialization(format!("parameter section needs {blocks} blocks, limit is 255"))
        })?;
        w.patch(2, &[blocks])?;
        w.pad_to_block();
        Ok(w.into_inner())
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups
            .iter()
            .find(|g| g.name.eq_ignore_ascii_case(name))
    }

    pub fn group_mut(&mut self, name: &str) -> Option<&mut Group> {
        self.groups
            .iter_mut()
            .find(|g| g.name.eq_ignore_ascii_case(name))
    }

    /// Return the group called `name`, creating it with the next free id.
    pub fn ensure_group(&mut self, name: &str) -> Result<&mut Group> {
        let idx = match self
            .groups
            .iter()
            .position(|g| g.name.eq_ignore_ascii_case(name))
        {
            Some(idx) => idx,
            None => {
                let id = (1..=i8::MAX as u8)
                    .find(|id| self.groups.iter().all(|g| g.id != *id))
                    .ok_or_else(|| Error::Serialization("no free group id".to_string()))?;
                self.groups.push(Group::new(id, name));
                self.groups.len() - 1
            }
        };
        Ok(&mut self.groups[idx])
    }

    pub fn get(&self, group: &str, name: &str) -> Option<&Parameter> {
        self.group(group)?.get(name)
    }

    pub fn get_mut(&mut self, group: &str, name: &str) -> Option<&mut Parameter> {
        self.group_mut(group)?.get_mut(name)
    }

    /// Like [`get`](Self::get) but a missing parameter is an error.
    pub fn require(&self, group: &str, name: &str) -> Result<&Parameter> {
        self.get(group, name)
            .ok_or_else(|| Error::parameter_not_found(group, name))
    }

    /// First element of a numeric parameter.
    pub fn number(&self, group: &str, name: &str) -> Option<f64> {
        self.get(group, name)?.number()
    }

    /// Replace the value and dimensions of `group:name`.
    ///
    /// An existing parameter keeps its description and lock flag; a missing one
    /// is appended to the group. Fails when the group does not exist.
    pub fn set(
        &mut self,
        group: &str,
        name: &str,
        dimensions: Vec<u8>,
        value: ParameterValue,
    ) -> Result<()> {
        let g = self
            .group_mut(group)
            .ok_or_else(|| Error::parameter_not_found(group, name))?;
        match g.get_mut(name) {
            Some(p) => {
                p.dimensions = dimensions;
                p.value = value;
            }
            None => g.parameters.push(Parameter::new(name, dimensions, value)),
        }
        Ok(())
    }

    /// Delete `group:name`, returning it if it existed.
    pub fn remove(&mut self, group: &str, name: &str) -> Option<Parameter> {
        self.group_mut(group)?.remove(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordKind {
    Group,
    Parameter,
    Opaque,
}

fn trim_trailing_zeros(bytes: &[u8]) -> &[u8] {
    let len = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &bytes[..len]
}

fn signed_name_len(name: &str, locked: bool) -> Result<i8> {
    let len = i8::try_from(name.len())
        .ok()
        .filter(|&len| len > 0)
        .ok_or_else(|| Error::Serialization(format!("name {name:?} must be 1..=127 bytes")))?;
    Ok(if locked { -len } else { len })
}

fn parameter_name_len(parameter: &Parameter) -> Result<i8> {
    signed_name_len(&parameter.name, parameter.locked)
}
