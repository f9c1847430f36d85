//! Hand-assembled C3D files for the integration tests.
//!
//! The bytes are laid out here field by field, without going through the
//! crate's encoder, so decoding is checked against an independent writer.

#![allow(dead_code)]

pub const INTEL: u8 = 84;
pub const DEC: u8 = 85;
pub const MIPS: u8 = 86;

const BLOCK: usize = 512;

/// Raw stored value of one point coordinate (`axis` 0..3).
pub fn point_raw(marker: usize, frame: usize, axis: usize) -> i16 {
    ((frame * 7 + marker * 13 + axis * 5) % 2000) as i16 - 1000
}

/// Raw stored value of one analog sample.
pub fn analog_raw(channel: usize, analog_frame: usize) -> i16 {
    ((analog_frame * 3 + channel * 11) % 4000) as i16 - 2000
}

/// Description of a synthetic trial.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub processor: u8,
    pub marker_count: usize,
    pub channel_count: usize,
    pub samples_per_frame: usize,
    pub frame_count: usize,
    pub first_frame: u16,
    pub point_rate: f32,
    pub analog_rate: f32,
    /// Negative for float storage.
    pub scale: f32,
    /// Write the ANALOG group even without channels.
    pub analog_group: bool,
    pub analog_units: bool,
    pub trial_fields: bool,
    /// Add a `POINT:LABELS2` even when `LABELS` is not full.
    pub stray_labels2: bool,
    /// Add a record with an unknown type code.
    pub unknown_record: bool,
    pub events: Vec<(&'static str, f32)>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            processor: INTEL,
            marker_count: 3,
            channel_count: 2,
            samples_per_frame: 10,
            frame_count: 1000,
            first_frame: 1,
            point_rate: 100.0,
            analog_rate: 1000.0,
            scale: 0.1,
            analog_group: true,
            analog_units: true,
            trial_fields: true,
            stray_labels2: false,
            unknown_record: false,
            events: vec![("HS", 1.5)],
        }
    }
}

impl Fixture {
    pub fn float(mut self) -> Self {
        self.scale = -0.1;
        self
    }

    pub fn processor(mut self, processor: u8) -> Self {
        self.processor = processor;
        self
    }

    pub fn point_labels(&self) -> Vec<String> {
        (0..self.marker_count).map(|m| format!("M{m:03}")).collect()
    }

    pub fn analog_labels(&self) -> Vec<String> {
        (0..self.channel_count).map(|c| format!("CH{c}")).collect()
    }

    /// Decoded value of a point coordinate as the reader should report it.
    pub fn point_value(&self, marker: usize, frame: usize, axis: usize) -> f32 {
        let raw = point_raw(marker, frame, axis) as f32;
        if self.scale < 0.0 { raw } else { raw * self.scale }
    }

    pub fn build(&self) -> Vec<u8> {
        // DATA_START does not change the section size
        let parameter_blocks = self.parameter_section(0).len() / BLOCK;
        let data_start = 2 + parameter_blocks;
        let section = self.parameter_section(data_start as i16);

        let mut file = self.header(data_start as u16);
        file.extend_from_slice(&section);
        file.extend_from_slice(&self.data());
        let pad = (BLOCK - file.len() % BLOCK) % BLOCK;
        file.resize(file.len() + pad, 0);
        file
    }

    fn header(&self, data_start: u16) -> Vec<u8> {
        let mut w = Writer::new(self.processor);
        w.u8(2);
        w.u8(0x50);
        w.u16(self.marker_count as u16);
        w.u16((self.channel_count * self.samples_per_frame) as u16);
        w.u16(self.first_frame);
        w.u16(self.first_frame + self.frame_count as u16 - 1);
        w.u16(10);
        w.f32(self.scale);
        w.u16(data_start);
        w.u16(self.samples_per_frame as u16);
        w.f32(self.point_rate);
        w.buf.resize(298, 0);
        if !self.events.is_empty() {
            w.u16(12345);
            w.u16(self.events.len() as u16);
            w.buf.resize(304, 0);
            for (_, time) in &self.events {
                w.f32(*time);
            }
            w.buf.resize(376, 0);
            for _ in &self.events {
                w.u8(0);
            }
            w.buf.resize(396, 0);
            for (label, _) in &self.events {
                w.bytes(&padded(label, 4));
            }
        }
        w.buf.resize(BLOCK, 0);
        w.buf
    }

    fn parameter_section(&self, data_start: i16) -> Vec<u8> {
        let p = self.processor;
        let mut records = Vec::new();

        records.push(group(1, "POINT", "3-D point parameters"));
        records.push(param(1, "USED", 2, &[], &int(p, &[self.marker_count as i16])));
        records.push(param(1, "SCALE", 4, &[], &float(p, &[self.scale])));
        records.push(param(1, "RATE", 4, &[], &float(p, &[self.point_rate])));
        records.push(param(1, "FRAMES", 2, &[], &int(p, &[self.frame_count as i16])));
        records.push(param(1, "DATA_START", 2, &[], &int(p, &[data_start])));
        let labels = self.point_labels();
        let (first, rest) = labels.split_at(labels.len().min(255));
        records.push(strings(1, "LABELS", first));
        if !rest.is_empty() {
            records.push(strings(1, "LABELS2", rest));
        } else if self.stray_labels2 {
            records.push(strings(1, "LABELS2", &["EXTRA".to_string()]));
        }

        if self.unknown_record {
            records.push(record(1, "CUSTOM", &[3, 0, 0xAB, 0xCD, 0x01]));
        }

        if self.analog_group || self.channel_count > 0 {
            let n = self.channel_count;
            records.push(group(2, "ANALOG", "Analog data parameters"));
            records.push(param(2, "USED", 2, &[], &int(p, &[n as i16])));
            records.push(param(2, "RATE", 4, &[], &float(p, &[self.analog_rate])));
            records.push(param(2, "GEN_SCALE", 4, &[], &float(p, &[1.0])));
            records.push(strings(2, "LABELS", &self.analog_labels()));
            records.push(param(2, "SCALE", 4, &[n as u8], &float(p, &vec![0.5; n])));
            records.push(param(2, "OFFSET", 2, &[n as u8], &int(p, &vec![10; n])));
            if self.analog_units {
                records.push(strings(2, "UNITS", &vec!["V".to_string(); n]));
            }
        }

        if self.trial_fields {
            let last = self.first_frame + self.frame_count as u16 - 1;
            records.push(group(3, "TRIAL", "Trial parameters"));
            records.push(param(3, "ACTUAL_START_FIELD", 2, &[2], &int(p, &[self.first_frame as i16, 0])));
            records.push(param(3, "ACTUAL_END_FIELD", 2, &[2], &int(p, &[last as i16, 0])));
        }

        let mut section = Writer::new(p);
        section.u8(1);
        section.u8(0x50);
        section.u8(0); // patched
        section.u8(p);
        let count = records.len();
        for (i, (name_len, id, name, body)) in records.into_iter().enumerate() {
            section.u8(name_len as u8);
            section.u8(id as u8);
            section.bytes(name.as_bytes());
            section.u16(if i + 1 == count { 0 } else { body.len() as u16 + 2 });
            section.bytes(&body);
        }
        let blocks = section.buf.len().div_ceil(BLOCK);
        section.buf[2] = blocks as u8;
        section.buf.resize(blocks * BLOCK, 0);
        section.buf
    }

    fn data(&self) -> Vec<u8> {
        let mut w = Writer::new(self.processor);
        let float = self.scale < 0.0;
        for frame in 0..self.frame_count {
            for marker in 0..self.marker_count {
                for axis in 0..3 {
                    let raw = point_raw(marker, frame, axis);
                    if float {
                        w.f32(raw as f32);
                    } else {
                        w.i16(raw);
                    }
                }
                if float {
                    w.f32(0.0);
                } else {
                    w.i16(0);
                }
            }
            for sub in 0..self.samples_per_frame {
                let analog_frame = frame * self.samples_per_frame + sub;
                for channel in 0..self.channel_count {
                    let raw = analog_raw(channel, analog_frame);
                    if float {
                        w.f32(raw as f32);
                    } else {
                        w.i16(raw);
                    }
                }
            }
        }
        w.buf
    }
}

type Record = (i8, i8, String, Vec<u8>);

fn record(group_id: i8, name: &str, body: &[u8]) -> Record {
    (name.len() as i8, group_id, name.to_string(), body.to_vec())
}

fn group(id: i8, name: &str, description: &str) -> Record {
    let mut body = vec![description.len() as u8];
    body.extend_from_slice(description.as_bytes());
    (name.len() as i8, -id, name.to_string(), body)
}

fn param(group_id: i8, name: &str, code: i8, dims: &[u8], data: &[u8]) -> Record {
    let mut body = vec![code as u8, dims.len() as u8];
    body.extend_from_slice(dims);
    body.extend_from_slice(data);
    body.push(0); // no description
    record(group_id, name, &body)
}

fn strings(group_id: i8, name: &str, values: &[String]) -> Record {
    let width = values.iter().map(|s| s.len()).max().unwrap_or(0).max(1);
    let data: Vec<u8> = values.iter().flat_map(|s| padded(s, width)).collect();
    param(
        group_id,
        name,
        -1,
        &[width as u8, values.len() as u8],
        &data,
    )
}

fn padded(text: &str, width: usize) -> Vec<u8> {
    let mut bytes = text.as_bytes().to_vec();
    bytes.resize(width, b' ');
    bytes
}

fn int(processor: u8, values: &[i16]) -> Vec<u8> {
    let mut w = Writer::new(processor);
    values.iter().for_each(|v| w.i16(*v));
    w.buf
}

fn float(processor: u8, values: &[f32]) -> Vec<u8> {
    let mut w = Writer::new(processor);
    values.iter().for_each(|v| w.f32(*v));
    w.buf
}

struct Writer {
    processor: u8,
    buf: Vec<u8>,
}

impl Writer {
    fn new(processor: u8) -> Self {
        Self {
            processor,
            buf: Vec::new(),
        }
    }

    fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn bytes(&mut self, v: &[u8]) {
        self.buf.extend_from_slice(v);
    }

    fn u16(&mut self, v: u16) {
        if self.processor == MIPS {
            self.bytes(&v.to_be_bytes());
        } else {
            self.bytes(&v.to_le_bytes());
        }
    }

    fn i16(&mut self, v: i16) {
        self.u16(v as u16);
    }

    fn f32(&mut self, v: f32) {
        match self.processor {
            MIPS => self.bytes(&v.to_be_bytes()),
            // VAX F-float: word-swapped, exponent bias off by two
            DEC => self.bytes(&(v * 4.0).to_bits().rotate_left(16).to_le_bytes()),
            _ => self.bytes(&v.to_le_bytes()),
        }
    }
}
