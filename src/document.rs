use crate::{
    Error, Result,
    blocks::{AnalogLayout, Header, ParameterDirectory},
    streams::{AnalogStream, PointStream},
    summary::Summary,
    types::{Processor, StorageFormat},
};
use std::path::Path;

/// High level representation of a C3D file.
///
/// A document is decoded in one pass, owns all of its data and is encoded back
/// in one pass. Header, parameters and streams are kept consistent by the
/// operations in this crate; the mutable accessors hand that responsibility to
/// the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    header: Header,
    parameters: ParameterDirectory,
    points: PointStream,
    analogs: AnalogStream,
}

impl Document {
    pub(crate) fn from_parts(
        header: Header,
        parameters: ParameterDirectory,
        points: PointStream,
        analogs: AnalogStream,
    ) -> Self {
        Self {
            header,
            parameters,
            points,
            analogs,
        }
    }

    /// Parse a C3D file from disk.
    ///
    /// # Arguments
    /// * `path` - Path to the `.c3d` file.
    ///
    /// # Returns
    /// A new [`Document`] on success or [`crate::Error`] on failure.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        crate::decode(&bytes)
    }

    /// Parse a C3D file from memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        crate::decode(bytes)
    }

    /// Serialize to a complete C3D byte stream.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        crate::encode(self)
    }

    /// Encode and write to `path`, replacing any existing file.
    ///
    /// Encoding finishes before the file is opened, so a failure never leaves
    /// a partial file behind.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    pub fn parameters(&self) -> &ParameterDirectory {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut ParameterDirectory {
        &mut self.parameters
    }

    pub fn points(&self) -> &PointStream {
        &self.points
    }

    pub fn analogs(&self) -> &AnalogStream {
        &self.analogs
    }

    /// Replace both streams at once.
    ///
    /// The analog stream must keep the current samples-per-frame ratio and
    /// channel count.
    pub fn replace_streams(&mut self, points: PointStream, analogs: AnalogStream) -> Result<()> {
        let layout = self.analog_layout();
        if analogs.channel_count() != layout.channel_count
            || analogs.frame_count() != points.frame_count() * layout.samples_per_frame
        {
            return Err(Error::Serialization(format!(
                "analog stream {:?} does not fit {} point frames",
                analogs.shape(),
                points.frame_count()
            )));
        }
        self.points = points;
        self.analogs = analogs;
        Ok(())
    }

    pub fn processor(&self) -> Processor {
        self.parameters.processor
    }

    pub fn storage_format(&self) -> StorageFormat {
        self.header.storage_format()
    }

    /// `POINT:RATE`, falling back to the header frame rate.
    pub fn point_rate(&self) -> f64 {
        self.parameters
            .number("POINT", "RATE")
            .unwrap_or_else(|| self.header.point_rate())
    }

    /// `ANALOG:RATE`, falling back to the header's samples per frame.
    pub fn analog_rate(&self) -> f64 {
        self.parameters
            .number("ANALOG", "RATE")
            .unwrap_or_else(|| self.header.analog_rate())
    }

    pub fn analog_layout(&self) -> AnalogLayout {
        AnalogLayout {
            channel_count: self.analogs.channel_count(),
            samples_per_frame: self.header.analog_samples_per_frame as usize,
            unsigned: is_unsigned(&self.parameters),
        }
    }

    /// Marker labels from `POINT:LABELS` and its `LABELS2`, `LABELS3`, ...
    /// continuations, one per marker.
    pub fn point_labels(&self) -> Vec<String> {
        collect_labels(&self.parameters, "POINT", "LABELS", self.points.marker_count())
    }

    /// Channel labels from `ANALOG:LABELS` and its continuations.
    pub fn analog_labels(&self) -> Vec<String> {
        collect_labels(
            &self.parameters,
            "ANALOG",
            "LABELS",
            self.analogs.channel_count(),
        )
    }

    /// Samples of `channel` in physical units:
    /// `(raw - OFFSET[c]) * GEN_SCALE * SCALE[c]`.
    ///
    /// Missing scaling parameters count as identity.
    pub fn analog_values(&self, channel: usize) -> Option<Vec<f64>> {
        let raw = self.analogs.channel(channel)?;
        let param = |name: &str, default: f64| {
            self.parameters
                .get("ANALOG", name)
                .and_then(|p| p.value.get_f64(channel))
                .unwrap_or(default)
        };
        let offset = param("OFFSET", 0.0);
        let scale = param("SCALE", 1.0);
        let gen_scale = self
            .parameters
            .number("ANALOG", "GEN_SCALE")
            .unwrap_or(1.0);
        Some(
            raw.into_iter()
                .map(|v| (v as f64 - offset) * gen_scale * scale)
                .collect(),
        )
    }

    /// Describe the document for inspection.
    pub fn summary(&self) -> Summary {
        Summary::from_document(self)
    }
}

pub(crate) fn is_unsigned(parameters: &ParameterDirectory) -> bool {
    parameters
        .get("ANALOG", "FORMAT")
        .and_then(|p| p.strings().into_iter().next())
        .is_some_and(|s| s.eq_ignore_ascii_case("UNSIGNED"))
}

fn collect_labels(
    parameters: &ParameterDirectory,
    group: &str,
    base: &str,
    count: usize,
) -> Vec<String> {
    let mut labels = Vec::with_capacity(count);
    let mut suffix = 1;
    while labels.len() < count {
        let name = if suffix == 1 {
            base.to_string()
        } else {
            format!("{base}{suffix}")
        };
        match parameters.get(group, &name) {
            Some(p) => labels.extend(p.strings()),
            None => break,
        }
        suffix += 1;
    }
    labels.truncate(count);
    labels
}
