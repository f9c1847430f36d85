//! Human- and machine-readable description of a decoded document.
//!
//! [`Summary`] collects what a user inspecting a trial usually wants to know
//! (rates, frame span, labels, parameter groups) without exposing the samples.
//! With the `serde` feature it serializes to JSON for scripting.

use crate::{
    Document,
    blocks::Event,
    types::{Processor, StorageFormat},
};
use std::fmt;

/// One parameter group and the names of its parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupSummary {
    pub name: String,
    pub description: String,
    pub parameters: Vec<String>,
}

/// Overview of a [`Document`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Summary {
    pub processor: Processor,
    pub storage_format: StorageFormat,
    pub point_rate: f64,
    pub analog_rate: f64,
    pub first_frame: u16,
    pub last_frame: u16,
    pub frame_count: usize,
    pub duration_seconds: f64,
    pub marker_count: usize,
    pub analog_channel_count: usize,
    pub analog_samples_per_frame: usize,
    pub point_labels: Vec<String>,
    pub analog_labels: Vec<String>,
    pub events: Vec<Event>,
    pub groups: Vec<GroupSummary>,
    /// Parameter records kept verbatim because they could not be decoded.
    pub opaque_records: usize,
}

impl Summary {
    pub fn from_document(document: &Document) -> Self {
        let header = document.header();
        let parameters = document.parameters();
        let points = document.points();
        let point_rate = document.point_rate();
        let frame_count = points.frame_count();
        let duration_seconds = if point_rate > 0.0 {
            frame_count as f64 / point_rate
        } else {
            0.0
        };

        let groups = parameters
            .groups
            .iter()
            .map(|g| GroupSummary {
                name: g.name.clone(),
                description: g.description.clone(),
                parameters: g.parameters.iter().map(|p| p.name.clone()).collect(),
            })
            .collect();

        Self {
            processor: document.processor(),
            storage_format: document.storage_format(),
            point_rate,
            analog_rate: document.analog_rate(),
            first_frame: header.first_frame,
            last_frame: header.last_frame,
            frame_count,
            duration_seconds,
            marker_count: points.marker_count(),
            analog_channel_count: document.analogs().channel_count(),
            analog_samples_per_frame: header.analog_samples_per_frame as usize,
            point_labels: document.point_labels(),
            analog_labels: document.analog_labels(),
            events: header.events.clone(),
            groups,
            opaque_records: parameters.opaque.len(),
        }
    }

    /// Pretty-printed JSON.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| crate::Error::Serialization(format!("failed to serialize summary: {e}")))
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "processor:      {}", self.processor)?;
        writeln!(f, "storage:        {:?}", self.storage_format)?;
        writeln!(
            f,
            "frames:         {}..={} ({} frames, {:.3} s)",
            self.first_frame, self.last_frame, self.frame_count, self.duration_seconds
        )?;
        writeln!(f, "point rate:     {} Hz", self.point_rate)?;
        writeln!(f, "markers:        {}", self.marker_count)?;
        if self.analog_channel_count > 0 {
            writeln!(
                f,
                "analog:         {} channels at {} Hz ({} per frame)",
                self.analog_channel_count, self.analog_rate, self.analog_samples_per_frame
            )?;
        }
        if !self.point_labels.is_empty() {
            writeln!(f, "point labels:   {}", self.point_labels.join(", "))?;
        }
        if !self.analog_labels.is_empty() {
            writeln!(f, "analog labels:  {}", self.analog_labels.join(", "))?;
        }
        for event in &self.events {
            writeln!(f, "event:          {} at {:.3} s", event.label, event.time)?;
        }
        for group in &self.groups {
            writeln!(f, "[{}] {}", group.name, group.parameters.join(" "))?;
        }
        if self.opaque_records > 0 {
            writeln!(f, "opaque records: {}", self.opaque_records)?;
        }
        Ok(())
    }
}
