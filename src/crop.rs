use crate::{
    Document, Error, Result,
    blocks::{LABELS_OVERFLOW, Parameter, ParameterDirectory, ParameterValue},
    types::ParameterType,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Products of time and rate this close to an integer count as that integer.
///
/// `5.1 * 100.0` is `509.99999999999994` in binary floating point; without
/// snapping, a start time written on a frame boundary would drop that frame.
const FRAME_SNAP: f64 = 1e-6;

/// Offsets applied to the first/last kept frame when rewriting
/// `TRIAL:ACTUAL_START_FIELD` and `TRIAL:ACTUAL_END_FIELD`.
///
/// These reproduce what downstream readers were observed to expect; they are
/// not derived from the format description.
const TRIAL_START_OFFSET: i64 = 2;
const TRIAL_END_OFFSET: i64 = 1;

/// Point frame indices selected by a time window, `start..end` (exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameWindow {
    pub start: usize,
    pub end: usize,
}

impl FrameWindow {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

fn snapped_floor(x: f64) -> f64 {
    let nearest = x.round();
    if (x - nearest).abs() < FRAME_SNAP {
        nearest
    } else {
        x.floor()
    }
}

fn snapped_ceil(x: f64) -> f64 {
    let nearest = x.round();
    if (x - nearest).abs() < FRAME_SNAP {
        nearest
    } else {
        x.ceil()
    }
}

fn required_number(parameters: &ParameterDirectory, group: &str, name: &str) -> Result<f64> {
    parameters
        .require(group, name)?
        .number()
        .ok_or_else(|| Error::parameter_not_found(group, name))
}

/// Compute the point frames covered by `[start_time, end_time]`.
///
/// The lower bound rounds down and the upper bound rounds up, so any frame
/// partially inside the window is kept. Indices are relative to the header's
/// first frame.
///
/// # Errors
/// - [`Error::ParameterNotFound`] when `POINT:RATE` is missing
/// - [`Error::EmptyRange`] when the window selects no frame
/// - [`Error::RangeOutOfBounds`] when it reaches outside the point stream
pub fn frame_window(document: &Document, start_time: f64, end_time: f64) -> Result<FrameWindow> {
    let point_rate = required_number(document.parameters(), "POINT", "RATE")?;
    if !start_time.is_finite() || !end_time.is_finite() || point_rate <= 0.0 {
        return Err(Error::EmptyRange { start: 0, end: 0 });
    }

    // Index arithmetic stays in f64 until the bounds are checked: the products
    // can be arbitrarily large, and the integer casts below saturate.
    let first_frame = document.header().first_frame as f64;
    let start = snapped_floor(start_time * point_rate) - first_frame;
    let end = snapped_ceil(end_time * point_rate) - first_frame + 1.0;
    if end <= start {
        return Err(Error::EmptyRange {
            start: start as i64,
            end: end as i64,
        });
    }

    let frame_count = document.points().frame_count();
    if start < 0.0 || end > frame_count as f64 {
        return Err(Error::RangeOutOfBounds {
            start: start as i64,
            end: end as i64,
            frame_count,
        });
    }
    Ok(FrameWindow {
        start: start as usize,
        end: end as usize,
    })
}

/// Analog frames per point frame, checked against the stored layout.
fn analog_ratio(document: &Document, point_rate: f64) -> Result<usize> {
    let layout = document.analog_layout();
    if layout.channel_count == 0 {
        return Ok(layout.samples_per_frame);
    }
    let analog_rate = required_number(document.parameters(), "ANALOG", "RATE")?;
    let ratio = analog_rate / point_rate;
    let nearest = ratio.round();
    if nearest < 1.0
        || (ratio - nearest).abs() > FRAME_SNAP
        || nearest as usize != layout.samples_per_frame
    {
        return Err(Error::UnsupportedRateRatio {
            analog_rate,
            point_rate,
        });
    }
    Ok(nearest as usize)
}

/// Crop `document` to the frames covering `[start_time, end_time]` seconds.
///
/// Works on copies: `document` is untouched and nothing is returned unless
/// every step succeeds. The result is renumbered from frame 1 and carries
/// updated `POINT:FRAMES`, an emptied `ANALOG:UNITS`, rewritten
/// `TRIAL:ACTUAL_START_FIELD`/`ACTUAL_END_FIELD`, and drops `POINT:LABELS2`
/// unless `POINT:LABELS` is full.
///
/// # Example
/// ```no_run
/// use c3d_crop::{Document, Result, crop};
///
/// fn main() -> Result<()> {
///     let trial = Document::from_file("walk.c3d")?;
///     let stance = crop(&trial, 5.1, 6.2)?;
///     stance.save("walk_cropped.c3d")?;
///     Ok(())
/// }
/// ```
pub fn crop(document: &Document, start_time: f64, end_time: f64) -> Result<Document> {
    let point_rate = required_number(document.parameters(), "POINT", "RATE")?;
    let window = frame_window(document, start_time, end_time)?;
    let ratio = analog_ratio(document, point_rate)?;
    let first_frame = document.header().first_frame as i64;

    info!(
        start_time,
        end_time,
        start = window.start,
        end = window.end,
        "keeping frames"
    );

    let points = document.points().slice(window.start, window.end)?;
    let analog_range = window
        .start
        .checked_mul(ratio)
        .zip(window.end.checked_mul(ratio))
        .ok_or(Error::RangeOutOfBounds {
            start: window.start as i64,
            end: window.end as i64,
            frame_count: document.points().frame_count(),
        })?;
    let analogs = document.analogs().slice(analog_range.0, analog_range.1)?;
    let count = window.len();

    let mut parameters = document.parameters().clone();
    set_frame_count(&mut parameters, count)?;
    clear_analog_units(&mut parameters);
    set_trial_field(
        &mut parameters,
        "ACTUAL_START_FIELD",
        (window.start as i64).saturating_add(first_frame + TRIAL_START_OFFSET),
    )?;
    set_trial_field(
        &mut parameters,
        "ACTUAL_END_FIELD",
        (window.end as i64).saturating_add(first_frame + TRIAL_END_OFFSET),
    )?;
    drop_unused_labels2(&mut parameters);

    let mut header = document.header().clone();
    header.set_point_frame_bounds(1, count.min(u16::MAX as usize) as u16);
    let analog_count = analogs.frame_count().min(u32::MAX as usize) as u32;
    header.set_analog_frame_bounds(1, analog_count);

    Ok(Document::from_parts(header, parameters, points, analogs))
}

/// Crop the file at `input_path` and write the result to `output_path`.
///
/// The input file is only read; the output is written once encoding
/// succeeded.
pub fn crop_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    start_time: f64,
    end_time: f64,
) -> Result<()> {
    let input_path = input_path.as_ref();
    let output_path = output_path.as_ref();
    info!(path = %input_path.display(), "cropping");
    let document = Document::from_file(input_path)?;
    let cropped = crop(&document, start_time, end_time)?;
    cropped.save(output_path)?;
    info!(path = %output_path.display(), "cropped file saved");
    Ok(())
}

/// `dir/name.c3d` becomes `dir/name_cropped.c3d`.
pub fn cropped_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_cropped.{}", ext.to_string_lossy()),
        None => format!("{stem}_cropped"),
    };
    path.with_file_name(name)
}

fn set_frame_count(parameters: &mut ParameterDirectory, count: usize) -> Result<()> {
    let long = count > u16::MAX as usize;
    match parameters.get_mut("POINT", "FRAMES") {
        Some(frames) if long && frames.parameter_type() != ParameterType::Float => {
            frames.dimensions = Vec::new();
            frames.value = ParameterValue::Float(vec![count as f32]);
        }
        Some(frames) => frames.set_numbers(&[count as f64])?,
        None => {
            let value = if long {
                ParameterValue::Float(vec![count as f32])
            } else {
                ParameterValue::Integer(vec![count as u16 as i16])
            };
            parameters.set("POINT", "FRAMES", Vec::new(), value)?;
        }
    }

    match parameters.get_mut("POINT", "LONG_FRAMES") {
        Some(long_frames) => long_frames.set_numbers(&[count as f64])?,
        None if long => parameters.set(
            "POINT",
            "LONG_FRAMES",
            Vec::new(),
            ParameterValue::Float(vec![count as f32]),
        )?,
        None => {}
    }
    Ok(())
}

/// Empty `ANALOG:UNITS` rather than carrying the original units.
///
/// Some readers mis-handle the units array of a rewritten file; an empty
/// array is accepted by all of them. The parameter is kept (as an empty
/// array) so it is never reported missing.
fn clear_analog_units(parameters: &mut ParameterDirectory) {
    let Some(analog) = parameters.group_mut("ANALOG") else {
        return;
    };
    match analog.get_mut("UNITS") {
        Some(units) => units.clear_strings(),
        None => analog.insert(Parameter::new(
            "UNITS",
            vec![0, 0],
            ParameterValue::Char(Vec::new()),
        )),
    }
}

/// Write a frame number into a `TRIAL` field.
///
/// Two-element integer fields hold the number as (low word, high word).
fn set_trial_field(parameters: &mut ParameterDirectory, name: &str, frame: i64) -> Result<()> {
    let Some(field) = parameters.get_mut("TRIAL", name) else {
        warn!(parameter = name, "TRIAL parameter missing, not updated");
        return Ok(());
    };
    let mut values = field.numbers();
    let split = field.parameter_type() == ParameterType::Integer && values.len() >= 2;
    if split {
        values[0] = (frame & 0xffff) as f64;
        values[1] = (frame >> 16) as f64;
    } else if values.is_empty() {
        values.push(frame as f64);
    } else {
        values[0] = frame as f64;
    }
    field.set_numbers(&values)?;
    debug!(parameter = name, frame, "TRIAL field updated");
    Ok(())
}

fn drop_unused_labels2(parameters: &mut ParameterDirectory) {
    let label_count = parameters
        .get("POINT", "LABELS")
        .map_or(0, |p| p.string_count());
    if label_count < LABELS_OVERFLOW && parameters.remove("POINT", "LABELS2").is_some() {
        debug!(label_count, "removed POINT:LABELS2");
    }
}
