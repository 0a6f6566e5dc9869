//! JSON shapes exchanged with a scoring board.
//!
//! Every coordinate endpoint answers with `{"coords": [{"id", "x", "y"}, ..]}`.
//! Decoding is lenient per record: an entry with a missing or unparseable
//! field is dropped and the rest of the batch is kept.

use crate::prelude::{PointId, SyncError, SyncResult};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Impact as reported by the board, before a marker radius is attached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RemotePoint {
    pub id: PointId,
    #[serde(rename = "x")]
    pub x_mm: f64,
    #[serde(rename = "y")]
    pub y_mm: f64,
}

impl RemotePoint {
    pub fn new(id: PointId, x_mm: f64, y_mm: f64) -> Self {
        Self { id, x_mm, y_mm }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoordsPayload {
    pub coords: Vec<RemotePoint>,
}

/// Body of a successful clear request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearReceipt {
    pub status: String,
    #[serde(default)]
    pub cleared: usize,
}

/// Extracts the usable records of a coordinate response.
///
/// Fails only when the envelope itself is wrong (no `coords` array).
pub fn decode_coords(body: &Value) -> SyncResult<Vec<RemotePoint>> {
    let entries = body
        .get("coords")
        .and_then(Value::as_array)
        .ok_or_else(|| SyncError::Decode("missing \"coords\" array".into()))?;

    let mut points = Vec::with_capacity(entries.len());
    for entry in entries {
        match decode_record(entry) {
            Some(point) => points.push(point),
            None => warn!("skipping malformed coordinate record {entry}"),
        }
    }
    Ok(points)
}

/// Parses one `{id, x, y}` record; numbers may also arrive as strings.
pub fn decode_record(entry: &Value) -> Option<RemotePoint> {
    let id = as_id(entry.get("id")?)?;
    let x_mm = as_float(entry.get("x")?)?;
    let y_mm = as_float(entry.get("y")?)?;
    Some(RemotePoint { id, x_mm, y_mm })
}

fn as_float(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

fn as_id(value: &Value) -> Option<PointId> {
    let id = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    (id > 0).then_some(id)
}
