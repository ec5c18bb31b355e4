//! Payload decoding at the ingestion boundary.
//!
//! Press sensors report two raw magnitude sequences per stroke: toe-heel and
//! side. Stored payloads come in several shapes (a bare `[[..], [..]]` pair,
//! an enhanced `{"waveforms": [[..], [..]], ...}` object, or either of those
//! serialized into a JSON string). Everything is decoded once, here, into a
//! [`Waveform`]; shapes that cannot be decoded become [`Waveform::Malformed`]
//! instead of being rejected.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder channel used when a malformed waveform is shown on a display.
pub const ZERO_CHANNEL: [f64; 1] = [0.0];

/// The two sensor channels of a press waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    ToeHeel,
    Side,
}

impl Channel {
    pub const ALL: [Self; 2] = [Self::ToeHeel, Self::Side];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ToeHeel => "toe-heel",
            Self::Side => "side",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded two-channel waveform.
#[derive(Debug, Clone, PartialEq)]
pub enum Waveform {
    Pair { toe_heel: Vec<f64>, side: Vec<f64> },
    /// The payload did not contain two numeric sequences.
    Malformed,
}

impl Waveform {
    pub fn pair(toe_heel: Vec<f64>, side: Vec<f64>) -> Self {
        Self::Pair { toe_heel, side }
    }

    /// Decode a JSON value into a waveform. Never fails.
    pub fn decode(value: &Value) -> Self {
        match value {
            Value::Array(items) => Self::from_items(items),
            Value::Object(map) => map.get("waveforms").map_or(Self::Malformed, |inner| {
                inner.as_array().map_or(Self::Malformed, |items| Self::from_items(items))
            }),
            Value::String(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(inner @ (Value::Array(_) | Value::Object(_))) => Self::decode(&inner),
                _ => Self::Malformed,
            },
            _ => Self::Malformed,
        }
    }

    fn from_items(items: &[Value]) -> Self {
        match items {
            [Value::Array(toe_heel), Value::Array(side), ..] => Self::Pair {
                toe_heel: numeric_values(toe_heel),
                side: numeric_values(side),
            },
            _ => Self::Malformed,
        }
    }

    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Pair { .. })
    }

    /// Channel contents, or `None` for a malformed waveform.
    pub fn channel(&self, channel: Channel) -> Option<&[f64]> {
        match (self, channel) {
            (Self::Pair { toe_heel, .. }, Channel::ToeHeel) => Some(toe_heel),
            (Self::Pair { side, .. }, Channel::Side) => Some(side),
            (Self::Malformed, _) => None,
        }
    }

    /// Channel contents for display purposes: malformed waveforms read as a
    /// single zero sample on each channel.
    pub fn display_channel(&self, channel: Channel) -> &[f64] {
        self.channel(channel).unwrap_or(&ZERO_CHANNEL)
    }

    /// This waveform, or `[[0], [0]]` when it is malformed.
    pub fn or_zero_filled(&self) -> Self {
        match self {
            Self::Pair { .. } => self.clone(),
            Self::Malformed => Self::pair(ZERO_CHANNEL.to_vec(), ZERO_CHANNEL.to_vec()),
        }
    }

    /// Every reading on both channels, toe-heel first.
    pub fn readings(&self) -> impl Iterator<Item = f64> + '_ {
        Channel::ALL
            .into_iter()
            .flat_map(|channel| self.channel(channel).unwrap_or_default().iter().copied())
    }
}

/// Observation payload: either a single scalar or a decoded waveform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum Payload {
    Scalar(f64),
    Waveform(Waveform),
}

impl Payload {
    /// Decode any stored payload shape. Numbers (and numeric strings) become
    /// scalars; everything else goes through [`Waveform::decode`].
    pub fn decode(value: &Value) -> Self {
        numeric(value).map_or_else(|| Self::Waveform(Waveform::decode(value)), Self::Scalar)
    }

    pub const fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(value) => Some(*value),
            Self::Waveform(_) => None,
        }
    }

    /// The waveform view of this payload; scalars count as malformed waveforms.
    pub fn waveform(&self) -> &Waveform {
        match self {
            Self::Waveform(waveform) => waveform,
            Self::Scalar(_) => &Waveform::Malformed,
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::decode(&value)
    }
}

impl From<Payload> for Value {
    fn from(payload: Payload) -> Self {
        match payload {
            Payload::Scalar(value) => Value::from(value),
            Payload::Waveform(Waveform::Pair { toe_heel, side }) => {
                Value::Array(vec![Value::from(toe_heel), Value::from(side)])
            }
            Payload::Waveform(Waveform::Malformed) => Value::Null,
        }
    }
}

/// Loose numeric check: JSON numbers and numeric strings, finite only.
pub fn numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn numeric_values(items: &[Value]) -> Vec<f64> {
    items.iter().filter_map(numeric).collect()
}
