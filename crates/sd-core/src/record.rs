//! Record model: raw input rows, normalized records, and percentile ranks.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use sd_common::error::ScoreParseFailure;
use sd_common::{BatchIndex, EntityId};

/// One row as delivered by a batch source, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: Map<String, Value>,
}

impl RawRecord {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Convenience constructor for the three fields the pipeline reads.
    pub fn new(id: impl Into<Value>, score: impl Into<Value>, industry: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("id".to_string(), id.into());
        fields.insert("score".to_string(), score.into());
        fields.insert("industry".to_string(), Value::String(industry.to_string()));
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// A normalized record stamped with the batch it arrived in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub entity_id: EntityId,
    /// `None` when the source value was absent or not a finite number.
    pub score: Option<f64>,
    pub industry: String,
    pub batch_index: BatchIndex,
}

/// Rank of a record within its industry, or the "not computed" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Percentile {
    NotComputed,
    Rank(u8),
}

impl Percentile {
    /// Integer written for [`Percentile::NotComputed`].
    pub const SENTINEL: i16 = -1;

    /// Highest rank label.
    pub const MAX_RANK: u8 = 99;

    pub fn from_bin(bin: usize) -> Option<Self> {
        u8::try_from(bin)
            .ok()
            .filter(|rank| *rank <= Self::MAX_RANK)
            .map(Percentile::Rank)
    }

    /// Decode the table representation (`-1` or `0..=99`).
    pub fn from_i16(value: i16) -> Option<Self> {
        if value == Self::SENTINEL {
            return Some(Percentile::NotComputed);
        }
        usize::try_from(value).ok().and_then(Self::from_bin)
    }

    pub fn as_i16(self) -> i16 {
        match self {
            Percentile::NotComputed => Self::SENTINEL,
            Percentile::Rank(rank) => i16::from(rank),
        }
    }

    pub fn is_computed(self) -> bool {
        matches!(self, Percentile::Rank(_))
    }
}

impl fmt::Display for Percentile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i16())
    }
}

impl Serialize for Percentile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i16(self.as_i16())
    }
}

/// A record of the current batch together with its assigned percentile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub record: Record,
    pub percentile: Percentile,
}

/// Read a score field.
///
/// Absent, `null` and blank values are simply missing. Anything else that is
/// not a finite number is a [`ScoreParseFailure`], which callers absorb as a
/// missing score.
pub fn parse_score(value: Option<&Value>) -> Result<Option<f64>, ScoreParseFailure> {
    let failure = |raw: String| ScoreParseFailure { raw };
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(failure(n.to_string())),
        },
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(Some(v)),
                _ => Err(failure(s.clone())),
            }
        }
        Some(other) => Err(failure(other.to_string())),
    }
}

/// Render a score for the scores table.
///
/// Missing scores are empty. Integral values keep one decimal (`10.0`) so a
/// column of floats reads uniformly; everything else uses the shortest
/// representation that parses back to the same value.
pub fn format_score(score: Option<f64>) -> String {
    match score {
        None => String::new(),
        Some(v) if v.fract() == 0.0 && v.abs() < 1e16 => format!("{v:.1}"),
        Some(v) => v.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_and_string_scores_parse() {
        assert_eq!(parse_score(Some(&json!(10))), Ok(Some(10.0)));
        assert_eq!(parse_score(Some(&json!(2.5))), Ok(Some(2.5)));
        assert_eq!(parse_score(Some(&json!(" 10 "))), Ok(Some(10.0)));
        assert_eq!(parse_score(Some(&json!("-3e2"))), Ok(Some(-300.0)));
    }

    #[test]
    fn missing_scores_are_not_failures() {
        assert_eq!(parse_score(None), Ok(None));
        assert_eq!(parse_score(Some(&Value::Null)), Ok(None));
        assert_eq!(parse_score(Some(&json!("   "))), Ok(None));
    }

    #[test]
    fn garbage_scores_are_failures() {
        assert_eq!(
            parse_score(Some(&json!("abc"))),
            Err(ScoreParseFailure { raw: "abc".into() })
        );
        assert!(parse_score(Some(&json!("NaN"))).is_err());
        assert!(parse_score(Some(&json!("inf"))).is_err());
        assert!(parse_score(Some(&json!(true))).is_err());
        assert!(parse_score(Some(&json!([1]))).is_err());
    }

    #[test]
    fn percentile_table_encoding() {
        assert_eq!(Percentile::NotComputed.to_string(), "-1");
        assert_eq!(Percentile::Rank(42).as_i16(), 42);
        assert_eq!(Percentile::from_i16(-1), Some(Percentile::NotComputed));
        assert_eq!(Percentile::from_i16(99), Some(Percentile::Rank(99)));
        assert_eq!(Percentile::from_i16(100), None);
        assert_eq!(Percentile::from_i16(-2), None);
        assert_eq!(Percentile::from_bin(100), None);
    }

    #[test]
    fn scores_render_like_a_float_column() {
        assert_eq!(format_score(None), "");
        assert_eq!(format_score(Some(10.0)), "10.0");
        assert_eq!(format_score(Some(-0.5)), "-0.5");
        assert_eq!(format_score(Some(0.1)), "0.1");
    }

    #[test]
    fn scored_record_serializes_flat() {
        let scored = ScoredRecord {
            record: Record {
                entity_id: EntityId::from("A"),
                score: None,
                industry: "food".into(),
                batch_index: BatchIndex(3),
            },
            percentile: Percentile::NotComputed,
        };
        let value = serde_json::to_value(&scored).unwrap();
        assert_eq!(
            value,
            json!({
                "entity_id": "A",
                "score": null,
                "industry": "food",
                "batch_index": 3,
                "percentile": -1
            })
        );
    }
}
