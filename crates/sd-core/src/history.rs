//! Reading the output tables back: per-batch scores and entity drift.

use serde::Serialize;

use sd_common::{BatchIndex, EntityId, Error, Result};
use sd_config::EtlConfig;
use sd_tables::{drift_schema, read_table, scores_schema};

use crate::record::Percentile;
use crate::sink::table_format;

/// One row of the scores table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRow {
    pub id: EntityId,
    pub score: Option<f64>,
    pub industry: String,
    pub percentile: Percentile,
}

/// One row of the drift table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DriftPoint {
    pub batch_index: BatchIndex,
    pub percentile: Percentile,
}

/// Percentile history of a single entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityDrift {
    pub id: EntityId,
    pub points: Vec<DriftPoint>,
}

impl EntityDrift {
    /// Change in rank between consecutive computed percentiles, keyed by the
    /// later batch. Batches with the sentinel are skipped.
    pub fn changes(&self) -> Vec<(BatchIndex, i16)> {
        let mut out = Vec::new();
        let mut last: Option<i16> = None;
        for point in &self.points {
            if !point.percentile.is_computed() {
                continue;
            }
            let value = point.percentile.as_i16();
            if let Some(prev) = last {
                out.push((point.batch_index, value - prev));
            }
            last = Some(value);
        }
        out
    }

    /// Largest minus smallest computed percentile, if any were computed.
    pub fn range(&self) -> Option<i16> {
        let computed = self
            .points
            .iter()
            .filter(|p| p.percentile.is_computed())
            .map(|p| p.percentile.as_i16());
        let (min, max) = computed.fold((None, None), |(lo, hi): (Option<i16>, Option<i16>), v| {
            (
                Some(lo.map_or(v, |lo| lo.min(v))),
                Some(hi.map_or(v, |hi| hi.max(v))),
            )
        });
        Some(max? - min?)
    }
}

/// All rows of the scores table, in file order. Empty if the table does not
/// exist yet.
pub fn read_scores(config: &EtlConfig) -> Result<Vec<ScoreRow>> {
    let table = config.scores_table.display().to_string();
    let rows = read_table(&config.scores_table, &scores_schema(), table_format(config))?
        .unwrap_or_default();
    rows.into_iter()
        .map(|row| {
            let [id, score, industry, percentile]: [String; 4] =
                row.try_into().map_err(|_| bad_row(&table, "wrong width"))?;
            let score = if score.is_empty() {
                None
            } else {
                Some(
                    score
                        .parse::<f64>()
                        .map_err(|_| bad_row(&table, &format!("score {score:?}")))?,
                )
            };
            Ok(ScoreRow {
                id: EntityId(id),
                score,
                industry,
                percentile: parse_percentile(&table, &percentile)?,
            })
        })
        .collect()
}

/// All rows of the drift table as `(id, point)`, in file order.
pub fn read_drift(config: &EtlConfig) -> Result<Vec<(EntityId, DriftPoint)>> {
    let table = config.drift_table.display().to_string();
    let rows = read_table(&config.drift_table, &drift_schema(), table_format(config))?
        .unwrap_or_default();
    rows.into_iter()
        .map(|row| {
            let [run_id, id, percentile]: [String; 3] =
                row.try_into().map_err(|_| bad_row(&table, "wrong width"))?;
            let batch_index = run_id
                .parse::<u64>()
                .map(BatchIndex)
                .map_err(|_| bad_row(&table, &format!("run_id {run_id:?}")))?;
            Ok((
                EntityId(id),
                DriftPoint {
                    batch_index,
                    percentile: parse_percentile(&table, &percentile)?,
                },
            ))
        })
        .collect()
}

/// Percentile history of `id`, oldest batch first.
pub fn entity_history(config: &EtlConfig, id: &EntityId) -> Result<EntityDrift> {
    let points = read_drift(config)?
        .into_iter()
        .filter(|(row_id, _)| row_id == id)
        .map(|(_, point)| point)
        .collect();
    Ok(EntityDrift {
        id: id.clone(),
        points,
    })
}

fn parse_percentile(table: &str, text: &str) -> Result<Percentile> {
    text.parse::<i16>()
        .ok()
        .and_then(Percentile::from_i16)
        .ok_or_else(|| bad_row(table, &format!("percentile {text:?}")))
}

fn bad_row(table: &str, detail: &str) -> Error {
    Error::TableRead {
        table: table.to_string(),
        detail: format!("unreadable {detail}"),
    }
}
