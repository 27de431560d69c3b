//! Feedback accumulation and strategy recommendation.
//!
//! [`FeedbackLog`] is an append-only record of per-task outcome scores.
//! The strategy note is recomputed from the full log on every call;
//! there is no incremental state that can drift.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::debug;

use studyloop_shared::{FeedbackRecord, KindStats, LearningTask, StrategyNote, TaskKind, Trend};

/// Score delta between log halves below which the trend reads as steady.
const TREND_BAND: f64 = 0.25;

/// Append-only log of task feedback, single writer per session.
#[derive(Debug, Clone, Default)]
pub struct FeedbackLog {
    records: Vec<FeedbackRecord>,
}

impl FeedbackLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a feedback record for `task`.
    ///
    /// No deduplication: recording twice for the same task yields two
    /// entries, both retained. The task itself is never mutated.
    pub fn record(&mut self, task: &LearningTask, score: f64, comment: impl Into<String>) {
        self.records.push(FeedbackRecord {
            task_id: task.id.clone(),
            kind: task.kind,
            score,
            comment: comment.into(),
            recorded_at: Utc::now(),
        });
        debug!(task = %task.id, score, total = self.records.len(), "feedback recorded");
    }

    pub fn records(&self) -> &[FeedbackRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Recompute the strategy note from the full log.
    ///
    /// The weakest task kind by mean score becomes the remediation
    /// focus; ties break to the first kind in canonical order. Returns
    /// `None` on an empty log.
    pub fn strategy_note(&self) -> Option<StrategyNote> {
        if self.records.is_empty() {
            return None;
        }

        let mut sums: BTreeMap<TaskKind, (usize, f64)> = BTreeMap::new();
        for record in &self.records {
            let entry = sums.entry(record.kind).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += record.score;
        }

        let per_kind: BTreeMap<TaskKind, KindStats> = sums
            .into_iter()
            .map(|(kind, (count, sum))| {
                (
                    kind,
                    KindStats {
                        count,
                        mean: sum / count as f64,
                    },
                )
            })
            .collect();

        // BTreeMap iteration is in canonical kind order, so strict
        // less-than keeps the earliest kind on ties.
        let (focus, focus_stats) = per_kind
            .iter()
            .fold(None::<(TaskKind, KindStats)>, |best, (kind, stats)| {
                match best {
                    Some((_, best_stats)) if stats.mean >= best_stats.mean => best,
                    _ => Some((*kind, *stats)),
                }
            })?;

        let trend = self.trend();
        let summary = format!(
            "focus on {focus} tasks (mean score {:.2}); overall trend {trend}",
            focus_stats.mean
        );

        Some(StrategyNote {
            focus,
            focus_mean: focus_stats.mean,
            per_kind,
            trend,
            summary,
        })
    }

    /// Compare the second half of the chronological log against the
    /// first; deltas within [`TREND_BAND`] read as steady.
    fn trend(&self) -> Trend {
        if self.records.len() < 2 {
            return Trend::Steady;
        }

        let mid = self.records.len() / 2;
        let mean = |records: &[FeedbackRecord]| {
            records.iter().map(|r| r.score).sum::<f64>() / records.len() as f64
        };
        let delta = mean(&self.records[mid..]) - mean(&self.records[..mid]);

        if delta > TREND_BAND {
            Trend::Improving
        } else if delta < -TREND_BAND {
            Trend::Declining
        } else {
            Trend::Steady
        }
    }
}
