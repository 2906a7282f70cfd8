// Turns raw word priorities into a processing order and a size key.

use serde::{Deserialize, Serialize};

use crate::ir::WordRecord;

/// Group assigned to words without a usable group rank; sorts last.
pub const UNGROUPED_RANK: u32 = u32::MAX;

/// How word priority drives order, size and color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizingStrategy {
    /// Heavier words first, font size interpolated between a min and max.
    #[default]
    Continuous,
    /// Lower group ranks first, one font size per pass, palette color per group.
    Categorical,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedWord {
    pub source: WordRecord,
    /// Position in the input list.
    pub index: usize,
    /// Position in placement order, assigned once the words are sorted.
    pub rank: usize,
    pub order_key: f64,
    pub size_key: f64,
    pub group_rank: Option<u32>,
}

impl ResolvedWord {
    pub fn text(&self) -> &str {
        self.source.text.trim()
    }

    pub fn id(&self) -> String {
        self.source
            .id
            .clone()
            .unwrap_or_else(|| format!("{}-{}", self.text(), self.rank))
    }
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Weight used by the continuous strategy: the explicit weight, else the
/// group rank, else 1.
pub fn effective_weight(record: &WordRecord) -> f64 {
    positive(record.weight)
        .or_else(|| positive(record.group_rank))
        .unwrap_or(1.0)
}

/// Group used by the categorical strategy.
pub fn effective_group(record: &WordRecord) -> f64 {
    record
        .group_rank
        .filter(|v| v.is_finite())
        .unwrap_or(UNGROUPED_RANK as f64)
}

fn group_rank(record: &WordRecord) -> Option<u32> {
    record
        .group_rank
        .filter(|v| v.is_finite() && *v >= 0.0 && *v < UNGROUPED_RANK as f64)
        .map(|v| v.floor() as u32)
}

/// Orders `records` for placement. Records without visible text are dropped.
pub fn resolve(records: &[WordRecord], strategy: SizingStrategy) -> Vec<ResolvedWord> {
    let mut words: Vec<ResolvedWord> = records
        .iter()
        .enumerate()
        .filter(|(idx, record)| {
            let keep = record.has_text();
            if !keep {
                tracing::debug!(index = idx, "skipping word record without text");
            }
            keep
        })
        .map(|(index, record)| {
            let (order_key, size_key) = match strategy {
                SizingStrategy::Continuous => {
                    let weight = effective_weight(record);
                    (weight, weight)
                }
                SizingStrategy::Categorical => {
                    let group = effective_group(record);
                    (group, group)
                }
            };
            ResolvedWord {
                source: record.clone(),
                index,
                rank: 0,
                order_key,
                size_key,
                group_rank: group_rank(record),
            }
        })
        .collect();

    // Stable sorts keep input order among equal keys.
    match strategy {
        SizingStrategy::Continuous => {
            words.sort_by(|a, b| b.order_key.total_cmp(&a.order_key));
        }
        SizingStrategy::Categorical => {
            words.sort_by(|a, b| a.order_key.total_cmp(&b.order_key));
        }
    }
    for (rank, word) in words.iter_mut().enumerate() {
        word.rank = rank;
    }
    words
}

/// Font sizing parameters shared by every word of one pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSizing {
    pub font_offset: f32,
    pub fixed_font_size: f32,
}

/// Computes font sizes for one pass at one scale.
#[derive(Debug, Clone, Copy)]
pub struct FontSizer {
    strategy: SizingStrategy,
    min_font: f32,
    max_font: f32,
    min_weight: f64,
    factor: f64,
    offset: f32,
    fixed: f32,
}

impl FontSizer {
    pub fn new(
        strategy: SizingStrategy,
        words: &[ResolvedWord],
        viewport_width: f32,
        scale: f32,
        sizing: FontSizing,
    ) -> Self {
        let min_font = (viewport_width / 30.0).floor().max(10.0) * scale;
        let max_font = (viewport_width / 6.0).floor() * scale;
        let (min_weight, max_weight) = words.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), word| (lo.min(word.size_key), hi.max(word.size_key)),
        );
        let (min_weight, max_weight) = if words.is_empty() {
            (1.0, 1.0)
        } else {
            (min_weight, max_weight)
        };
        let spread = max_weight - min_weight;
        let spread = if spread > 0.0 { spread } else { 1.0 };
        Self {
            strategy,
            min_font,
            max_font,
            min_weight,
            factor: f64::from(max_font - min_font) / spread,
            offset: sizing.font_offset,
            fixed: sizing.fixed_font_size * scale,
        }
    }

    pub fn min_font(&self) -> f32 {
        self.min_font
    }

    pub fn max_font(&self) -> f32 {
        self.max_font
    }

    pub fn font_size(&self, word: &ResolvedWord) -> f32 {
        match self.strategy {
            SizingStrategy::Continuous => {
                let grown = (word.size_key - self.min_weight) * self.factor;
                (grown as f32 + self.min_font + self.offset).floor()
            }
            SizingStrategy::Categorical => self.fixed,
        }
    }
}
