// Greedy center-out packing of one pass at one font scale.
//
// The first word is centered and the rest of the viewport is described by
// twelve free cells around it. Each later word takes the free cell nearest the
// center that can hold it, and the leftover part of that cell is split in two
// and handed back to the ledger. Words are never revisited within a pass.

use rand::Rng;

use super::error::LayoutError;
use super::ledger::{Fit, FreeSpaceCell, FreeSpaceLedger};
use super::types::{Corner, Orientation, PassResult, Placement, Rect, Viewport};
use crate::config::Config;
use crate::text_metrics::{TextMeasure, TextSize};
use crate::theme::Theme;
use crate::weight::{FontSizer, FontSizing, ResolvedWord, SizingStrategy, UNGROUPED_RANK};

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Everything a pass needs besides the words, the viewport and the scale.
#[derive(Debug, Clone)]
pub struct PackOptions {
    pub strategy: SizingStrategy,
    pub sizing: FontSizing,
    pub vertical_enabled: bool,
    pub vertical_probability: f64,
    pub theme: Theme,
}

impl PackOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            strategy: config.layout.strategy,
            sizing: FontSizing {
                font_offset: config.layout.font_offset,
                fixed_font_size: config.layout.fixed_font_size,
            },
            vertical_enabled: config.layout.vertical_enabled,
            vertical_probability: config.layout.vertical_probability,
            theme: config.theme.clone(),
        }
    }
}

impl Default for PackOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Places `words` in order at font scale `scale`.
///
/// Words that find no room are left out; the returned coverage ratio says how
/// many made it. Measurement failures abort the pass.
pub fn pack<M, R>(
    words: &[ResolvedWord],
    viewport: Viewport,
    scale: f32,
    measure: &M,
    options: &PackOptions,
    rng: &mut R,
) -> Result<PassResult, LayoutError>
where
    M: TextMeasure + ?Sized,
    R: Rng + ?Sized,
{
    if words.is_empty() {
        return Ok(PassResult::empty(scale));
    }
    if viewport.is_degenerate() {
        tracing::debug!(
            width = viewport.width,
            height = viewport.height,
            "degenerate viewport, nothing placed"
        );
        return Ok(PassResult::from_placements(Vec::new(), scale, words.len()));
    }

    let sizer = FontSizer::new(options.strategy, words, viewport.width, scale, options.sizing);
    let mut ledger = FreeSpaceLedger::new(viewport);
    let mut placements = Vec::with_capacity(words.len());

    for (idx, word) in words.iter().enumerate() {
        let font_size = sizer.font_size(word);
        let color = word_color(word, options, rng);
        let size = measure_word(measure, word.text(), font_size)?;

        let spot = if idx == 0 {
            place_first(size, viewport, &mut ledger)
        } else {
            place_next(size, viewport, &mut ledger, options, rng)
        };
        let Some((x, y, orientation)) = spot else {
            tracing::trace!(text = word.text(), font_size, "no room for word");
            continue;
        };

        placements.push(Placement {
            id: word.id(),
            text: word.text().to_string(),
            x,
            y,
            width: size.width,
            height: size.height,
            rotation: orientation.rotation_degrees(),
            font_size,
            color,
            group_rank: word.group_rank,
        });
    }

    let result = PassResult::from_placements(placements, scale, words.len());
    tracing::debug!(
        scale,
        placed = result.placements.len(),
        total = words.len(),
        free_cells = ledger.len(),
        "packing pass finished"
    );
    Ok(result)
}

fn measure_word<M>(measure: &M, text: &str, font_size: f32) -> Result<TextSize, LayoutError>
where
    M: TextMeasure + ?Sized,
{
    let size = measure
        .measure(text, font_size)
        .map_err(|source| LayoutError::Measure {
            text: text.to_string(),
            font_size,
            source,
        })?;
    if !size.is_valid() {
        return Err(LayoutError::InvalidMetrics {
            text: text.to_string(),
            font_size,
            width: size.width,
            height: size.height,
        });
    }
    Ok(size)
}

fn word_color<R: Rng + ?Sized>(word: &ResolvedWord, options: &PackOptions, rng: &mut R) -> String {
    match options.strategy {
        SizingStrategy::Continuous => {
            random_color(options.theme.random_color_min_digit, rng)
        }
        SizingStrategy::Categorical => options
            .theme
            .group_color(word.group_rank.unwrap_or(UNGROUPED_RANK))
            .to_string(),
    }
}

fn random_color<R: Rng + ?Sized>(min_digit: u8, rng: &mut R) -> String {
    let low = usize::from(min_digit.min(15));
    let mut color = String::with_capacity(7);
    color.push('#');
    for _ in 0..6 {
        color.push(HEX_DIGITS[rng.gen_range(low..16)] as char);
    }
    color
}

fn place_first(
    size: TextSize,
    viewport: Viewport,
    ledger: &mut FreeSpaceLedger,
) -> Option<(f32, f32, Orientation)> {
    let (cx, cy) = viewport.center();
    let rect = Rect::new(
        cx - size.width / 2.0,
        cy - size.height / 2.0,
        size.width,
        size.height,
    );
    if !viewport.contains(&rect) {
        return None;
    }
    seed_ledger(ledger, rect, viewport);
    Some((rect.x, rect.y, Orientation::Horizontal))
}

/// Describes the viewport around the centered first word with twelve cells:
/// one reaching each viewport edge, four half-size cells hugging the word's
/// corners and four more filling the outer quadrants.
fn seed_ledger(ledger: &mut FreeSpaceLedger, word: Rect, viewport: Viewport) {
    let Rect {
        x,
        y,
        width: w,
        height: h,
    } = word;
    let (vw, vh) = (viewport.width, viewport.height);

    ledger.insert(Corner::LeftBottom, x + w, y + h / 2.0, vw - x - w, h);
    ledger.insert(Corner::LeftTop, x + w / 2.0, y + h, w, vh - y - h);
    ledger.insert(Corner::RightTop, x, y + h / 2.0, x, h);
    ledger.insert(Corner::RightBottom, x + w / 2.0, y, w, y);

    ledger.insert(Corner::LeftTop, x + w, y + h / 2.0, w / 2.0, h / 2.0);
    ledger.insert(Corner::RightTop, x + w / 2.0, y + h, w / 2.0, h / 2.0);
    ledger.insert(Corner::RightBottom, x, y + h / 2.0, w / 2.0, h / 2.0);
    ledger.insert(Corner::LeftBottom, x + w / 2.0, y, w / 2.0, h / 2.0);

    ledger.insert(
        Corner::LeftTop,
        x + w + w / 2.0,
        y + h / 2.0,
        vw - x - w - w / 2.0,
        vh - y - h / 2.0,
    );
    ledger.insert(
        Corner::RightTop,
        x + w / 2.0,
        y + h + h / 2.0,
        x + w / 2.0,
        vh - y - h - h / 2.0,
    );
    ledger.insert(
        Corner::RightBottom,
        x - w / 2.0,
        y + h / 2.0,
        x - w / 2.0,
        y + h / 2.0,
    );
    ledger.insert(
        Corner::LeftBottom,
        x + w / 2.0,
        y - h / 2.0,
        x + w / 2.0,
        y - h / 2.0,
    );
}

fn place_next<R: Rng + ?Sized>(
    size: TextSize,
    viewport: Viewport,
    ledger: &mut FreeSpaceLedger,
    options: &PackOptions,
    rng: &mut R,
) -> Option<(f32, f32, Orientation)> {
    let (cell, fit) =
        ledger.take_nearest_fitting(size.width, size.height, options.vertical_enabled)?;
    let orientation = match fit {
        Fit::Horizontal => Orientation::Horizontal,
        Fit::Vertical => Orientation::Vertical,
        Fit::Both => {
            let chance = if options.vertical_probability.is_finite() {
                options.vertical_probability.clamp(0.0, 1.0)
            } else {
                0.0
            };
            if rng.gen_bool(chance) {
                Orientation::Vertical
            } else {
                Orientation::Horizontal
            }
        }
    };

    // Footprint on screen: a vertical word is `height` wide and `width` tall.
    let (foot_w, foot_h) = match orientation {
        Orientation::Horizontal => (size.width, size.height),
        Orientation::Vertical => (size.height, size.width),
    };
    let (x_mul, y_mul) = cell.corner.placement_signs();
    let left = cell.x + x_mul * foot_w;
    let top = cell.y + y_mul * foot_h;
    if !viewport.contains(&Rect::new(left, top, foot_w, foot_h)) {
        return None;
    }

    // Renderers rotate the unrotated text box about its center.
    let (x, y) = match orientation {
        Orientation::Horizontal => (left, top),
        Orientation::Vertical => {
            let shift = (size.width - size.height) / 2.0;
            (left - shift, top + shift)
        }
    };

    split_cell(ledger, &cell, foot_w, foot_h, rng.gen_bool(0.5));
    Some((x, y, orientation))
}

/// Hands the part of `cell` not covered by a `foot_w` x `foot_h` footprint
/// back to the ledger as two cells with the same corner tag.
fn split_cell(
    ledger: &mut FreeSpaceLedger,
    cell: &FreeSpaceCell,
    foot_w: f32,
    foot_h: f32,
    wide_first: bool,
) {
    let (sx, sy) = cell.corner.split_signs();
    let beside_x = cell.x + sx * foot_w;
    let beyond_y = cell.y + sy * foot_h;
    if wide_first {
        ledger.insert(cell.corner, beside_x, cell.y, cell.width - foot_w, foot_h);
        ledger.insert(cell.corner, cell.x, beyond_y, cell.width, cell.height - foot_h);
    } else {
        ledger.insert(cell.corner, beside_x, cell.y, cell.width - foot_w, cell.height);
        ledger.insert(cell.corner, cell.x, beyond_y, foot_w, cell.height - foot_h);
    }
}
