mod error;
mod ledger;
mod packing;
mod retry;
pub(crate) mod types;

pub use error::LayoutError;
pub use ledger::{Fit, FreeSpaceCell, FreeSpaceLedger};
pub use packing::{PackOptions, pack};
pub use retry::{CancelFlag, RetryPlan, run, run_cancellable};
pub use types::*;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Config;
use crate::ir::WordRecord;
use crate::text_metrics::TextMeasure;
use crate::weight::resolve;

/// Lays out `records` in the viewport described by `config.render`.
///
/// Uses `config.layout.seed` when set, so identical inputs give identical
/// clouds; otherwise the random source is seeded from the OS.
pub fn compute_layout<M>(
    records: &[WordRecord],
    measure: &M,
    config: &Config,
) -> Result<PassResult, LayoutError>
where
    M: TextMeasure + ?Sized,
{
    let mut rng = match config.layout.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    compute_layout_with_rng(records, measure, config, &mut rng)
}

pub fn compute_layout_with_rng<M, R>(
    records: &[WordRecord],
    measure: &M,
    config: &Config,
    rng: &mut R,
) -> Result<PassResult, LayoutError>
where
    M: TextMeasure + ?Sized,
    R: Rng + ?Sized,
{
    compute_layout_cancellable(records, measure, config, rng, &CancelFlag::new())
        .map(|result| result.unwrap_or_else(|| PassResult::empty(1.0)))
}

/// Like [`compute_layout_with_rng`], stopping between passes once `cancel` is set.
pub fn compute_layout_cancellable<M, R>(
    records: &[WordRecord],
    measure: &M,
    config: &Config,
    rng: &mut R,
    cancel: &CancelFlag,
) -> Result<Option<PassResult>, LayoutError>
where
    M: TextMeasure + ?Sized,
    R: Rng + ?Sized,
{
    let words = resolve(records, config.layout.strategy);
    let viewport = Viewport::new(config.render.width, config.render.height);
    let options = PackOptions::from_config(config);
    let plan = RetryPlan {
        scales: &config.layout.scales,
        accept_ratio: config.layout.accept_ratio,
    };
    tracing::debug!(
        words = words.len(),
        skipped = records.len() - words.len(),
        width = viewport.width,
        height = viewport.height,
        strategy = ?config.layout.strategy,
        "computing word cloud layout"
    );
    run_cancellable(&words, viewport, measure, plan, &options, rng, cancel)
}
