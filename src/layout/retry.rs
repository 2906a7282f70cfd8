// Runs packing passes at shrinking font scales until enough words fit.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::Rng;

use super::error::LayoutError;
use super::packing::{PackOptions, pack};
use super::types::{PassResult, Viewport};
use crate::text_metrics::TextMeasure;
use crate::weight::ResolvedWord;

/// Shared flag that stops a layout run between passes.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Scale factors and the acceptance threshold of a run.
#[derive(Debug, Clone, Copy)]
pub struct RetryPlan<'a> {
    pub scales: &'a [f32],
    pub accept_ratio: f32,
}

impl RetryPlan<'_> {
    fn scales(&self) -> &[f32] {
        if self.scales.is_empty() {
            &[1.0]
        } else {
            self.scales
        }
    }
}

/// Returns the first pass whose coverage reaches `plan.accept_ratio`, or the
/// pass at the last scale when none does.
pub fn run<M, R>(
    words: &[ResolvedWord],
    viewport: Viewport,
    measure: &M,
    plan: RetryPlan<'_>,
    options: &PackOptions,
    rng: &mut R,
) -> Result<PassResult, LayoutError>
where
    M: TextMeasure + ?Sized,
    R: Rng + ?Sized,
{
    let never = CancelFlag::new();
    let result = run_cancellable(words, viewport, measure, plan, options, rng, &never)?;
    // A run that is never cancelled always completes at least one pass.
    Ok(result.unwrap_or_else(|| PassResult::empty(1.0)))
}

/// Like [`run`], but checks `cancel` before every pass.
///
/// After cancellation the best finished pass is returned (highest coverage,
/// earliest scale on ties), or `None` if no pass finished.
pub fn run_cancellable<M, R>(
    words: &[ResolvedWord],
    viewport: Viewport,
    measure: &M,
    plan: RetryPlan<'_>,
    options: &PackOptions,
    rng: &mut R,
    cancel: &CancelFlag,
) -> Result<Option<PassResult>, LayoutError>
where
    M: TextMeasure + ?Sized,
    R: Rng + ?Sized,
{
    let mut best: Option<PassResult> = None;
    let mut last: Option<PassResult> = None;

    for &scale in plan.scales() {
        if cancel.is_cancelled() {
            tracing::info!(scale, "layout cancelled");
            return Ok(best);
        }

        let pass = pack(words, viewport, scale, measure, options, rng)?;
        if pass.coverage_ratio >= plan.accept_ratio {
            tracing::info!(
                scale,
                coverage = pass.coverage_ratio,
                placed = pass.placements.len(),
                "accepted layout pass"
            );
            return Ok(Some(pass));
        }
        tracing::debug!(
            scale,
            coverage = pass.coverage_ratio,
            threshold = plan.accept_ratio,
            "coverage below threshold, shrinking fonts"
        );

        let improves = best
            .as_ref()
            .is_none_or(|current| pass.coverage_ratio > current.coverage_ratio);
        if improves {
            best = Some(pass.clone());
        }
        last = Some(pass);
    }

    if let Some(pass) = &last {
        tracing::info!(
            scale = pass.scale,
            coverage = pass.coverage_ratio,
            "no scale reached the threshold, keeping the smallest"
        );
    }
    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::WordRecord;
    use crate::text_metrics::{MeasureError, TextSize};
    use crate::weight::{SizingStrategy, resolve};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::cell::RefCell;

    const SCALES: [f32; 3] = [1.0, 0.85, 0.7];

    fn plan(accept_ratio: f32) -> RetryPlan<'static> {
        RetryPlan {
            scales: &SCALES,
            accept_ratio,
        }
    }

    fn weighted(count: usize) -> Vec<ResolvedWord> {
        let records: Vec<WordRecord> = (0..count)
            .map(|i| WordRecord::new(format!("w{i}")).with_weight((count - i) as f64))
            .collect();
        resolve(&records, SizingStrategy::Continuous)
    }

    /// Width proportional to font size, so shrinking the scale shrinks words.
    fn proportional(text: &str, font_size: f32) -> Result<TextSize, MeasureError> {
        Ok(TextSize::new(
            text.chars().count() as f32 * font_size * 0.6 + 2.0,
            font_size,
        ))
    }

    #[test]
    fn roomy_viewport_is_accepted_at_full_scale() {
        let words = weighted(50);
        let mut rng = StdRng::seed_from_u64(11);
        let result = run(
            &words,
            Viewport::new(800.0, 600.0),
            &|_: &str, _: f32| Ok::<_, MeasureError>(TextSize::new(40.0, 12.0)),
            plan(0.8),
            &PackOptions::default(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(result.scale, 1.0);
        assert!(result.coverage_ratio >= 0.8);
    }

    #[test]
    fn tries_scales_in_order_and_keeps_the_last() {
        let scales_seen = RefCell::new(Vec::new());
        let measure = |text: &str, font_size: f32| {
            scales_seen.borrow_mut().push(font_size);
            proportional(text, font_size)
        };
        let words = weighted(200);
        let mut rng = StdRng::seed_from_u64(2);
        let result = run(
            &words,
            Viewport::new(200.0, 150.0),
            &measure,
            plan(1.0),
            &PackOptions::default(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(result.scale, 0.7);
        assert!(result.coverage_ratio < 1.0);
        // Every word is measured once per pass.
        assert_eq!(scales_seen.borrow().len(), 3 * 200);
    }

    #[test]
    fn empty_scale_list_runs_once_at_full_size() {
        let words = weighted(3);
        let mut rng = StdRng::seed_from_u64(4);
        let result = run(
            &words,
            Viewport::new(800.0, 600.0),
            &proportional,
            RetryPlan {
                scales: &[],
                accept_ratio: 0.8,
            },
            &PackOptions::default(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(result.scale, 1.0);
    }

    #[test]
    fn measurement_error_stops_the_run() {
        let calls = RefCell::new(0);
        let measure = |_: &str, _: f32| {
            *calls.borrow_mut() += 1;
            Err::<TextSize, _>(MeasureError::FontUnavailable("Missing".into()))
        };
        let words = weighted(5);
        let mut rng = StdRng::seed_from_u64(4);
        let err = run(
            &words,
            Viewport::new(800.0, 600.0),
            &measure,
            plan(0.8),
            &PackOptions::default(),
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(err, LayoutError::Measure { .. }));
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn cancelled_before_start_returns_nothing() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let mut rng = StdRng::seed_from_u64(6);
        let result = run_cancellable(
            &weighted(10),
            Viewport::new(800.0, 600.0),
            &proportional,
            plan(0.8),
            &PackOptions::default(),
            &mut rng,
            &cancel,
        )
        .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn cancelled_mid_run_returns_best_finished_pass() {
        let cancel = CancelFlag::new();
        let passes = RefCell::new(0usize);
        let words = weighted(120);
        let total = words.len();
        let measure = |text: &str, font_size: f32| {
            let mut seen = passes.borrow_mut();
            *seen += 1;
            // Cancel once the first pass measured every word.
            if *seen == total {
                cancel.cancel();
            }
            proportional(text, font_size)
        };
        let mut rng = StdRng::seed_from_u64(8);
        let result = run_cancellable(
            &words,
            Viewport::new(200.0, 150.0),
            &measure,
            plan(1.0),
            &PackOptions::default(),
            &mut rng,
            &cancel,
        )
        .unwrap()
        .expect("first pass finished");
        assert_eq!(result.scale, 1.0);
        assert_eq!(*passes.borrow(), total);
    }
}
