use thiserror::Error;

use crate::text_metrics::MeasureError;

/// Failures that abort a layout run.
///
/// Words that simply do not fit are not errors; they only lower the pass's
/// coverage ratio.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("failed to measure '{text}' at {font_size}px")]
    Measure {
        text: String,
        font_size: f32,
        #[source]
        source: MeasureError,
    },
    #[error("measuring '{text}' at {font_size}px returned an unusable size {width}x{height}")]
    InvalidMetrics {
        text: String,
        font_size: f32,
        width: f32,
        height: f32,
    },
}
