#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod notify;
pub mod parser;
pub mod render;
pub mod store;
pub mod text_metrics;
pub mod theme;
pub mod weight;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, load_config};
pub use ir::WordRecord;
pub use layout::{
    CancelFlag, LayoutError, PassResult, Placement, compute_layout, compute_layout_with_rng,
};
pub use parser::parse_words;
pub use render::render_svg;
pub use text_metrics::{ApproxMeasure, FontMeasure, MeasureError, TextMeasure, TextSize};
pub use theme::Theme;
pub use weight::SizingStrategy;
