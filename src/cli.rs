use crate::config::{Config, load_config};
use crate::layout::{PassResult, compute_layout};
use crate::layout_dump::write_layout_dump;
use crate::notify::{ChangeNotifier, FilePoller};
use crate::parser::parse_words;
use crate::render::{render_svg, write_output_svg};
use crate::text_metrics::{ApproxMeasure, FontMeasure, TextMeasure};
use crate::weight::SizingStrategy;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const WATCH_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Parser, Debug)]
#[command(name = "wcloud", version, about = "Word cloud layout in Rust")]
pub struct Args {
    /// Input word list (JSON/JSON5 array or `text | weight | group` lines), '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for SVG and JSON.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON5 file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Sizing strategy
    #[arg(long = "strategy", value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Seed for reproducible clouds
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Measure text with an average glyph width instead of system fonts
    #[arg(long = "fastText")]
    pub fast_text: bool,

    /// Re-render whenever the input file changes
    #[arg(long = "watch")]
    pub watch: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum StrategyArg {
    Continuous,
    Categorical,
}

impl From<StrategyArg> for SizingStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Continuous => SizingStrategy::Continuous,
            StrategyArg::Categorical => SizingStrategy::Categorical,
        }
    }
}

pub fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = build_config(&args)?;
    let measure: Box<dyn TextMeasure> = if args.fast_text {
        Box::new(ApproxMeasure::default().with_padding(config.layout.padding_left))
    } else {
        Box::new(
            FontMeasure::new(config.theme.font_family.clone())
                .with_padding(config.layout.padding_left),
        )
    };

    render_once(&args, &config, measure.as_ref())?;
    if !args.watch {
        return Ok(());
    }

    let input = args
        .input
        .as_deref()
        .filter(|path| *path != Path::new("-"))
        .ok_or_else(|| anyhow::anyhow!("--watch needs an input file"))?;
    let notifier = ChangeNotifier::new();
    let mut changes = notifier.subscribe();
    let _poller = FilePoller::spawn(input, WATCH_INTERVAL, notifier)
        .context("starting file watcher")?;
    tracing::info!(input = %input.display(), "watching input, press Ctrl-C to stop");

    while changes.recv().is_some() {
        changes.drain();
        if let Err(err) = render_once(&args, &config, measure.as_ref()) {
            tracing::error!(error = %format!("{err:#}"), "re-render failed");
        }
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wordcloud_layout=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init();
}

fn build_config(args: &Args) -> Result<Config> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    if let Some(strategy) = args.strategy {
        config.layout.strategy = strategy.into();
    }
    if args.seed.is_some() {
        config.layout.seed = args.seed;
    }
    Ok(config)
}

fn render_once(args: &Args, config: &Config, measure: &dyn TextMeasure) -> Result<()> {
    let input = read_input(args.input.as_deref())?;
    let records = parse_words(&input).context("parsing word list")?;
    let result = compute_layout(&records, measure, config)?;
    tracing::info!(
        placed = result.placements.len(),
        total = records.len(),
        scale = result.scale,
        "layout ready"
    );
    write_result(&result, config, args.output_format, args.output.as_deref())
}

fn write_result(
    result: &PassResult,
    config: &Config,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    match format {
        OutputFormat::Svg => write_output_svg(&render_svg(result, config), output),
        OutputFormat::Json => write_layout_dump(output, result, config),
        OutputFormat::Png => {
            let output = ensure_output(output, "png")?;
            write_png(&render_svg(result, config), output, config)
        }
    }
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, config: &Config) -> Result<()> {
    crate::render::write_output_png(svg, output, config)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _config: &Config) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("reading input {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output<'a>(output: Option<&'a Path>, ext: &str) -> Result<&'a Path> {
    output.ok_or_else(|| anyhow::anyhow!("Output path required for {} output", ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = dir.path().join("cloud.json5");
        std::fs::write(&cfg, "{ width: 1000, layout: { seed: 1 } }").unwrap();
        let args = Args::parse_from([
            "wcloud",
            "-c",
            cfg.to_str().unwrap(),
            "-H",
            "400",
            "--strategy",
            "categorical",
            "--seed",
            "9",
        ]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.render.width, 1000.0);
        assert_eq!(config.render.height, 400.0);
        assert_eq!(config.layout.strategy, SizingStrategy::Categorical);
        assert_eq!(config.layout.seed, Some(9));
    }

    #[test]
    fn json_output_round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("words.txt");
        let output = dir.path().join("cloud.json");
        std::fs::write(&input, "rust | 5\ncloud | 2\n# comment\nwords").unwrap();
        let args = Args::parse_from([
            "wcloud",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "-e",
            "json",
            "--seed",
            "3",
            "--fastText",
        ]);
        let config = build_config(&args).unwrap();
        render_once(&args, &config, &ApproxMeasure::default()).unwrap();
        let dump: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(dump["placed"], 3);
        assert_eq!(dump["words"][0]["text"], "rust");
    }

    #[test]
    fn png_needs_an_output_path() {
        assert!(ensure_output(None, "png").is_err());
    }
}
