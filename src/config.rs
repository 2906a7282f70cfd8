use crate::theme::Theme;
use crate::weight::SizingStrategy;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_SCALES: [f32; 3] = [1.0, 0.85, 0.7];
pub const DEFAULT_ACCEPT_RATIO: f32 = 0.8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    pub strategy: SizingStrategy,
    /// Font scale factors tried in order until coverage is acceptable.
    pub scales: Vec<f32>,
    /// Fraction of words that must be placed for a pass to be accepted.
    pub accept_ratio: f32,
    /// Added to every continuous font size.
    pub font_offset: f32,
    /// Font size of every word in the categorical strategy, before scaling.
    pub fixed_font_size: f32,
    pub vertical_enabled: bool,
    /// Chance of turning a word vertical when both orientations fit.
    pub vertical_probability: f64,
    /// Extra width measured in front of each word.
    pub padding_left: f32,
    /// Seed for orientation, split and color choices; random when absent.
    pub seed: Option<u64>,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            strategy: SizingStrategy::Continuous,
            scales: DEFAULT_SCALES.to_vec(),
            accept_ratio: DEFAULT_ACCEPT_RATIO,
            font_offset: 10.0,
            fixed_font_size: 28.0,
            vertical_enabled: true,
            vertical_probability: 0.4,
            padding_left: 2.0,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            background: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: CloudConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::classic();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: CloudConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    background: Option<String>,
    palette: Option<Vec<String>>,
    random_color_min_digit: Option<u8>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    strategy: Option<SizingStrategy>,
    scales: Option<Vec<f32>>,
    accept_ratio: Option<f32>,
    font_offset: Option<f32>,
    fixed_font_size: Option<f32>,
    vertical_enabled: Option<bool>,
    vertical_probability: Option<f64>,
    padding_left: Option<f32>,
    seed: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    width: Option<f32>,
    height: Option<f32>,
}

/// Loads a JSON5 config file over the defaults. Every key is optional.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("parsing config {}", path.display()))
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = json5::from_str(contents)?;
    let mut config = Config::default();

    if let Some(theme_name) = parsed.theme.as_deref() {
        match theme_name {
            "modern" => config.theme = Theme::modern(),
            "classic" | "default" => config.theme = Theme::classic(),
            other => tracing::warn!(theme = other, "unknown theme, keeping the default"),
        }
        config.render.background = config.theme.background.clone();
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.background {
            config.render.background = v.clone();
            config.theme.background = v;
        }
        if let Some(v) = vars.palette {
            config.theme.palette = v;
        }
        if let Some(v) = vars.random_color_min_digit {
            config.theme.random_color_min_digit = v.min(15);
        }
    }

    if let Some(layout) = parsed.layout {
        let target = &mut config.layout;
        if let Some(v) = layout.strategy {
            target.strategy = v;
        }
        if let Some(v) = layout.scales {
            let scales: Vec<f32> = v.into_iter().filter(|s| s.is_finite() && *s > 0.0).collect();
            if scales.is_empty() {
                anyhow::bail!("layout.scales must contain at least one positive scale");
            }
            target.scales = scales;
        }
        if let Some(v) = layout.accept_ratio {
            target.accept_ratio = v.clamp(0.0, 1.0);
        }
        if let Some(v) = layout.font_offset {
            target.font_offset = v;
        }
        if let Some(v) = layout.fixed_font_size {
            target.fixed_font_size = v;
        }
        if let Some(v) = layout.vertical_enabled {
            target.vertical_enabled = v;
        }
        if let Some(v) = layout.vertical_probability {
            target.vertical_probability = v.clamp(0.0, 1.0);
        }
        if let Some(v) = layout.padding_left {
            target.padding_left = v;
        }
        if layout.seed.is_some() {
            target.seed = layout.seed;
        }
    }

    if let Some(v) = parsed.width {
        config.render.width = v;
    }
    if let Some(v) = parsed.height {
        config.render.height = v;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_gives_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.layout.scales, DEFAULT_SCALES.to_vec());
        assert_eq!(config.layout.accept_ratio, DEFAULT_ACCEPT_RATIO);
        assert_eq!(config.layout.strategy, SizingStrategy::Continuous);
        assert_eq!(config.render.width, 800.0);
    }

    #[test]
    fn file_values_override_defaults() {
        let config = parse_config(
            r#"{
                // json5 comments are fine
                theme: 'modern',
                themeVariables: { fontFamily: 'Noto Sans', palette: ['#111111', '#222222'] },
                layout: { strategy: 'categorical', scales: [1.0, 0.5], acceptRatio: 0.9, seed: 7 },
                width: 1024,
            }"#,
        )
        .unwrap();
        assert_eq!(config.theme.font_family, "Noto Sans");
        assert_eq!(config.theme.palette.len(), 2);
        assert_eq!(config.layout.strategy, SizingStrategy::Categorical);
        assert_eq!(config.layout.scales, vec![1.0, 0.5]);
        assert_eq!(config.layout.accept_ratio, 0.9);
        assert_eq!(config.layout.seed, Some(7));
        assert_eq!(config.render.width, 1024.0);
        assert_eq!(config.render.height, 600.0);
        assert_eq!(config.render.background, Theme::modern().background);
    }

    #[test]
    fn rejects_scales_without_a_positive_entry() {
        assert!(parse_config("{ layout: { scales: [0, -1] } }").is_err());
    }

    #[test]
    fn load_config_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud.json5");
        std::fs::write(&path, "{ height: 480 }").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.render.height, 480.0);
    }
}
