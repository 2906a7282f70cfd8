use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use wasm_bindgen::prelude::*;
use wordcloud_layout::text_metrics::ApproxMeasure;
use wordcloud_layout::{
    Config, SizingStrategy, Theme, WordRecord, compute_layout_with_rng, parse_words,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CloudOptions {
    width: Option<f32>,
    height: Option<f32>,
    strategy: Option<SizingStrategy>,
    theme: Option<String>,
    font_family: Option<String>,
    palette: Option<Vec<String>>,
    scales: Option<Vec<f32>>,
    accept_ratio: Option<f32>,
    vertical_enabled: Option<bool>,
    seed: Option<u64>,
    /// Average glyph width as a fraction of the font size.
    char_width_ratio: Option<f32>,
}

fn build_config(options: &CloudOptions) -> Config {
    let mut config = Config::default();
    if options.theme.as_deref() == Some("modern") {
        config.theme = Theme::modern();
        config.render.background = config.theme.background.clone();
    }
    if let Some(width) = options.width {
        config.render.width = width;
    }
    if let Some(height) = options.height {
        config.render.height = height;
    }
    if let Some(strategy) = options.strategy {
        config.layout.strategy = strategy;
    }
    if let Some(font_family) = &options.font_family {
        config.theme.font_family = font_family.clone();
    }
    if let Some(palette) = &options.palette {
        config.theme.palette = palette.clone();
    }
    if let Some(scales) = &options.scales {
        let scales: Vec<f32> = scales.iter().copied().filter(|s| *s > 0.0).collect();
        if !scales.is_empty() {
            config.layout.scales = scales;
        }
    }
    if let Some(ratio) = options.accept_ratio {
        config.layout.accept_ratio = ratio.clamp(0.0, 1.0);
    }
    if let Some(vertical) = options.vertical_enabled {
        config.layout.vertical_enabled = vertical;
    }
    config.layout.seed = options.seed;
    config
}

fn layout_json(words: &[WordRecord], options: &CloudOptions) -> Result<String, String> {
    let config = build_config(options);
    let mut measure = ApproxMeasure::default().with_padding(config.layout.padding_left);
    if let Some(ratio) = options.char_width_ratio.filter(|r| *r > 0.0) {
        measure.char_width_ratio = ratio;
    }
    // No OS entropy source is assumed on wasm targets.
    let mut rng = StdRng::seed_from_u64(options.seed.unwrap_or(0));
    let result = compute_layout_with_rng(words, &measure, &config, &mut rng)
        .map_err(|error| error.to_string())?;
    serde_json::to_string(&result).map_err(|error| error.to_string())
}

/// Lays out `words_json` (a JSON array of words or `text | weight` lines) and
/// returns the pass result as JSON.
#[wasm_bindgen]
pub fn layout_words(words_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<CloudOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        CloudOptions::default()
    };
    let words = parse_words(words_json).map_err(|error| JsValue::from_str(&error.to_string()))?;
    layout_json(&words, &options).map_err(|error| JsValue::from_str(&error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lays_out_words_with_options() {
        let words = parse_words(r#"[{"word": "rust", "weight": 4}, {"word": "wasm", "weight": 1}]"#)
            .expect("word list parses");
        let options: CloudOptions =
            serde_json::from_str(r#"{"width": 400, "height": 300, "seed": 7}"#).unwrap();
        let json = layout_json(&words, &options).expect("layout succeeds");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["placements"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["placements"][0]["text"], "rust");
        assert_eq!(value["coverageRatio"], 1.0);
    }

    #[test]
    fn same_seed_gives_same_json() {
        let words = parse_words("a | 3\nb | 2\nc | 1").unwrap();
        let options = CloudOptions {
            seed: Some(11),
            ..Default::default()
        };
        assert_eq!(layout_json(&words, &options), layout_json(&words, &options));
    }
}
