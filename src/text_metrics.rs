use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;
use ttf_parser::Face;

static FONT_LIBRARY: Lazy<Mutex<FontLibrary>> = Lazy::new(|| Mutex::new(FontLibrary::new()));

/// Pixel extent of a rendered string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextSize {
    pub width: f32,
    pub height: f32,
}

impl TextSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width >= 0.0 && self.height >= 0.0
    }
}

#[derive(Debug, Error)]
pub enum MeasureError {
    #[error("no usable font for family '{0}'")]
    FontUnavailable(String),
    #[error("font library lock poisoned")]
    Poisoned,
    #[error("{0}")]
    Other(String),
}

/// Reports the rendered size of `text` at `font_size` pixels.
///
/// Implementations must be deterministic for a given text, size and font
/// within one process.
pub trait TextMeasure {
    fn measure(&self, text: &str, font_size: f32) -> Result<TextSize, MeasureError>;
}

impl<F> TextMeasure for F
where
    F: Fn(&str, f32) -> Result<TextSize, MeasureError>,
{
    fn measure(&self, text: &str, font_size: f32) -> Result<TextSize, MeasureError> {
        self(text, font_size)
    }
}

/// Measures with a system font resolved from a CSS-like family list.
#[derive(Debug, Clone)]
pub struct FontMeasure {
    pub font_family: String,
    pub padding_left: f32,
    pub line_height: f32,
}

impl FontMeasure {
    pub fn new(font_family: impl Into<String>) -> Self {
        Self {
            font_family: font_family.into(),
            padding_left: 2.0,
            line_height: 1.0,
        }
    }

    pub fn with_padding(mut self, padding_left: f32) -> Self {
        self.padding_left = padding_left;
        self
    }
}

impl TextMeasure for FontMeasure {
    fn measure(&self, text: &str, font_size: f32) -> Result<TextSize, MeasureError> {
        let width = measure_text_width(text, font_size, &self.font_family)?;
        Ok(TextSize::new(
            width + self.padding_left,
            font_size * self.line_height,
        ))
    }
}

/// Font-free measure using a fixed average glyph width.
///
/// Good enough for tests and for targets without access to system fonts.
#[derive(Debug, Clone, Copy)]
pub struct ApproxMeasure {
    pub char_width_ratio: f32,
    pub padding_left: f32,
    pub line_height: f32,
}

impl Default for ApproxMeasure {
    fn default() -> Self {
        Self {
            char_width_ratio: 0.56,
            padding_left: 2.0,
            line_height: 1.0,
        }
    }
}

impl ApproxMeasure {
    pub fn with_padding(mut self, padding_left: f32) -> Self {
        self.padding_left = padding_left;
        self
    }
}

impl TextMeasure for ApproxMeasure {
    fn measure(&self, text: &str, font_size: f32) -> Result<TextSize, MeasureError> {
        let chars = text.chars().filter(|ch| *ch != '\n').count() as f32;
        Ok(TextSize::new(
            chars * font_size * self.char_width_ratio + self.padding_left,
            font_size * self.line_height,
        ))
    }
}

/// Width of a single line of text in pixels.
pub fn measure_text_width(text: &str, font_size: f32, font_family: &str) -> Result<f32, MeasureError> {
    if text.is_empty() || font_size <= 0.0 {
        return Ok(0.0);
    }
    let mut library = FONT_LIBRARY.lock().map_err(|_| MeasureError::Poisoned)?;
    library.measure(text, font_size, font_family)
}

struct FontLibrary {
    db: Database,
    loaded_system_fonts: bool,
    faces: HashMap<String, Option<LoadedFace>>,
}

impl FontLibrary {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            faces: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font_size: f32, font_family: &str) -> Result<f32, MeasureError> {
        let key = normalize_family_key(font_family);
        if !self.faces.contains_key(&key) {
            let face = self.load_face(&key);
            if face.is_none() {
                tracing::warn!(family = %key, "no system font matched, measurements will fail");
            }
            self.faces.insert(key.clone(), face);
        }
        let face = self
            .faces
            .get_mut(&key)
            .and_then(|face| face.as_mut())
            .ok_or_else(|| MeasureError::FontUnavailable(key.clone()))?;
        face.measure_width(text, font_size)
    }

    fn load_face(&mut self, family_key: &str) -> Option<LoadedFace> {
        if let Some(face) = load_cached_face(family_key) {
            return Some(face);
        }

        let names: Vec<&str> = family_key
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\''))
            .filter(|part| !part.is_empty())
            .collect();
        let mut families: Vec<Family<'_>> = names
            .iter()
            .map(|name| match name.to_ascii_lowercase().as_str() {
                "serif" => Family::Serif,
                "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => {
                    Family::SansSerif
                }
                "monospace" | "ui-monospace" => Family::Monospace,
                "cursive" => Family::Cursive,
                "fantasy" => Family::Fantasy,
                _ => Family::Name(name),
            })
            .collect();
        if families.is_empty() {
            families.push(Family::SansSerif);
        }

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| {
                let face = LoadedFace::parse(data.to_vec(), index)?;
                store_cached_face(family_key, &face.data, index);
                Some(face)
            })
            .flatten()
    }
}

struct LoadedFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: f32,
    advances: HashMap<char, Option<u16>>,
}

impl LoadedFace {
    fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
        let units_per_em = Face::parse(&data, index).ok()?.units_per_em().max(1) as f32;
        Some(Self {
            data,
            index,
            units_per_em,
            advances: HashMap::new(),
        })
    }

    fn measure_width(&mut self, text: &str, font_size: f32) -> Result<f32, MeasureError> {
        let missing: Vec<char> = text
            .chars()
            .filter(|ch| *ch != '\n' && !self.advances.contains_key(ch))
            .collect();
        if !missing.is_empty() {
            let face = Face::parse(&self.data, self.index)
                .map_err(|err| MeasureError::Other(err.to_string()))?;
            for ch in missing {
                let advance = face
                    .glyph_index(ch)
                    .and_then(|glyph| face.glyph_hor_advance(glyph));
                self.advances.insert(ch, advance);
            }
        }

        let scale = font_size / self.units_per_em;
        let fallback = font_size * 0.56;
        let width = text
            .chars()
            .filter(|ch| *ch != '\n')
            .map(|ch| match self.advances.get(&ch).copied().flatten() {
                Some(advance) if advance > 0 => advance as f32 * scale,
                _ => fallback,
            })
            .sum::<f32>();
        Ok(width.max(0.0))
    }
}

fn normalize_family_key(font_family: &str) -> String {
    let trimmed = font_family.trim();
    if trimmed.is_empty() {
        "sans-serif".to_string()
    } else {
        trimmed.to_string()
    }
}

fn cache_paths(family_key: &str) -> Option<(PathBuf, PathBuf)> {
    let base = std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))?;
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    family_key.hash(&mut hasher);
    let hash = hasher.finish();
    let dir = base.join("wcloud").join("font-cache");
    Some((
        dir.join(format!("{hash:x}.font")),
        dir.join(format!("{hash:x}.meta")),
    ))
}

fn store_cached_face(family_key: &str, data: &[u8], index: u32) {
    let Some((font_path, meta_path)) = cache_paths(family_key) else {
        return;
    };
    if font_path.exists() {
        return;
    }
    let written = font_path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|_| fs::write(&font_path, data))
        .and_then(|_| fs::write(&meta_path, index.to_string()));
    if let Err(err) = written {
        tracing::debug!(%err, "could not cache font face");
    }
}

fn load_cached_face(family_key: &str) -> Option<LoadedFace> {
    let (font_path, meta_path) = cache_paths(family_key)?;
    if !font_path.exists() || !meta_path.exists() {
        return None;
    }
    let bytes = fs::read(font_path).ok()?;
    let index: u32 = fs::read_to_string(meta_path).ok()?.trim().parse().ok()?;
    LoadedFace::parse(bytes, index)
}
