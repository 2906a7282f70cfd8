use crate::config::Config;
use crate::layout::PassResult;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Serializable snapshot of a layout run, for tooling and debugging.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub scale: f32,
    pub coverage_ratio: f32,
    pub placed: usize,
    pub words: Vec<WordDump>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordDump {
    pub id: String,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: u16,
    pub font_size: f32,
    pub color: String,
    pub group_rank: Option<u32>,
    /// On-screen footprint after rotation, `[x, y, width, height]`.
    pub bounds: [f32; 4],
}

impl LayoutDump {
    pub fn from_result(result: &PassResult, config: &Config) -> Self {
        let words = result
            .placements
            .iter()
            .map(|placement| {
                let bounds = placement.bounds();
                WordDump {
                    id: placement.id.clone(),
                    text: placement.text.clone(),
                    x: placement.x,
                    y: placement.y,
                    width: placement.width,
                    height: placement.height,
                    rotation: placement.rotation,
                    font_size: placement.font_size,
                    color: placement.color.clone(),
                    group_rank: placement.group_rank,
                    bounds: [bounds.x, bounds.y, bounds.width, bounds.height],
                }
            })
            .collect();

        LayoutDump {
            width: config.render.width,
            height: config.render.height,
            scale: result.scale,
            coverage_ratio: result.coverage_ratio,
            placed: result.placements.len(),
            words,
        }
    }
}

pub fn layout_dump_json(result: &PassResult, config: &Config) -> anyhow::Result<String> {
    let dump = LayoutDump::from_result(result, config);
    Ok(serde_json::to_string_pretty(&dump)?)
}

/// Writes the dump to `path`, or to stdout when `path` is `None`.
pub fn write_layout_dump(
    path: Option<&Path>,
    result: &PassResult,
    config: &Config,
) -> anyhow::Result<()> {
    let dump = LayoutDump::from_result(result, config);
    match path {
        Some(path) => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &dump)?;
            writer.flush()?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, &dump)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
