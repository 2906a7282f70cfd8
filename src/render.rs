use crate::config::Config;
use crate::layout::{PassResult, Placement};
use anyhow::Result;
use std::fmt::Write as _;
use std::path::Path;

pub fn render_svg(result: &PassResult, config: &Config) -> String {
    let width = config.render.width.max(1.0);
    let height = config.render.height.max(1.0);
    let mut svg = String::new();

    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    );
    let _ = write!(
        svg,
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        escape_xml(&config.render.background)
    );

    let family = escape_xml(&config.theme.font_family);
    for placement in &result.placements {
        svg.push_str(&word_svg(placement, &family));
    }

    svg.push_str("</svg>");
    svg
}

/// Text is anchored at the center of its box so rotation keeps it in place.
fn word_svg(placement: &Placement, family: &str) -> String {
    let cx = placement.x + placement.width / 2.0;
    let cy = placement.y + placement.height / 2.0;
    let transform = if placement.rotation == 0 {
        String::new()
    } else {
        format!(
            " transform=\"rotate({} {cx:.2} {cy:.2})\"",
            placement.rotation
        )
    };
    format!(
        "<text x=\"{cx:.2}\" y=\"{cy:.2}\" text-anchor=\"middle\" dominant-baseline=\"central\" font-family=\"{family}\" font-size=\"{}\" fill=\"{}\"{transform}>{}</text>",
        placement.font_size,
        escape_xml(&placement.color),
        escape_xml(&placement.text)
    )
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, config: &Config) -> Result<()> {
    let mut opt = usvg::Options::default();
    if let Some(first) = config.theme.font_family.split(',').next() {
        opt.font_family = first.trim().to_string();
    }
    let mut fontdb = usvg::fontdb::Database::new();
    fontdb.load_system_fonts();
    opt.fontdb = std::sync::Arc::new(fontdb);
    opt.default_size = usvg::Size::from_wh(config.render.width, config.render.height)
        .ok_or_else(|| anyhow::anyhow!("invalid output size"))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
