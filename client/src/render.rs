//! # QR Code Rendering
//!
//! Prints the scannable URL as a Unicode QR code (two modules per character
//! cell) and optionally saves it as an SVG file, black on white.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use qrcode::render::{svg, unicode};
use qrcode::QrCode;

use ra_protocol::handshake::{CodeRenderer, RenderError};

/// Side length of the SVG output, in pixels.
const SVG_MIN_DIMENSION: u32 = 256;

/// Renders to a text sink and, optionally, an SVG file.
pub struct QrRenderer<W: Write> {
    out: W,
    svg_path: Option<PathBuf>,
}

impl QrRenderer<io::Stdout> {
    /// Render to stdout.
    pub fn stdout(svg_path: Option<PathBuf>) -> Self {
        Self::new(io::stdout(), svg_path)
    }
}

impl<W: Write> QrRenderer<W> {
    /// Render to `out`, and to an SVG at `svg_path` when one is given.
    pub fn new(out: W, svg_path: Option<PathBuf>) -> Self {
        Self { out, svg_path }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> CodeRenderer for QrRenderer<W> {
    fn render(&mut self, url: &str) -> Result<(), RenderError> {
        let code = QrCode::new(url.as_bytes()).map_err(|e| RenderError(e.to_string()))?;

        // Inverted so the code reads correctly on dark terminals.
        let text = code
            .render::<unicode::Dense1x2>()
            .dark_color(unicode::Dense1x2::Light)
            .light_color(unicode::Dense1x2::Dark)
            .build();
        writeln!(self.out, "{}\n\nScan with an already logged-in device: {}", text, url)
            .and_then(|_| self.out.flush())
            .map_err(|e| RenderError(e.to_string()))?;

        if let Some(path) = &self.svg_path {
            let image = code
                .render::<svg::Color<'_>>()
                .min_dimensions(SVG_MIN_DIMENSION, SVG_MIN_DIMENSION)
                .dark_color(svg::Color("#000000"))
                .light_color(svg::Color("#ffffff"))
                .build();
            fs::write(path, image)
                .map_err(|e| RenderError(format!("{}: {}", path.display(), e)))?;
            tracing::info!(path = %path.display(), "QR code written");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_text_code_with_url() {
        let mut renderer = QrRenderer::new(Vec::new(), None);
        renderer.render("https://discord.com/ra/xyz123").unwrap();

        let output = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(output.contains("https://discord.com/ra/xyz123"));
        // Dense1x2 uses half-block characters.
        assert!(output.contains('▀') || output.contains('▄') || output.contains('█'));
    }

    #[test]
    fn writes_svg_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qrcode.svg");

        let mut renderer = QrRenderer::new(Vec::new(), Some(path.clone()));
        renderer.render("https://discord.com/ra/xyz123").unwrap();

        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("#000000"));
        assert!(svg.contains("#ffffff"));
    }

    #[test]
    fn unwritable_svg_path_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("qrcode.svg");

        let mut renderer = QrRenderer::new(Vec::new(), Some(path));
        assert!(renderer.render("https://discord.com/ra/xyz123").is_err());
    }
}
