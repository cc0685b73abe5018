//! Rasterization of SVG vector frames into RGBA pixels.

use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::error::{MatvizError, MatvizResult};
use crate::scene::{CANVAS_H, CANVAS_W};

/// One rasterized frame.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

/// SVG parser + rasterizer with system fonts loaded once.
///
/// Scene documents carry `<text>` elements; resolving them requires a font
/// database, which is expensive to build, so one rasterizer should be
/// reused across all frames of a run.
pub struct SvgRasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl SvgRasterizer {
    pub fn new() -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!(faces = db.faces().count(), "loaded system fonts");
        Self {
            fontdb: Arc::new(db),
        }
    }

    /// Pixel size of a frame at the given raster scale.
    pub fn frame_size(scale: u32) -> (u32, u32) {
        (CANVAS_W as u32 * scale, CANVAS_H as u32 * scale)
    }

    /// Parse one scene document and render it at `scale`.
    ///
    /// Returns premultiplied RGBA8; scenes paint an opaque background, so
    /// the distinction only matters to the encoder's flattening step.
    pub fn rasterize(&self, svg: &str, scale: u32) -> MatvizResult<FrameRGBA> {
        let opts = usvg::Options {
            fontdb: self.fontdb.clone(),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_data(svg.as_bytes(), &opts).context("parse scene svg")?;

        let (width, height) = Self::frame_size(scale);
        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| MatvizError::render("failed to allocate frame pixmap"))?;

        let sx = width as f32 / tree.size().width();
        let sy = height as f32 / tree.size().height();
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::from_scale(sx, sy),
            &mut pixmap.as_mut(),
        );

        Ok(FrameRGBA {
            width,
            height,
            data: pixmap.data().to_vec(),
            premultiplied: true,
        })
    }
}

impl Default for SvgRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_size_scales_the_canvas() {
        assert_eq!(SvgRasterizer::frame_size(1), (380, 200));
        assert_eq!(SvgRasterizer::frame_size(3), (1140, 600));
    }

    #[test]
    fn rasterize_fills_the_background() {
        let svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{CANVAS_W}\" height=\"{CANVAS_H}\">\
             <rect width=\"{CANVAS_W}\" height=\"{CANVAS_H}\" fill=\"white\"/></svg>"
        );
        let frame = SvgRasterizer::new().rasterize(&svg, 1).unwrap();
        assert_eq!((frame.width, frame.height), (380, 200));
        assert_eq!(frame.data.len(), 380 * 200 * 4);
        assert_eq!(&frame.data[0..4], &[255, 255, 255, 255]);
    }

    #[test]
    fn malformed_svg_is_an_error() {
        assert!(SvgRasterizer::new().rasterize("<svg", 1).is_err());
    }
}
