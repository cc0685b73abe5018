//! Frame production: replay the event stream through the memory model and
//! turn each state into a vector frame, pixels, and ultimately a video.
//!
//! Generation is strictly sequential; event order is the semantic payload
//! of the simulation and is never reordered or parallelized.

use std::io::Write;
use std::path::PathBuf;

use crate::{
    cache::{MemoryModel, Totals},
    encode_ffmpeg::{EncodeConfig, FfmpegEncoder},
    foundation::core::FrameIndex,
    foundation::error::{MatvizError, MatvizResult},
    model::SimConfig,
    render::{FrameRGBA, SvgRasterizer},
    scene,
    traversal::Traversal,
};

/// Counters reported after a full render.
#[derive(Clone, Copy, Debug)]
pub struct RunStats {
    pub frames: u64,
    pub totals: Totals,
}

/// Options for [`render_to_mp4`].
#[derive(Clone, Debug)]
pub struct RenderToMp4Opts {
    /// Background color to flatten alpha over (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
    /// Whether to overwrite the output file if it already exists.
    pub overwrite: bool,
}

impl Default for RenderToMp4Opts {
    fn default() -> Self {
        Self {
            bg_rgba: [255, 255, 255, 255],
            overwrite: true,
        }
    }
}

fn replay_to(cfg: &SimConfig, frame: FrameIndex) -> MatvizResult<MemoryModel> {
    let tr = Traversal::new(cfg.dims, cfg.variant)?;
    if frame.0 >= tr.event_count() {
        return Err(MatvizError::config(format!(
            "frame {} is out of bounds (run has {} events)",
            frame.0,
            tr.event_count()
        )));
    }

    let mut model = MemoryModel::new(cfg.dims, cfg.variant.transposed_b(), cfg.cache);
    for ev in tr.events().take(frame.0 as usize + 1) {
        model.apply(&ev);
    }
    Ok(model)
}

/// The vector document for one frame of the animation.
///
/// Replays the event stream up to (and including) `frame`; replay is cheap
/// at the illustrative dimensions this tool targets.
pub fn scene_svg(cfg: &SimConfig, frame: FrameIndex) -> MatvizResult<String> {
    cfg.validate()?;
    let model = replay_to(cfg, frame)?;
    Ok(scene::scene_svg(cfg, &model))
}

/// Evaluate + rasterize a single frame.
///
/// This is the one-shot API for PNG output and tests; a full render uses
/// [`render_to_mp4`], which keeps one rasterizer across all frames.
pub fn render_frame(cfg: &SimConfig, frame: FrameIndex) -> MatvizResult<FrameRGBA> {
    let svg = scene_svg(cfg, frame)?;
    SvgRasterizer::new().rasterize(&svg, cfg.scale)
}

/// Render the whole animation to an MP4 by piping frames into the system
/// `ffmpeg` binary.
#[tracing::instrument(skip(cfg), fields(variant = ?cfg.variant, dims = ?cfg.dims))]
pub fn render_to_mp4(
    cfg: &SimConfig,
    out_path: impl Into<PathBuf> + std::fmt::Debug,
    opts: RenderToMp4Opts,
) -> MatvizResult<RunStats> {
    cfg.validate()?;
    let tr = Traversal::new(cfg.dims, cfg.variant)?;

    let (width, height) = SvgRasterizer::frame_size(cfg.scale);
    let enc_cfg = EncodeConfig {
        width,
        height,
        fps: cfg.fps,
        out_path: out_path.into(),
        overwrite: opts.overwrite,
    };

    let rasterizer = SvgRasterizer::new();
    let mut enc = FfmpegEncoder::new(enc_cfg, opts.bg_rgba)?;
    let mut model = MemoryModel::new(cfg.dims, cfg.variant.transposed_b(), cfg.cache);

    let mut frames = 0u64;
    for ev in tr.events() {
        model.apply(&ev);
        let svg = scene::scene_svg(cfg, &model);
        let frame = rasterizer.rasterize(&svg, cfg.scale)?;
        enc.encode_frame(&frame)?;
        frames += 1;
    }
    enc.finish()?;

    let totals = model.totals();
    tracing::debug!(frames, %totals, "render finished");
    Ok(RunStats { frames, totals })
}

/// Stream the event sequence as JSON lines.
///
/// Returns the number of events written. The trace is a stable,
/// machine-readable form of the simulation for piping and testing.
pub fn write_trace_json(cfg: &SimConfig, mut w: impl Write) -> MatvizResult<u64> {
    cfg.validate()?;
    let tr = Traversal::new(cfg.dims, cfg.variant)?;

    let mut count = 0u64;
    for ev in tr.events() {
        let line = serde_json::to_string(&ev)
            .map_err(|e| MatvizError::config(format!("serialize event: {e}")))?;
        writeln!(w, "{line}").map_err(|e| MatvizError::Other(anyhow::Error::new(e)))?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::{AccessEvent, Dims};
    use crate::traversal::Variant;

    fn cfg() -> SimConfig {
        SimConfig::new("t", Dims::square(2).unwrap(), Variant::Naive)
    }

    #[test]
    fn scene_is_deterministic_across_replays() {
        let cfg = cfg();
        let a = scene_svg(&cfg, FrameIndex(5)).unwrap();
        let b = scene_svg(&cfg, FrameIndex(5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn out_of_bounds_frame_is_a_config_error() {
        let cfg = cfg();
        // 2x2x2 naive: 2*2*(3*2+1) = 28 events.
        assert!(scene_svg(&cfg, FrameIndex(27)).is_ok());
        assert!(matches!(
            scene_svg(&cfg, FrameIndex(28)),
            Err(MatvizError::Config(_))
        ));
    }

    #[test]
    fn trace_emits_one_json_line_per_event() {
        let cfg = cfg();
        let mut buf = Vec::new();
        let count = write_trace_json(&cfg, &mut buf).unwrap();
        assert_eq!(count, 28);

        let text = String::from_utf8(buf).unwrap();
        let events: Vec<AccessEvent> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(events.len(), 28);
    }
}
