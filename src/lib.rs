#![forbid(unsafe_code)]

//! Educational animations of cache-friendly matrix multiplication.
//!
//! A deterministic traversal simulator emits the sequence of element
//! accesses a multiplication variant performs; a simulated L1/L2 cache
//! replays them; every resulting state becomes an SVG vector frame, a
//! rasterized image, and ultimately an MP4 assembled by `ffmpeg`.

pub mod cache;
pub mod encode_ffmpeg;
mod foundation;
pub mod model;
pub mod pipeline;
pub mod render;
pub mod scene;
pub mod tiling;
pub mod traversal;

pub use crate::foundation::core::{
    AccessEvent, AccessKind, CacheLevel, Dims, FrameIndex, MatrixId,
};
pub use crate::foundation::error::{MatvizError, MatvizResult};

pub use crate::cache::{CacheParams, CacheSim, MemoryModel, Totals};
pub use crate::model::SimConfig;
pub use crate::pipeline::{
    RenderToMp4Opts, RunStats, render_frame, render_to_mp4, scene_svg, write_trace_json,
};
pub use crate::render::{FrameRGBA, SvgRasterizer};
pub use crate::tiling::{Block, Span, spans};
pub use crate::traversal::{Traversal, Variant};
