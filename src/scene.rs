//! Vector frame builder: one SVG document per access event.
//!
//! The layout follows the reference animation's 380x200 canvas: title line,
//! the three matrix grids (A x B = C) with cache tinting and stat lines,
//! and linear-memory strips underneath. Coordinates are computed with
//! `kurbo` and written out as plain SVG elements; the rasterizer resolves
//! text against system fonts.

use std::fmt::Write as _;

use kurbo::{Point, Rect};

use crate::cache::{CacheSim, MemoryModel};
use crate::foundation::core::{CacheLevel, MatrixId};
use crate::model::SimConfig;
use crate::tiling::Block;
use crate::traversal::Variant;

/// Logical canvas size in SVG user units.
pub const CANVAS_W: f64 = 380.0;
pub const CANVAS_H: f64 = 200.0;

const MARGIN_X: f64 = 20.0;
const TITLE_Y: f64 = 25.0;
const GRID_Y: f64 = 45.0;
const GRID_PX: f64 = 100.0;
const GRID_STRIDE: f64 = 120.0;
const TOTALS_Y: f64 = 160.0;
const STRIP_Y: f64 = 175.0;
const STRIP_W: f64 = 340.0;

const NAME_FONT: f64 = 8.3;
const STAT_FONT: f64 = 5.0;

/// Render the current simulation state as an SVG vector frame.
pub fn scene_svg(cfg: &SimConfig, model: &MemoryModel) -> String {
    let mut out = String::with_capacity(16 * 1024);
    let _ = write!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{CANVAS_W}\" height=\"{CANVAS_H}\" \
         viewBox=\"0 0 {CANVAS_W} {CANVAS_H}\" font-family=\"sans-serif\">\n"
    );
    let _ = write!(
        out,
        "<rect x=\"0\" y=\"0\" width=\"{CANVAS_W}\" height=\"{CANVAS_H}\" fill=\"white\"/>\n"
    );

    push_text(
        &mut out,
        Point::new(MARGIN_X, TITLE_Y),
        10.0,
        &format!("Matrix multiplication: {}", xml_escape(&cfg.title)),
    );

    for (idx, id) in [MatrixId::A, MatrixId::B, MatrixId::C]
        .into_iter()
        .enumerate()
    {
        let origin = Point::new(MARGIN_X + idx as f64 * GRID_STRIDE, GRID_Y);
        push_grid(&mut out, id.name(), model.matrix(id), cfg.variant, origin);
    }

    push_text(&mut out, Point::new(MARGIN_X + 105.0, GRID_Y + 50.0), 10.0, "\u{d7}");
    push_text(&mut out, Point::new(MARGIN_X + 225.0, GRID_Y + 50.0), 10.0, "=");

    push_text(
        &mut out,
        Point::new(MARGIN_X, TOTALS_Y),
        NAME_FONT,
        &format!("Totals: {}", model.totals()),
    );

    if cfg.show_linear {
        let mut y = STRIP_Y;
        for id in [MatrixId::A, MatrixId::B, MatrixId::C] {
            let sim = model.matrix(id);
            y += push_strip(&mut out, id.name(), sim, Point::new(MARGIN_X, y));
        }
    }

    out.push_str("</svg>\n");
    out
}

fn push_text(out: &mut String, at: Point, size: f64, text: &str) {
    let _ = write!(
        out,
        "<text x=\"{:.2}\" y=\"{:.2}\" font-size=\"{size}\" fill=\"black\">{text}</text>\n",
        at.x, at.y
    );
}

fn push_rect(out: &mut String, r: Rect, fill: &str, stroke: Option<(&str, f64)>, dashed: bool) {
    let _ = write!(
        out,
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{fill}\"",
        r.x0,
        r.y0,
        r.width(),
        r.height()
    );
    if let Some((color, width)) = stroke {
        let _ = write!(out, " stroke=\"{color}\" stroke-width=\"{width:.2}\"");
        if dashed {
            let _ = write!(out, " stroke-dasharray=\"{:.2}\"", width * 3.0);
        }
    }
    out.push_str("/>\n");
}

/// One matrix grid: stat line, cache-line tinting, grid lines, the
/// last-access outline and, for blocked variants, the resident-block
/// outline(s).
fn push_grid(out: &mut String, name: &str, sim: &CacheSim, variant: Variant, origin: Point) {
    let (rows, cols) = sim.storage_dims();
    let cell = GRID_PX / rows.max(cols) as f64;

    push_text(out, Point::new(origin.x, origin.y - 2.5), NAME_FONT, name);
    push_text(
        out,
        Point::new(origin.x + 14.0, origin.y - 2.5),
        STAT_FONT,
        &stat_line(sim),
    );

    // Resident cache lines, most recent first. Only the first element of
    // each line anchors the tint; the rect spans the whole line.
    for (idx, tag) in sim.resident() {
        let (x, y) = sim.line_origin(tag);
        let width = sim.line_size().min(cols - x);
        let r = Rect::new(
            origin.x + x as f64 * cell,
            origin.y + y as f64 * cell,
            origin.x + (x + width) as f64 * cell,
            origin.y + (y + 1) as f64 * cell,
        );
        push_rect(out, r, &residency_color(sim, idx), None, false);
    }

    let stroke_w = cell / 10.0;
    for i in 1..rows {
        let y = origin.y + i as f64 * cell;
        let _ = write!(
            out,
            "<line x1=\"{:.2}\" y1=\"{y:.2}\" x2=\"{:.2}\" y2=\"{y:.2}\" stroke=\"black\" stroke-width=\"{stroke_w:.2}\"/>\n",
            origin.x,
            origin.x + cols as f64 * cell,
        );
    }
    for i in 1..cols {
        let x = origin.x + i as f64 * cell;
        let _ = write!(
            out,
            "<line x1=\"{x:.2}\" y1=\"{:.2}\" x2=\"{x:.2}\" y2=\"{:.2}\" stroke=\"black\" stroke-width=\"{stroke_w:.2}\"/>\n",
            origin.y,
            origin.y + rows as f64 * cell,
        );
    }
    push_rect(
        out,
        Rect::new(
            origin.x,
            origin.y,
            origin.x + cols as f64 * cell,
            origin.y + rows as f64 * cell,
        ),
        "none",
        Some(("black", stroke_w)),
        false,
    );

    push_block_outlines(out, sim, variant, origin, cell);

    if let Some((x, y)) = sim.last_access() {
        let r = Rect::new(
            origin.x + x as f64 * cell,
            origin.y + y as f64 * cell,
            origin.x + (x + 1) as f64 * cell,
            origin.y + (y + 1) as f64 * cell,
        );
        push_rect(out, r, "none", Some(("black", cell * 0.4)), false);
    }
}

/// Outline the tile(s) holding the last access, one per tiling level the
/// variant defines.
fn push_block_outlines(out: &mut String, sim: &CacheSim, variant: Variant, origin: Point, cell: f64) {
    let Some((row, col)) = sim.last_access_logical() else {
        return;
    };
    let (rows, cols) = sim.logical_dims();

    for (level, color) in [
        (CacheLevel::L2Block, "rgb(230,140,0)"),
        (CacheLevel::L1Block, "rgb(120,40,200)"),
    ] {
        let Some(side) = variant.block_side(level) else {
            continue;
        };
        let b = Block::containing(row, col, side, side, rows, cols);
        // Map the logical block into the storage-space grid.
        let (x0, y0, w, h) = if sim.transposed() {
            (b.row0, b.col0, b.rows, b.cols)
        } else {
            (b.col0, b.row0, b.cols, b.rows)
        };
        let r = Rect::new(
            origin.x + x0 as f64 * cell,
            origin.y + y0 as f64 * cell,
            origin.x + (x0 + w) as f64 * cell,
            origin.y + (y0 + h) as f64 * cell,
        );
        push_rect(out, r, "none", Some((color, cell * 0.15)), true);
    }
}

/// One linear-memory strip in storage order; returns the vertical space
/// consumed so the caller can stack the next strip.
fn push_strip(out: &mut String, name: &str, sim: &CacheSim, origin: Point) -> f64 {
    let (rows, cols) = sim.storage_dims();
    let n = (rows * cols) as f64;
    let cell = STRIP_W / n;

    push_text(
        out,
        Point::new(origin.x - 8.0, origin.y + cell),
        3.5,
        name,
    );

    for (idx, tag) in sim.resident() {
        let width = sim.line_size().min(rows * cols - tag) as f64;
        let r = Rect::new(
            origin.x + tag as f64 * cell,
            origin.y,
            origin.x + (tag as f64 + width) * cell,
            origin.y + cell,
        );
        push_rect(out, r, &residency_color(sim, idx), None, false);
    }

    push_rect(
        out,
        Rect::new(origin.x, origin.y, origin.x + STRIP_W, origin.y + cell),
        "none",
        Some(("black", cell / 10.0)),
        false,
    );

    if let Some((x, y)) = sim.last_access() {
        let addr = sim.addr_of(x, y) as f64;
        let r = Rect::new(
            origin.x + addr * cell,
            origin.y,
            origin.x + (addr + 1.0) * cell,
            origin.y + cell,
        );
        push_rect(out, r, "none", Some(("black", cell / 10.0)), false);
    }

    cell * 2.5
}

/// Tint for a resident line: a green ramp over the L1 region of the LRU
/// list, a red ramp over the rest, brightest for the most recent.
fn residency_color(sim: &CacheSim, lru_index: usize) -> String {
    if lru_index < sim.l1_lines() {
        let t = lru_index as f64 / sim.l1_lines() as f64;
        let c = (t * 255.0).round().clamp(0.0, 255.0) as u8;
        format!("rgb({c},255,{c})")
    } else {
        let t = lru_index as f64 / sim.l2_lines() as f64 / 1.5;
        let c = (t * 255.0).round().clamp(0.0, 255.0) as u8;
        format!("rgb(255,{c},{c})")
    }
}

/// Per-matrix counter line, split into L1/L2 only when an L1 region is
/// configured.
fn stat_line(sim: &CacheSim) -> String {
    if sim.l1_lines() > 0 {
        format!(
            "mem:{:<3} L1 hit:{:<3} L2 hit:{:<3}",
            sim.accesses(),
            sim.l1_hits(),
            sim.l2_hits()
        )
    } else {
        format!("mem:{:<3} cache hit:{:<3}", sim.accesses(), sim.l2_hits())
    }
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
