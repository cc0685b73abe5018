//! Simulated memory hierarchy replayed behind the event stream.
//!
//! Each matrix gets an LRU list of cache-line tags. The front `l1_lines`
//! entries model an L1-resident region, the rest of the list an L2 region;
//! a hit's attribution depends on the position the tag was found at. This
//! is an abstract teaching model, not a hardware simulation.

use std::collections::VecDeque;

use crate::foundation::core::{AccessEvent, Dims, MatrixId};
use crate::foundation::error::{MatvizError, MatvizResult};

/// Cache geometry shared by all three matrices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CacheParams {
    /// Elements per cache line; must be a power of two.
    pub line_size: usize,
    /// Lines modeled as L1-resident. Zero collapses the split and every
    /// hit counts as a plain cache hit.
    pub l1_lines: usize,
    /// Total lines held before eviction.
    pub l2_lines: usize,
}

impl Default for CacheParams {
    fn default() -> Self {
        Self {
            line_size: 2,
            l1_lines: 0,
            l2_lines: 8,
        }
    }
}

impl CacheParams {
    pub fn validate(&self) -> MatvizResult<()> {
        if self.line_size == 0 || !self.line_size.is_power_of_two() {
            return Err(MatvizError::config(
                "cache line size must be a non-zero power of two",
            ));
        }
        if self.l2_lines == 0 {
            return Err(MatvizError::config("cache must hold at least one line"));
        }
        if self.l1_lines > self.l2_lines {
            return Err(MatvizError::config(
                "l1 lines cannot exceed total cache lines",
            ));
        }
        Ok(())
    }
}

/// Per-matrix cache state and access counters.
#[derive(Clone, Debug)]
pub struct CacheSim {
    params: CacheParams,
    rows: usize,
    cols: usize,
    transpose: bool,
    lru: VecDeque<usize>,
    accesses: u64,
    l1_hits: u64,
    l2_hits: u64,
    last: Option<(usize, usize)>,
}

impl CacheSim {
    pub fn new(rows: usize, cols: usize, transpose: bool, params: CacheParams) -> Self {
        Self {
            params,
            rows,
            cols,
            transpose,
            lru: VecDeque::with_capacity(params.l2_lines + 1),
            accesses: 0,
            l1_hits: 0,
            l2_hits: 0,
            last: None,
        }
    }

    /// Storage grid size: transposed matrices are laid out (and drawn)
    /// with their axes swapped.
    pub fn storage_dims(&self) -> (usize, usize) {
        if self.transpose {
            (self.cols, self.rows)
        } else {
            (self.rows, self.cols)
        }
    }

    /// Logical matrix size, independent of storage layout.
    pub fn logical_dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn transposed(&self) -> bool {
        self.transpose
    }

    /// Logical `(row, col)` of the most recent access.
    pub fn last_access_logical(&self) -> Option<(usize, usize)> {
        self.last.map(|(x, y)| {
            if self.transpose { (x, y) } else { (y, x) }
        })
    }

    pub fn line_size(&self) -> usize {
        self.params.line_size
    }

    pub fn l1_lines(&self) -> usize {
        self.params.l1_lines
    }

    pub fn l2_lines(&self) -> usize {
        self.params.l2_lines
    }

    pub fn accesses(&self) -> u64 {
        self.accesses
    }

    pub fn l1_hits(&self) -> u64 {
        self.l1_hits
    }

    pub fn l2_hits(&self) -> u64 {
        self.l2_hits
    }

    /// Storage-space `(x, y)` of the most recent access.
    pub fn last_access(&self) -> Option<(usize, usize)> {
        self.last
    }

    /// Map a logical element to storage-space `(x, y)`.
    fn storage_xy(&self, row: usize, col: usize) -> (usize, usize) {
        if self.transpose { (row, col) } else { (col, row) }
    }

    /// Linear storage address of a storage-space position.
    pub fn addr_of(&self, x: usize, y: usize) -> usize {
        let (_, storage_cols) = self.storage_dims();
        y * storage_cols + x
    }

    /// Tag of the line holding an address.
    pub fn line_tag(&self, addr: usize) -> usize {
        addr & !(self.params.line_size - 1)
    }

    /// Storage-space `(x, y)` of the first element of a line.
    pub fn line_origin(&self, tag: usize) -> (usize, usize) {
        let (_, storage_cols) = self.storage_dims();
        (tag % storage_cols, tag / storage_cols)
    }

    /// Resident lines, most recently used first: `(lru_index, tag)`.
    pub fn resident(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.lru.iter().copied().enumerate()
    }

    /// Touch one logical element, updating LRU state and hit counters.
    pub fn access(&mut self, row: usize, col: usize) {
        let (x, y) = self.storage_xy(row, col);
        self.accesses += 1;
        self.last = Some((x, y));

        let tag = self.line_tag(self.addr_of(x, y));
        if let Some(pos) = self.lru.iter().position(|&t| t == tag) {
            self.lru.remove(pos);
            if pos < self.params.l1_lines {
                self.l1_hits += 1;
            } else {
                self.l2_hits += 1;
            }
        }
        self.lru.push_front(tag);
        self.lru.truncate(self.params.l2_lines);
    }
}

/// The three per-matrix simulators, routed by event.
#[derive(Clone, Debug)]
pub struct MemoryModel {
    a: CacheSim,
    b: CacheSim,
    c: CacheSim,
}

impl MemoryModel {
    pub fn new(dims: Dims, transposed_b: bool, params: CacheParams) -> Self {
        Self {
            a: CacheSim::new(dims.m, dims.k, false, params),
            b: CacheSim::new(dims.k, dims.n, transposed_b, params),
            c: CacheSim::new(dims.m, dims.n, false, params),
        }
    }

    pub fn matrix(&self, id: MatrixId) -> &CacheSim {
        match id {
            MatrixId::A => &self.a,
            MatrixId::B => &self.b,
            MatrixId::C => &self.c,
        }
    }

    pub fn apply(&mut self, ev: &AccessEvent) {
        let sim = match ev.matrix {
            MatrixId::A => &mut self.a,
            MatrixId::B => &mut self.b,
            MatrixId::C => &mut self.c,
        };
        sim.access(ev.row, ev.col);
    }

    pub fn totals(&self) -> Totals {
        Totals {
            mem: self.a.accesses + self.b.accesses + self.c.accesses,
            l1_hits: self.a.l1_hits + self.b.l1_hits + self.c.l1_hits,
            l2_hits: self.a.l2_hits + self.b.l2_hits + self.c.l2_hits,
            split_l1: self.a.params.l1_lines > 0,
        }
    }
}

/// Aggregated counters for the end-of-run summary line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Totals {
    pub mem: u64,
    pub l1_hits: u64,
    pub l2_hits: u64,
    split_l1: bool,
}

impl Totals {
    pub fn cache_hits(&self) -> u64 {
        self.l1_hits + self.l2_hits
    }

    /// Integer percentage of `part` over all accesses; zero when nothing
    /// has been accessed yet.
    pub fn pct(&self, part: u64) -> u64 {
        if self.mem == 0 { 0 } else { 100 * part / self.mem }
    }
}

impl std::fmt::Display for Totals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.split_l1 {
            write!(
                f,
                "mem:{:<4}   L1 hits:{:<4}\u{2245}{:2}%   L2 hits:{:<4}\u{2245}{:2}%   cache hits:{:<4}\u{2245}{:2}%",
                self.mem,
                self.l1_hits,
                self.pct(self.l1_hits),
                self.l2_hits,
                self.pct(self.l2_hits),
                self.cache_hits(),
                self.pct(self.cache_hits()),
            )
        } else {
            write!(
                f,
                "mem:{:<4}   cache hits:{:<4}\u{2245}{:2}%",
                self.mem,
                self.cache_hits(),
                self.pct(self.cache_hits()),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::{AccessEvent, CacheLevel};

    fn params(line: usize, l1: usize, l2: usize) -> CacheParams {
        CacheParams {
            line_size: line,
            l1_lines: l1,
            l2_lines: l2,
        }
    }

    #[test]
    fn params_validation() {
        assert!(CacheParams::default().validate().is_ok());
        assert!(params(3, 0, 8).validate().is_err());
        assert!(params(0, 0, 8).validate().is_err());
        assert!(params(2, 0, 0).validate().is_err());
        assert!(params(2, 9, 8).validate().is_err());
    }

    #[test]
    fn repeat_access_hits_in_l1_region() {
        let mut sim = CacheSim::new(4, 4, false, params(2, 2, 4));
        sim.access(0, 0);
        assert_eq!(sim.accesses(), 1);
        assert_eq!(sim.l1_hits() + sim.l2_hits(), 0);

        // Same line (0,1 shares the 2-element line with 0,0), found at
        // LRU position 0 which is inside the L1 region.
        sim.access(0, 1);
        assert_eq!(sim.l1_hits(), 1);
        assert_eq!(sim.l2_hits(), 0);
    }

    #[test]
    fn hit_beyond_l1_region_counts_as_l2() {
        let mut sim = CacheSim::new(4, 4, false, params(2, 1, 4));
        sim.access(0, 0); // line 0
        sim.access(1, 0); // line 4
        sim.access(2, 0); // line 8, pushes line 0 to position 2
        sim.access(0, 0); // found at position 2 >= l1_lines=1
        assert_eq!(sim.l1_hits(), 0);
        assert_eq!(sim.l2_hits(), 1);
    }

    #[test]
    fn capacity_eviction_forgets_oldest_line() {
        let mut sim = CacheSim::new(4, 4, false, params(2, 0, 2));
        sim.access(0, 0); // line 0
        sim.access(1, 0); // line 4
        sim.access(2, 0); // line 8 evicts line 0
        sim.access(0, 0); // miss again
        assert_eq!(sim.l1_hits() + sim.l2_hits(), 0);
        assert_eq!(sim.accesses(), 4);
    }

    #[test]
    fn transposed_storage_swaps_the_address_mapping() {
        let straight = CacheSim::new(4, 4, false, params(2, 0, 8));
        let transposed = CacheSim::new(4, 4, true, params(2, 0, 8));
        // Logical (row=1, col=2): straight storage -> addr 1*4+2, the
        // transposed layout stores it at addr 2*4+1.
        let (x, y) = straight.storage_xy(1, 2);
        assert_eq!(straight.addr_of(x, y), 6);
        let (x, y) = transposed.storage_xy(1, 2);
        assert_eq!(transposed.addr_of(x, y), 9);
    }

    #[test]
    fn transposed_walk_down_a_column_is_contiguous() {
        // Walking B down a column is the naive variant's weakness; with
        // transposed storage the same walk shares cache lines.
        let p = params(2, 0, 1);
        let mut straight = CacheSim::new(4, 4, false, p);
        let mut transposed = CacheSim::new(4, 4, true, p);
        for k in 0..4 {
            straight.access(k, 0);
            transposed.access(k, 0);
        }
        assert_eq!(straight.l2_hits(), 0);
        assert_eq!(transposed.l2_hits(), 2);
    }

    #[test]
    fn model_routes_events_and_totals_add_up() {
        let dims = Dims::new(2, 2, 2).unwrap();
        let mut model = MemoryModel::new(dims, false, CacheParams::default());
        model.apply(&AccessEvent::read(MatrixId::A, 0, 0, CacheLevel::None));
        model.apply(&AccessEvent::read(MatrixId::B, 0, 0, CacheLevel::None));
        model.apply(&AccessEvent::accumulate(MatrixId::C, 0, 0, CacheLevel::None));
        model.apply(&AccessEvent::accumulate(MatrixId::C, 0, 0, CacheLevel::None));

        assert_eq!(model.matrix(MatrixId::A).accesses(), 1);
        assert_eq!(model.matrix(MatrixId::C).accesses(), 2);
        let totals = model.totals();
        assert_eq!(totals.mem, 4);
        assert_eq!(totals.cache_hits(), 1);
        assert_eq!(totals.pct(totals.cache_hits()), 25);
    }

    #[test]
    fn totals_line_formats_like_the_summary() {
        let t = Totals {
            mem: 8,
            l1_hits: 2,
            l2_hits: 2,
            split_l1: true,
        };
        let line = t.to_string();
        assert!(line.starts_with("mem:8"));
        assert!(line.contains("L1 hits:2"));
        assert!(line.contains("cache hits:4"));
    }
}
