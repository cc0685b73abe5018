//! The traversal simulator: deterministic, lazy access-event sequences for
//! each matrix-multiplication variant.
//!
//! Each variant is a separate order generator producing `(i, j, k)` steps;
//! all four share one expansion primitive that turns a step into its
//! events. The sequence is produced on demand and never materialized;
//! calling [`Traversal::events`] again restarts an identical sequence.

use crate::foundation::core::{AccessEvent, CacheLevel, Dims, MatrixId};
use crate::foundation::error::{MatvizError, MatvizResult};
use crate::tiling::{Span, spans, subspans};

/// Traversal strategy plus its blocking parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Variant {
    /// Textbook i-j-k loops; B is walked down columns, the poor-locality
    /// baseline the animation is meant to expose.
    Naive,
    /// Same loop nest with B stored transposed, so the inner loop walks
    /// both operands contiguously. Event order is identical to naive; the
    /// difference lives in the storage address mapping.
    Transposed,
    /// Single-level tiling of side `block1` over all three loop
    /// dimensions, with an optional `l1` sub-partition inside each tile.
    Blocked { block1: usize, l1: Option<usize> },
    /// Two-level tiling: outer tiles of side `block2`, inner tiles of
    /// side `block1`.
    Blocked2 { block1: usize, block2: usize },
}

impl Variant {
    pub fn validate(&self) -> MatvizResult<()> {
        let check = |name: &str, v: usize| {
            if v == 0 {
                Err(MatvizError::config(format!("{name} must be > 0")))
            } else {
                Ok(())
            }
        };
        match self {
            Variant::Naive | Variant::Transposed => Ok(()),
            Variant::Blocked { block1, l1 } => {
                check("block1", *block1)?;
                if let Some(l1) = l1 {
                    check("l1 sub-block", *l1)?;
                }
                Ok(())
            }
            Variant::Blocked2 { block1, block2 } => {
                check("block1", *block1)?;
                check("block2", *block2)
            }
        }
    }

    /// Whether B's storage is treated as transposed.
    pub fn transposed_b(&self) -> bool {
        matches!(self, Variant::Transposed)
    }

    /// The tile side associated with a residency level, if the variant
    /// tiles at that level. The renderer uses this to outline the block
    /// holding the last access.
    pub fn block_side(&self, level: CacheLevel) -> Option<usize> {
        match (self, level) {
            (Variant::Blocked { block1, .. }, CacheLevel::L2Block) => Some(*block1),
            (Variant::Blocked { l1, .. }, CacheLevel::L1Block) => *l1,
            (Variant::Blocked2 { block2, .. }, CacheLevel::L2Block) => Some(*block2),
            (Variant::Blocked2 { block1, .. }, CacheLevel::L1Block) => Some(*block1),
            _ => None,
        }
    }
}

/// One scalar position of the loop nest, annotated with the residency
/// level of the innermost active tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Step {
    i: usize,
    j: usize,
    k: usize,
    level: CacheLevel,
}

/// A validated traversal, ready to generate its event sequence.
#[derive(Clone, Copy, Debug)]
pub struct Traversal {
    dims: Dims,
    variant: Variant,
}

impl Traversal {
    pub fn new(dims: Dims, variant: Variant) -> MatvizResult<Self> {
        Dims::new(dims.m, dims.n, dims.k)?;
        variant.validate()?;
        Ok(Self { dims, variant })
    }

    pub fn dims(&self) -> Dims {
        self.dims
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Total number of events the sequence will produce: for each of the
    /// `m * n` output cells, `k` read-pairs, `k` accumulates and one
    /// terminal write.
    pub fn event_count(&self) -> u64 {
        let Dims { m, n, k } = self.dims;
        (m as u64) * (n as u64) * (3 * k as u64 + 1)
    }

    /// The lazy event sequence. Every call restarts an identical,
    /// deterministic sequence; the consumer may stop pulling early.
    pub fn events(&self) -> impl Iterator<Item = AccessEvent> {
        let k_last = self.dims.k - 1;
        self.steps().flat_map(move |s| expand(s, k_last))
    }

    fn steps(&self) -> Box<dyn Iterator<Item = Step>> {
        match self.variant {
            Variant::Naive => Box::new(naive_order(self.dims)),
            Variant::Transposed => Box::new(transposed_order(self.dims)),
            Variant::Blocked { block1, l1 } => Box::new(blocked_order(self.dims, block1, l1)),
            Variant::Blocked2 { block1, block2 } => {
                Box::new(blocked2_order(self.dims, block1, block2))
            }
        }
    }
}

/// Expand one loop-nest step into its access events: read the operand
/// pair, accumulate into the output cell, and write the cell after its
/// final k. This primitive is the only thing the variants share.
fn expand(s: Step, k_last: usize) -> impl Iterator<Item = AccessEvent> {
    let Step { i, j, k, level } = s;
    let write = (k == k_last).then(|| AccessEvent::write(MatrixId::C, i, j, level));
    [
        AccessEvent::read(MatrixId::A, i, k, level),
        AccessEvent::read(MatrixId::B, k, j, level),
        AccessEvent::accumulate(MatrixId::C, i, j, level),
    ]
    .into_iter()
    .chain(write)
}

fn naive_order(d: Dims) -> impl Iterator<Item = Step> {
    (0..d.m).flat_map(move |i| {
        (0..d.n).flat_map(move |j| {
            (0..d.k).map(move |k| Step {
                i,
                j,
                k,
                level: CacheLevel::None,
            })
        })
    })
}

fn transposed_order(d: Dims) -> impl Iterator<Item = Step> {
    // The loop nest is the naive one; transposition only changes how B's
    // elements map to storage, which the cache model applies downstream.
    naive_order(d)
}

fn blocked_order(d: Dims, block1: usize, l1: Option<usize>) -> impl Iterator<Item = Step> {
    let level = if l1.is_some() {
        CacheLevel::L1Block
    } else {
        CacheLevel::L2Block
    };
    let sub = l1.unwrap_or(block1);
    spans(d.m, block1).flat_map(move |bi| {
        spans(d.n, block1)
            .flat_map(move |bj| spans(d.k, block1).flat_map(move |bk| tile_order(bi, bj, bk, sub, level)))
    })
}

fn blocked2_order(d: Dims, block1: usize, block2: usize) -> impl Iterator<Item = Step> {
    spans(d.m, block2).flat_map(move |oi| {
        spans(d.n, block2).flat_map(move |oj| {
            spans(d.k, block2)
                .flat_map(move |ok| tile_order(oi, oj, ok, block1, CacheLevel::L1Block))
        })
    })
}

/// Sub-tile a `(bi, bj, bk)` tile at side `sub`, then walk each sub-tile
/// in the naive scalar order.
fn tile_order(
    bi: Span,
    bj: Span,
    bk: Span,
    sub: usize,
    level: CacheLevel,
) -> impl Iterator<Item = Step> {
    subspans(bi, sub).flat_map(move |si| {
        subspans(bj, sub)
            .flat_map(move |sj| subspans(bk, sub).flat_map(move |sk| scalar_order(si, sj, sk, level)))
    })
}

fn scalar_order(si: Span, sj: Span, sk: Span, level: CacheLevel) -> impl Iterator<Item = Step> {
    si.range().flat_map(move |i| {
        sj.range()
            .flat_map(move |j| sk.range().map(move |k| Step { i, j, k, level }))
    })
}
