use crate::foundation::error::{MatvizError, MatvizResult};

/// Sizes of the multiplication: A is `m x k`, B is `k x n`, C is `m x n`.
///
/// Dimensions are fixed for a run and illustratively small; the animation
/// draws one grid cell per element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Dims {
    pub m: usize,
    pub n: usize,
    pub k: usize,
}

impl Dims {
    /// Create validated dimensions (all sides non-zero).
    pub fn new(m: usize, n: usize, k: usize) -> MatvizResult<Self> {
        if m == 0 || n == 0 || k == 0 {
            return Err(MatvizError::config("matrix dimensions must be > 0"));
        }
        Ok(Self { m, n, k })
    }

    /// Square dimensions of side `size`.
    pub fn square(size: usize) -> MatvizResult<Self> {
        Self::new(size, size, size)
    }
}

/// Absolute 0-based frame index in the event timeline.
///
/// One access event produces exactly one frame, so frame indices and event
/// indices coincide.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Which of the three matrices an access touches.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum MatrixId {
    A,
    B,
    C,
}

impl MatrixId {
    /// Display name used by the scene builder.
    pub fn name(self) -> &'static str {
        match self {
            MatrixId::A => "A",
            MatrixId::B => "B",
            MatrixId::C => "C",
        }
    }
}

/// The kind of touch an access event performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AccessKind {
    Read,
    Write,
    Accumulate,
}

/// Abstract cache residency label for an access.
///
/// This annotates which tiling depth currently "holds" the accessed block
/// for animation purposes; it is not a hardware cache query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CacheLevel {
    None,
    L2Block,
    L1Block,
}

/// One atomic touch of a matrix element.
///
/// Events are immutable once produced; their ordering is the entire
/// semantic payload of a simulation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AccessEvent {
    pub matrix: MatrixId,
    pub row: usize,
    pub col: usize,
    pub kind: AccessKind,
    pub level: CacheLevel,
}

impl AccessEvent {
    pub fn read(matrix: MatrixId, row: usize, col: usize, level: CacheLevel) -> Self {
        Self {
            matrix,
            row,
            col,
            kind: AccessKind::Read,
            level,
        }
    }

    pub fn accumulate(matrix: MatrixId, row: usize, col: usize, level: CacheLevel) -> Self {
        Self {
            matrix,
            row,
            col,
            kind: AccessKind::Accumulate,
            level,
        }
    }

    pub fn write(matrix: MatrixId, row: usize, col: usize, level: CacheLevel) -> Self {
        Self {
            matrix,
            row,
            col,
            kind: AccessKind::Write,
            level,
        }
    }
}
