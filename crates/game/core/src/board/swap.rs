use super::matcher::{Match, MatchResolver};
use super::{Grid, Position};
use crate::error::{ErrorSeverity, GameError};

/// Swap requests rejected before touching the grid.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SwapError {
    #[error("position {0} is outside the board")]
    OutOfBounds(Position),

    #[error("positions {a} and {b} are not adjacent")]
    NotAdjacent { a: Position, b: Position },

    #[error("cell {0} is empty")]
    EmptyCell(Position),
}

impl GameError for SwapError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::OutOfBounds(_) => "SWAP_OUT_OF_BOUNDS",
            Self::NotAdjacent { .. } => "SWAP_NOT_ADJACENT",
            Self::EmptyCell(_) => "SWAP_EMPTY_CELL",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SwapResult {
    /// The swap stays; the caller must run the cascade next.
    Accepted { matches: Vec<Match> },
    /// No match at either cell; the swap was rolled back.
    Rejected,
}

impl SwapResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SwapResult::Accepted { .. })
    }
}

/// Decides whether a swap becomes a move.
#[derive(Clone, Copy, Debug)]
pub struct SwapController;

impl SwapController {
    /// Checks a request without mutating anything.
    pub fn validate(grid: &Grid, a: Position, b: Position) -> Result<(), SwapError> {
        for pos in [a, b] {
            if !grid.contains(pos) {
                return Err(SwapError::OutOfBounds(pos));
            }
        }
        if !a.is_adjacent(&b) {
            return Err(SwapError::NotAdjacent { a, b });
        }
        for pos in [a, b] {
            if grid.tile(pos).is_none() {
                return Err(SwapError::EmptyCell(pos));
            }
        }
        Ok(())
    }

    /// Swaps, scans both cells, and rolls back when neither is in a match.
    pub fn attempt_swap(
        grid: &mut Grid,
        resolver: &MatchResolver,
        a: Position,
        b: Position,
    ) -> Result<SwapResult, SwapError> {
        Self::validate(grid, a, b)?;

        grid.swap(a, b);
        let mut matches = resolver.scan_at(&*grid, a);
        matches.extend(resolver.scan_at(&*grid, b));

        if matches.is_empty() {
            grid.swap(a, b);
            return Ok(SwapResult::Rejected);
        }
        Ok(SwapResult::Accepted { matches })
    }
}
