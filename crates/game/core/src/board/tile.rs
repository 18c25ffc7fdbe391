use core::fmt;

use super::Position;
use crate::element::Element;

/// Stable identity of a tile for its whole life on the board.
///
/// Presentation layers key sprites by this id so falls and shuffles can be
/// animated as moves rather than respawns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileId(pub u32);

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tile#{}", self.0)
    }
}

/// A tile owned by the grid. `row`/`col` always equal the cell holding it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tile {
    pub id: TileId,
    pub element: Element,
    pub row: u8,
    pub col: u8,
    /// Set once included in a resolved match; such a tile is about to leave the grid.
    pub matched: bool,
}

impl Tile {
    pub const fn position(&self) -> Position {
        Position::new(self.row, self.col)
    }
}

/// A tile relocated by gravity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileFall {
    pub id: TileId,
    pub from: Position,
    pub to: Position,
}
