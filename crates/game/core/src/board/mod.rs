//! Match-3 board: tile grid, match detection, cascades, and swap validation.
//!
//! - [`Grid`] owns every [`Tile`] and implements gravity, refill, and shuffle
//! - [`MatchResolver`] scans any [`CellView`] for runs
//! - [`CascadeEngine`] drives the resolve → collapse → refill loop one phase at a time
//! - [`SwapController`] is the only gate deciding whether a swap is a legal move
mod cascade;
mod grid;
mod matcher;
mod position;
mod swap;
mod tile;

pub use cascade::{Cascade, CascadeEngine, CascadePhase, CascadeReport, CascadeStep};
pub use grid::{FillOutcome, Grid, GridError, PossibleMove, ShuffleOutcome};
pub use matcher::{CellView, Match, MatchResolver, Orientation, SwappedView};
pub use position::Position;
pub use swap::{SwapController, SwapError, SwapResult};
pub use tile::{Tile, TileFall, TileId};
