//! Deterministic sources of randomness consumed by the board and battle.
//!
//! The board never reaches for a global RNG: fills, refills, shuffles, and
//! ability target cells all draw from a seeded [`GameRng`] stream or from an
//! injected [`TileSource`].
mod rng;
mod tiles;

pub use rng::{GameRng, PcgRng, RngOracle, RngState, RollContext, compute_seed};
pub use tiles::{ScriptedTiles, TileSource, WeightedTiles};
