//! Sources of freshly spawned tile elements.

use std::collections::VecDeque;

use super::rng::{GameRng, RollContext};
use crate::element::{Element, ElementWeights};

/// Supplies the element of each tile created by fill or refill.
pub trait TileSource {
    fn next_element(&mut self) -> Element;
}

/// Weighted random spawns drawn from the battle RNG stream.
pub struct WeightedTiles<'a> {
    rng: &'a mut GameRng,
    weights: &'a ElementWeights,
}

impl<'a> WeightedTiles<'a> {
    pub fn new(rng: &'a mut GameRng, weights: &'a ElementWeights) -> Self {
        Self { rng, weights }
    }
}

impl TileSource for WeightedTiles<'_> {
    fn next_element(&mut self) -> Element {
        let roll = self.rng.unit(RollContext::TileSpawn);
        self.weights.pick(roll)
    }
}

/// Replays a fixed element sequence, starting over once exhausted.
///
/// Useful to build exact boards and cascades in tests and tools.
#[derive(Clone, Debug)]
pub struct ScriptedTiles {
    script: Vec<Element>,
    pending: VecDeque<Element>,
}

impl ScriptedTiles {
    /// An empty script yields [`Element::Berry`] forever.
    pub fn new(script: impl IntoIterator<Item = Element>) -> Self {
        let script: Vec<Element> = script.into_iter().collect();
        let pending = script.iter().copied().collect();
        Self { script, pending }
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl TileSource for ScriptedTiles {
    fn next_element(&mut self) -> Element {
        if self.pending.is_empty() {
            self.pending.extend(self.script.iter().copied());
        }
        self.pending.pop_front().unwrap_or(Element::Berry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_tiles_replay_then_cycle() {
        let mut source = ScriptedTiles::new([Element::Fire, Element::Water]);
        assert_eq!(source.next_element(), Element::Fire);
        assert_eq!(source.next_element(), Element::Water);
        assert_eq!(source.remaining(), 0);
        assert_eq!(source.next_element(), Element::Fire);
    }

    #[test]
    fn weighted_tiles_respect_zero_weights() {
        let mut rng = GameRng::new(21);
        let weights = ElementWeights {
            fire: 0.0,
            water: 0.0,
            earth: 1.0,
            electric: 0.0,
            psychic: 0.0,
            berry: 0.0,
        };
        let mut source = WeightedTiles::new(&mut rng, &weights);
        for _ in 0..100 {
            assert_eq!(source.next_element(), Element::Earth);
        }
    }
}
