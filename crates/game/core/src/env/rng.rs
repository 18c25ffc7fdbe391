//! RNG oracle for deterministic random number generation.
//!
//! Every random decision in a battle (tile spawns, shuffles, ability target
//! cells) draws from a single [`GameRng`] stream. The stream is a pure
//! function of `(seed, nonce)`, so a restored snapshot continues with the same
//! sequence the original session would have produced.

/// RNG oracle for deterministic random number generation.
///
/// Implementations must be deterministic and produce the same values
/// given the same seed.
pub trait RngOracle: Send + Sync {
    /// Generate a random u32 value from a seed.
    fn next_u32(&self, seed: u64) -> u32;

    /// Generate a random value in range [min, max] inclusive.
    fn range(&self, seed: u64, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        let range = max - min + 1;
        min + (self.next_u32(seed) % range)
    }
}

/// PCG random number generator (Permuted Congruential Generator).
///
/// Uses PCG-XSH-RR, which produces 32-bit output from 64-bit state.
///
/// - PCG paper: <https://www.pcg-random.org/>
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn pcg_step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    /// XSH-RR output permutation.
    #[inline]
    fn pcg_output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        let state = Self::pcg_step(seed);
        Self::pcg_output(state)
    }
}

/// Purpose of a draw, mixed into the seed so unrelated draws never share
/// a value even when they land on the same nonce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RollContext {
    TileSpawn = 0,
    Shuffle = 1,
    Ability = 2,
    Selection = 3,
    Provider = 4,
}

/// Compute deterministic seed from stream components.
///
/// * `game_seed` - Base seed set at battle start
/// * `nonce` - Draw sequence number (increments every draw)
/// * `context` - Purpose of the draw
pub fn compute_seed(game_seed: u64, nonce: u64, context: RollContext) -> u64 {
    // SplitMix64 / FxHash style mixing
    let mut hash = game_seed;
    hash ^= nonce.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= (context as u64).wrapping_mul(0x85ebca6b);

    // Final avalanche step
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;

    hash
}

/// Position of a [`GameRng`] stream; enough to resume it exactly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RngState {
    pub seed: u64,
    pub nonce: u64,
}

/// Seeded random stream used by the board and ability interpreter.
#[derive(Clone, Debug)]
pub struct GameRng {
    oracle: PcgRng,
    state: RngState,
}

impl GameRng {
    pub fn new(seed: u64) -> Self {
        Self::from_state(RngState { seed, nonce: 0 })
    }

    pub fn from_state(state: RngState) -> Self {
        Self {
            oracle: PcgRng,
            state,
        }
    }

    pub fn state(&self) -> RngState {
        self.state
    }

    pub fn next_u32(&mut self, context: RollContext) -> u32 {
        let seed = compute_seed(self.state.seed, self.state.nonce, context);
        self.state.nonce = self.state.nonce.wrapping_add(1);
        self.oracle.next_u32(seed)
    }

    /// Uniform value in `[0, bound)`; returns 0 when `bound` is 0.
    pub fn below(&mut self, context: RollContext, bound: usize) -> usize {
        if bound <= 1 {
            return 0;
        }
        let seed = compute_seed(self.state.seed, self.state.nonce, context);
        self.state.nonce = self.state.nonce.wrapping_add(1);
        self.oracle.range(seed, 0, (bound - 1) as u32) as usize
    }

    /// Uniform value in `[0, 1)`.
    pub fn unit(&mut self, context: RollContext) -> f64 {
        f64::from(self.next_u32(context)) / (f64::from(u32::MAX) + 1.0)
    }

    /// Fisher-Yates shuffle in place.
    pub fn shuffle<T>(&mut self, context: RollContext, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.below(context, i + 1);
            items.swap(i, j);
        }
    }

    /// `count` distinct indices from `0..len`, in draw order.
    ///
    /// Returns every index when `count >= len`.
    pub fn sample_distinct(&mut self, context: RollContext, len: usize, count: usize) -> Vec<usize> {
        let mut pool: Vec<usize> = (0..len).collect();
        let take = count.min(len);
        for i in 0..take {
            let j = i + self.below(context, len - i);
            pool.swap(i, j);
        }
        pool.truncate(take);
        pool
    }
}
