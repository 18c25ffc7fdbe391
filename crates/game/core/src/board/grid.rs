//! The N×N tile matrix and its gravity, refill, and shuffle algorithms.

use tracing::{debug, warn};

use super::matcher::{CellView, Match, MatchResolver, SwappedView};
use super::{Position, Tile, TileFall, TileId};
use crate::element::Element;
use crate::env::{GameRng, RollContext, TileSource};

/// Errors raised when building a grid from raw cell data.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("expected {expected} cells for a {size}x{size} board, got {actual}")]
    CellCount {
        size: u8,
        expected: usize,
        actual: usize,
    },
}

/// A legal swap together with the matches it would create.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PossibleMove {
    pub a: Position,
    pub b: Position,
    pub matches: Vec<Match>,
}

impl PossibleMove {
    /// Tiles across all matches; shared tiles count once per match.
    pub fn tile_count(&self) -> usize {
        self.matches.iter().map(Match::size).sum()
    }

    pub fn largest_match(&self) -> usize {
        self.matches.iter().map(Match::size).max().unwrap_or(0)
    }
}

/// Result of [`Grid::fill_board`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FillOutcome {
    pub attempts: u32,
    /// The attempt cap was hit and the region-refill fallback ran.
    pub used_fallback: bool,
    pub has_moves: bool,
}

/// Result of [`Grid::shuffle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShuffleOutcome {
    pub attempts: u32,
    pub has_moves: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    size: u8,
    cells: Vec<Option<Tile>>,
    next_tile_id: u32,
}

impl CellView for Grid {
    fn size(&self) -> u8 {
        self.size
    }

    fn element_at(&self, pos: Position) -> Option<Element> {
        self.tile(pos).map(|tile| tile.element)
    }
}

impl Grid {
    /// An empty board awaiting [`Grid::fill_board`].
    pub fn new(size: u8) -> Self {
        Self {
            size,
            cells: vec![None; usize::from(size) * usize::from(size)],
            next_tile_id: 0,
        }
    }

    /// Builds a board from row-major cell contents.
    pub fn from_elements(
        size: u8,
        elements: impl IntoIterator<Item = Option<Element>>,
    ) -> Result<Self, GridError> {
        let elements: Vec<Option<Element>> = elements.into_iter().collect();
        let expected = usize::from(size) * usize::from(size);
        if elements.len() != expected {
            return Err(GridError::CellCount {
                size,
                expected,
                actual: elements.len(),
            });
        }
        let mut grid = Self::new(size);
        for (index, element) in elements.into_iter().enumerate() {
            if let Some(element) = element {
                let pos = grid.position_of(index);
                grid.place(pos, element);
            }
        }
        Ok(grid)
    }

    pub fn size(&self) -> u8 {
        self.size
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.size && pos.col < self.size
    }

    fn index(&self, pos: Position) -> usize {
        usize::from(pos.row) * usize::from(self.size) + usize::from(pos.col)
    }

    fn position_of(&self, index: usize) -> Position {
        let size = usize::from(self.size);
        Position::new((index / size) as u8, (index % size) as u8)
    }

    pub fn tile(&self, pos: Position) -> Option<&Tile> {
        if !self.contains(pos) {
            return None;
        }
        self.cells[self.index(pos)].as_ref()
    }

    pub fn element_at(&self, pos: Position) -> Option<Element> {
        CellView::element_at(self, pos)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.cells.iter().flatten()
    }

    /// Row-major cell contents.
    pub fn elements(&self) -> Vec<Option<Element>> {
        self.cells
            .iter()
            .map(|cell| cell.map(|tile| tile.element))
            .collect()
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.cells.len()).map(|index| self.position_of(index))
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    pub fn empty_positions(&self) -> Vec<Position> {
        self.positions()
            .filter(|pos| self.tile(*pos).is_none())
            .collect()
    }

    /// Creates a new tile at `pos`, replacing whatever was there.
    pub fn place(&mut self, pos: Position, element: Element) -> TileId {
        let id = TileId(self.next_tile_id);
        self.next_tile_id += 1;
        let index = self.index(pos);
        self.cells[index] = Some(Tile {
            id,
            element,
            row: pos.row,
            col: pos.col,
            matched: false,
        });
        id
    }

    /// Changes the element of an existing tile in place.
    pub fn retype(&mut self, pos: Position, element: Element) -> bool {
        if !self.contains(pos) {
            return false;
        }
        let index = self.index(pos);
        match self.cells[index].as_mut() {
            Some(tile) => {
                tile.element = element;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, pos: Position) -> Option<Tile> {
        if !self.contains(pos) {
            return None;
        }
        let index = self.index(pos);
        self.cells[index].take()
    }

    /// Exchanges two cells; both positions must be on the board.
    pub fn swap(&mut self, a: Position, b: Position) {
        let (ia, ib) = (self.index(a), self.index(b));
        self.cells.swap(ia, ib);
        self.relocate(ia);
        self.relocate(ib);
    }

    fn relocate(&mut self, index: usize) {
        let pos = self.position_of(index);
        if let Some(tile) = self.cells[index].as_mut() {
            tile.row = pos.row;
            tile.col = pos.col;
        }
    }

    // ========================================================================
    // Match bookkeeping
    // ========================================================================

    /// Flags tiles at `positions` as matched.
    ///
    /// Returns only the tiles that were not already flagged, so marking the
    /// same cells twice is a no-op.
    pub fn mark_matched(&mut self, positions: impl IntoIterator<Item = Position>) -> Vec<Tile> {
        let mut newly = Vec::new();
        for pos in positions {
            if !self.contains(pos) {
                continue;
            }
            let index = self.index(pos);
            if let Some(tile) = self.cells[index].as_mut()
                && !tile.matched
            {
                tile.matched = true;
                newly.push(*tile);
            }
        }
        newly
    }

    /// Removes every flagged tile.
    pub fn remove_matched(&mut self) -> Vec<Tile> {
        let mut removed = Vec::new();
        for cell in &mut self.cells {
            if cell.is_some_and(|tile| tile.matched)
                && let Some(tile) = cell.take()
            {
                removed.push(tile);
            }
        }
        removed
    }

    // ========================================================================
    // Gravity and refill
    // ========================================================================

    /// Per column, settles every tile onto the lowest free cell below it.
    ///
    /// Tile count per column is preserved; empties end up on top.
    pub fn collapse(&mut self) -> Vec<TileFall> {
        let mut falls = Vec::new();
        for col in 0..self.size {
            let mut write = self.size;
            for row in (0..self.size).rev() {
                let from = Position::new(row, col);
                if self.tile(from).is_none() {
                    continue;
                }
                write -= 1;
                if write != row {
                    let to = Position::new(write, col);
                    let index_from = self.index(from);
                    let index_to = self.index(to);
                    self.cells.swap(index_from, index_to);
                    self.relocate(index_to);
                    if let Some(tile) = self.cells[index_to] {
                        falls.push(TileFall {
                            id: tile.id,
                            from,
                            to,
                        });
                    }
                }
            }
        }
        falls
    }

    /// Fills every empty cell with a new tile. No match avoidance.
    pub fn refill(&mut self, source: &mut dyn TileSource) -> Vec<Tile> {
        let mut spawned = Vec::new();
        for pos in self.empty_positions() {
            let element = source.next_element();
            self.place(pos, element);
            if let Some(tile) = self.tile(pos) {
                spawned.push(*tile);
            }
        }
        spawned
    }

    /// Whether placing `element` at `pos` would complete a run with the
    /// tiles already on the board.
    ///
    /// For a minimum of three this covers the four configurations: two to the
    /// left, two above, sandwiched horizontally, sandwiched vertically.
    pub fn would_create_match(&self, pos: Position, element: Element, min_match_size: u8) -> bool {
        let same = |row: i16, col: i16| {
            if row < 0 || col < 0 {
                return false;
            }
            self.element_at(Position::new(row as u8, col as u8)) == Some(element)
        };
        let run = |dr: i16, dc: i16| {
            let mut length = 0u8;
            let (mut row, mut col) = (i16::from(pos.row) + dr, i16::from(pos.col) + dc);
            while same(row, col) {
                length += 1;
                row += dr;
                col += dc;
            }
            length
        };
        let horizontal = run(0, -1) + run(0, 1) + 1;
        let vertical = run(-1, 0) + run(1, 0) + 1;
        horizontal >= min_match_size || vertical >= min_match_size
    }

    /// Populates every empty cell.
    ///
    /// With `avoid_initial_matches` each placement is re-rolled while it would
    /// complete a run. A finished fill without possible moves is discarded and
    /// retried, up to `max_attempts`; after that a small region is re-rolled
    /// until the board has a move or the cap is spent again.
    pub fn fill_board(
        &mut self,
        source: &mut dyn TileSource,
        resolver: &MatchResolver,
        avoid_initial_matches: bool,
        max_attempts: u32,
        rng: &mut GameRng,
    ) -> FillOutcome {
        let targets = self.empty_positions();
        let max_attempts = max_attempts.max(1);

        for attempt in 1..=max_attempts {
            for pos in &targets {
                self.remove(*pos);
            }
            self.fill_positions(&targets, source, resolver, avoid_initial_matches, max_attempts);
            if self.has_possible_moves(resolver) {
                debug!(attempt, "board filled");
                return FillOutcome {
                    attempts: attempt,
                    used_fallback: false,
                    has_moves: true,
                };
            }
        }

        warn!(max_attempts, "fill retry cap reached; re-rolling a region");
        let has_moves =
            self.reroll_regions(source, resolver, avoid_initial_matches, max_attempts, rng);
        FillOutcome {
            attempts: max_attempts,
            used_fallback: true,
            has_moves,
        }
    }

    fn fill_positions(
        &mut self,
        targets: &[Position],
        source: &mut dyn TileSource,
        resolver: &MatchResolver,
        avoid_initial_matches: bool,
        max_attempts: u32,
    ) {
        let min = resolver.min_match_size();
        for pos in targets {
            let mut element = source.next_element();
            if avoid_initial_matches {
                let mut rolls = 1;
                while self.would_create_match(*pos, element, min) && rolls < max_attempts {
                    element = source.next_element();
                    rolls += 1;
                }
                if self.would_create_match(*pos, element, min)
                    && let Some(safe) = Element::ALL
                        .into_iter()
                        .find(|candidate| !self.would_create_match(*pos, *candidate, min))
                {
                    element = safe;
                }
            }
            self.place(*pos, element);
        }
    }

    fn reroll_regions(
        &mut self,
        source: &mut dyn TileSource,
        resolver: &MatchResolver,
        avoid_initial_matches: bool,
        max_attempts: u32,
        rng: &mut GameRng,
    ) -> bool {
        let span = resolver.min_match_size().min(self.size);
        let origins = usize::from(self.size - span) + 1;
        for _ in 0..max_attempts {
            let top = rng.below(RollContext::Shuffle, origins) as u8;
            let left = rng.below(RollContext::Shuffle, origins) as u8;
            let region: Vec<Position> = (top..top + span)
                .flat_map(|row| (left..left + span).map(move |col| Position::new(row, col)))
                .collect();
            for pos in &region {
                self.remove(*pos);
            }
            self.fill_positions(&region, source, resolver, avoid_initial_matches, max_attempts);
            if self.has_possible_moves(resolver) {
                return true;
            }
        }
        warn!("region re-roll exhausted; board left without moves");
        false
    }

    // ========================================================================
    // Move discovery
    // ========================================================================

    /// Right and down neighbor swaps of every occupied cell, evaluated without
    /// mutating the grid.
    pub fn possible_moves(&self, resolver: &MatchResolver) -> Vec<PossibleMove> {
        let mut moves = Vec::new();
        self.for_each_candidate_swap(|a, b| {
            let view = SwappedView::new(self, a, b);
            let mut matches = resolver.scan_at(&view, a);
            matches.extend(resolver.scan_at(&view, b));
            if !matches.is_empty() {
                moves.push(PossibleMove { a, b, matches });
            }
            true
        });
        moves
    }

    /// Stops at the first swap that would produce a match.
    pub fn has_possible_moves(&self, resolver: &MatchResolver) -> bool {
        let mut found = false;
        self.for_each_candidate_swap(|a, b| {
            let view = SwappedView::new(self, a, b);
            found = resolver.has_match_at(&view, a) || resolver.has_match_at(&view, b);
            !found
        });
        found
    }

    /// Calls `visit` for each occupied right/down pair until it returns false.
    fn for_each_candidate_swap(&self, mut visit: impl FnMut(Position, Position) -> bool) {
        for pos in self.positions() {
            if self.tile(pos).is_none() {
                continue;
            }
            for neighbor in [pos.right(), pos.below()] {
                if self.tile(neighbor).is_some() && !visit(pos, neighbor) {
                    return;
                }
            }
        }
    }

    // ========================================================================
    // Shuffle
    // ========================================================================

    /// Redistributes the existing tiles over the occupied cells.
    ///
    /// Prefers an arrangement that has a move and no standing match; after the
    /// cap it settles for the last arrangement that has a move.
    pub fn shuffle(
        &mut self,
        rng: &mut GameRng,
        resolver: &MatchResolver,
        max_attempts: u32,
    ) -> ShuffleOutcome {
        let positions: Vec<Position> = self
            .positions()
            .filter(|pos| self.tile(*pos).is_some())
            .collect();
        let mut tiles: Vec<Tile> = positions.iter().filter_map(|pos| self.remove(*pos)).collect();
        let max_attempts = max_attempts.max(1);
        let mut fallback: Option<Vec<Tile>> = None;

        for attempt in 1..=max_attempts {
            rng.shuffle(RollContext::Shuffle, &mut tiles);
            self.lay_out(&positions, &tiles);
            if self.has_possible_moves(resolver) {
                if resolver.scan_all(&*self).is_empty() {
                    return ShuffleOutcome {
                        attempts: attempt,
                        has_moves: true,
                    };
                }
                fallback = Some(tiles.clone());
            }
            for pos in &positions {
                self.remove(*pos);
            }
        }

        match fallback {
            Some(arrangement) => {
                warn!(max_attempts, "shuffle cap reached; keeping arrangement with standing matches");
                self.lay_out(&positions, &arrangement);
                ShuffleOutcome {
                    attempts: max_attempts,
                    has_moves: true,
                }
            }
            None => {
                warn!(max_attempts, "shuffle cap reached without any possible move");
                self.lay_out(&positions, &tiles);
                ShuffleOutcome {
                    attempts: max_attempts,
                    has_moves: false,
                }
            }
        }
    }

    fn lay_out(&mut self, positions: &[Position], tiles: &[Tile]) {
        for (pos, tile) in positions.iter().zip(tiles) {
            let index = self.index(*pos);
            self.cells[index] = Some(Tile {
                row: pos.row,
                col: pos.col,
                ..*tile
            });
        }
    }
}
