//! Cascade state machine: resolve → collapse → refill → resolve … → idle.
//!
//! A [`Cascade`] advances exactly one phase per [`CascadeEngine::advance`]
//! call, so a driver can wait for presentation to settle between phases.
//! [`CascadeEngine::run_cascade`] is the synchronous driver.

use tracing::{debug, warn};

use super::matcher::{Match, MatchResolver};
use super::{Grid, Position, Tile, TileFall};
use crate::element::ElementCounts;
use crate::env::TileSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum CascadePhase {
    Idle,
    Resolving,
    Collapsing,
    Refilling,
}

/// Reward metadata accumulated over one or more resolve rounds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CascadeReport {
    pub total_matches: u32,
    /// Tiles removed per element; a tile shared by two matches counts once.
    pub per_element: ElementCounts,
    pub largest_match_size: u8,
    pub granted_extra_move: bool,
    pub cascade_rounds: u32,
}

impl CascadeReport {
    pub fn total_tiles(&self) -> u32 {
        self.per_element.total()
    }

    pub fn absorb(&mut self, other: &CascadeReport) {
        self.total_matches += other.total_matches;
        self.per_element.merge(&other.per_element);
        self.largest_match_size = self.largest_match_size.max(other.largest_match_size);
        self.granted_extra_move |= other.granted_extra_move;
        self.cascade_rounds += other.cascade_rounds;
    }
}

/// What one [`CascadeEngine::advance`] call did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CascadeStep {
    /// Matches were found, flagged, and removed.
    Resolved {
        round: u32,
        matches: Vec<Match>,
        removed: Vec<Tile>,
        /// This round only.
        report: CascadeReport,
    },
    Collapsed {
        falls: Vec<TileFall>,
    },
    Refilled {
        spawned: Vec<Tile>,
    },
    /// No further matches; the cascade is idle.
    Finished {
        report: CascadeReport,
    },
}

/// One active cascade session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cascade {
    phase: CascadePhase,
    forced: Option<Vec<Position>>,
    report: CascadeReport,
}

impl Cascade {
    pub fn phase(&self) -> CascadePhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == CascadePhase::Idle
    }

    /// Totals so far.
    pub fn report(&self) -> &CascadeReport {
        &self.report
    }
}

/// Rules shared by every cascade of a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CascadeEngine {
    resolver: MatchResolver,
    extra_move_match_size: u8,
    max_rounds: u32,
}

impl CascadeEngine {
    pub const fn new(resolver: MatchResolver, extra_move_match_size: u8, max_rounds: u32) -> Self {
        Self {
            resolver,
            extra_move_match_size,
            max_rounds,
        }
    }

    pub const fn resolver(&self) -> &MatchResolver {
        &self.resolver
    }

    /// A session that begins by scanning the board.
    pub fn start(&self) -> Cascade {
        Cascade {
            phase: CascadePhase::Resolving,
            forced: None,
            report: CascadeReport::default(),
        }
    }

    /// A session whose first round clears `positions` regardless of matches.
    ///
    /// Forced tiles feed the per-element counts but are not matches, so they
    /// never grant the extra move by themselves.
    pub fn start_forced(&self, positions: Vec<Position>) -> Cascade {
        Cascade {
            phase: CascadePhase::Resolving,
            forced: Some(positions),
            report: CascadeReport::default(),
        }
    }

    /// Flags and removes the tiles of `matches`.
    ///
    /// Cells already removed or flagged contribute nothing, and a match with no
    /// newly flagged tile is not counted, so replaying the same list is a no-op.
    pub fn resolve(&self, grid: &mut Grid, matches: &[Match]) -> (CascadeReport, Vec<Tile>) {
        let mut report = CascadeReport::default();
        for found in matches {
            let newly = grid.mark_matched(found.positions.iter().copied());
            for tile in &newly {
                report.per_element.add(tile.element, 1);
            }
            let shared = found
                .positions
                .iter()
                .any(|pos| grid.tile(*pos).is_some_and(|t| t.matched));
            if newly.is_empty() && !shared {
                continue;
            }
            report.total_matches += 1;
            let size = found.size() as u8;
            report.largest_match_size = report.largest_match_size.max(size);
            if size >= self.extra_move_match_size {
                report.granted_extra_move = true;
            }
        }
        let removed = grid.remove_matched();
        (report, removed)
    }

    /// Advances `cascade` by one phase.
    pub fn advance(
        &self,
        cascade: &mut Cascade,
        grid: &mut Grid,
        source: &mut dyn TileSource,
    ) -> CascadeStep {
        match cascade.phase {
            CascadePhase::Idle => CascadeStep::Finished {
                report: cascade.report.clone(),
            },
            CascadePhase::Resolving => {
                if cascade.report.cascade_rounds >= self.max_rounds {
                    warn!(
                        rounds = cascade.report.cascade_rounds,
                        "cascade safety cap reached; leaving standing matches"
                    );
                    return self.finish(cascade);
                }

                let (matches, mut report, removed) = match cascade.forced.take() {
                    Some(positions) => {
                        let removed_flagged = grid.mark_matched(positions);
                        let mut report = CascadeReport::default();
                        for tile in &removed_flagged {
                            report.per_element.add(tile.element, 1);
                        }
                        let removed = grid.remove_matched();
                        (Vec::new(), report, removed)
                    }
                    None => {
                        let matches = self.resolver.scan_all(&*grid);
                        if matches.is_empty() {
                            return self.finish(cascade);
                        }
                        let (report, removed) = self.resolve(grid, &matches);
                        (matches, report, removed)
                    }
                };

                if removed.is_empty() {
                    return self.finish(cascade);
                }

                report.cascade_rounds = 1;
                cascade.report.absorb(&report);
                cascade.phase = CascadePhase::Collapsing;
                debug!(
                    round = cascade.report.cascade_rounds,
                    matches = matches.len(),
                    tiles = removed.len(),
                    "cascade round resolved"
                );
                CascadeStep::Resolved {
                    round: cascade.report.cascade_rounds,
                    matches,
                    removed,
                    report,
                }
            }
            CascadePhase::Collapsing => {
                cascade.phase = CascadePhase::Refilling;
                CascadeStep::Collapsed {
                    falls: grid.collapse(),
                }
            }
            CascadePhase::Refilling => {
                cascade.phase = CascadePhase::Resolving;
                CascadeStep::Refilled {
                    spawned: grid.refill(source),
                }
            }
        }
    }

    fn finish(&self, cascade: &mut Cascade) -> CascadeStep {
        cascade.phase = CascadePhase::Idle;
        CascadeStep::Finished {
            report: cascade.report.clone(),
        }
    }

    /// Runs a fresh cascade to completion.
    pub fn run_cascade(&self, grid: &mut Grid, source: &mut dyn TileSource) -> CascadeReport {
        let mut cascade = self.start();
        loop {
            if let CascadeStep::Finished { report } = self.advance(&mut cascade, grid, source) {
                return report;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::test_support::grid_from;
    use crate::element::Element;
    use crate::env::ScriptedTiles;

    fn engine() -> CascadeEngine {
        CascadeEngine::new(MatchResolver::new(3), 4, 64)
    }

    #[test]
    fn two_round_cascade_reports_both_rounds() {
        // Round 1 clears the three fire tiles on row 0. The refill drops three
        // water tiles next to the water on row 0 column 3, making a run of 4.
        let mut grid = grid_from(&[
            "FFFWEZ", //
            "EZPBZP", //
            "ZPBEPB", //
            "PBEZBE", //
            "BEZPEZ", //
            "EZPBZP", //
        ]);
        let mut source = ScriptedTiles::new([
            Element::Water,
            Element::Water,
            Element::Water,
            // fillers used if anything else empties
            Element::Psychic,
            Element::Earth,
            Element::Electric,
            Element::Berry,
        ]);
        let report = engine().run_cascade(&mut grid, &mut source);

        assert_eq!(report.cascade_rounds, 2);
        assert_eq!(report.total_matches, 2);
        assert_eq!(report.per_element.get(Element::Fire), 3);
        assert_eq!(report.per_element.get(Element::Water), 4);
        assert_eq!(report.largest_match_size, 4);
        assert!(report.granted_extra_move);
        assert!(grid.is_full());
    }

    #[test]
    fn phases_advance_in_order() {
        let mut grid = grid_from(&["FFFW", "EZPB", "ZPBE", "PBEZ"]);
        let mut source = ScriptedTiles::new([Element::Earth, Element::Psychic, Element::Berry]);
        let engine = engine();
        let mut cascade = engine.start();

        assert_eq!(cascade.phase(), CascadePhase::Resolving);
        assert!(matches!(
            engine.advance(&mut cascade, &mut grid, &mut source),
            CascadeStep::Resolved { round: 1, .. }
        ));
        assert_eq!(cascade.phase(), CascadePhase::Collapsing);
        assert!(matches!(
            engine.advance(&mut cascade, &mut grid, &mut source),
            CascadeStep::Collapsed { .. }
        ));
        assert_eq!(cascade.phase(), CascadePhase::Refilling);
        assert!(matches!(
            engine.advance(&mut cascade, &mut grid, &mut source),
            CascadeStep::Refilled { spawned } if spawned.len() == 3
        ));
        assert_eq!(cascade.phase(), CascadePhase::Resolving);
        assert!(matches!(
            engine.advance(&mut cascade, &mut grid, &mut source),
            CascadeStep::Finished { .. }
        ));
        assert!(cascade.is_idle());
    }

    #[test]
    fn resolving_same_matches_twice_does_not_double_count() {
        let mut grid = grid_from(&["FFFW", "EZPB", "ZPBE", "PBEZ"]);
        let engine = engine();
        let matches = engine.resolver().scan_all(&grid);
        let (first, removed) = engine.resolve(&mut grid, &matches);
        assert_eq!(first.per_element.get(Element::Fire), 3);
        assert_eq!(removed.len(), 3);

        let (second, removed) = engine.resolve(&mut grid, &matches);
        assert_eq!(second, CascadeReport::default());
        assert!(removed.is_empty());
    }

    #[test]
    fn shared_tile_counts_once() {
        let mut grid = grid_from(&["FFFW", "FZPB", "FPBE", "PBEZ"]);
        let engine = engine();
        let matches = engine.resolver().scan_all(&grid);
        assert_eq!(matches.len(), 2);
        let (report, removed) = engine.resolve(&mut grid, &matches);
        assert_eq!(report.total_matches, 2);
        assert_eq!(report.per_element.get(Element::Fire), 5);
        assert_eq!(removed.len(), 5);
    }

    #[test]
    fn forced_clear_counts_tiles_without_matches() {
        let mut grid = grid_from(&["FWEZ", "EZPB", "ZPBE", "PBEZ"]);
        let mut source = ScriptedTiles::new([Element::Fire, Element::Water, Element::Earth, Element::Psychic]);
        let engine = engine();
        let column: Vec<Position> = (0..4).map(|row| Position::new(row, 0)).collect();
        let mut cascade = engine.start_forced(column);

        let step = engine.advance(&mut cascade, &mut grid, &mut source);
        let CascadeStep::Resolved { matches, report, .. } = step else {
            panic!("forced round should resolve");
        };
        assert!(matches.is_empty());
        assert_eq!(report.total_matches, 0);
        assert_eq!(report.total_tiles(), 4);
        assert!(!report.granted_extra_move);
    }

    #[test]
    fn quiet_board_finishes_immediately() {
        let mut grid = grid_from(&["FWE", "ZPB", "FWE"]);
        let mut source = ScriptedTiles::new([Element::Fire]);
        let report = engine().run_cascade(&mut grid, &mut source);
        assert_eq!(report, CascadeReport::default());
    }

    #[test]
    fn safety_cap_stops_runaway_cascades() {
        let mut grid = grid_from(&["FFF", "WEZ", "PBE"]);
        // Refill keeps recreating the fire row forever.
        let mut source = ScriptedTiles::new([Element::Fire]);
        let engine = CascadeEngine::new(MatchResolver::new(3), 4, 5);
        let report = engine.run_cascade(&mut grid, &mut source);
        assert_eq!(report.cascade_rounds, 5);
    }
}
