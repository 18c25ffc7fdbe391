//! Match detection over any read-only view of the board.
//!
//! Scans never mutate. Swap validation and deadlock detection evaluate a
//! hypothetical swap through [`SwappedView`] instead of touching the grid.

use super::Position;
use crate::element::Element;

/// Read access to cell contents.
pub trait CellView {
    fn size(&self) -> u8;
    fn element_at(&self, pos: Position) -> Option<Element>;
}

/// A view with two cells exchanged.
pub struct SwappedView<'a, V: CellView + ?Sized> {
    inner: &'a V,
    a: Position,
    b: Position,
}

impl<'a, V: CellView + ?Sized> SwappedView<'a, V> {
    pub fn new(inner: &'a V, a: Position, b: Position) -> Self {
        Self { inner, a, b }
    }
}

impl<V: CellView + ?Sized> CellView for SwappedView<'_, V> {
    fn size(&self) -> u8 {
        self.inner.size()
    }

    fn element_at(&self, pos: Position) -> Option<Element> {
        if pos == self.a {
            self.inner.element_at(self.b)
        } else if pos == self.b {
            self.inner.element_at(self.a)
        } else {
            self.inner.element_at(pos)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Orientation {
    Row,
    Column,
}

/// A maximal run of identical elements along one axis.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Match {
    pub orientation: Orientation,
    pub element: Element,
    /// Left-to-right for rows, top-to-bottom for columns.
    pub positions: Vec<Position>,
}

impl Match {
    pub fn size(&self) -> usize {
        self.positions.len()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.positions.contains(&pos)
    }
}

/// Finds runs of at least `min_match_size` identical, non-empty cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchResolver {
    min_match_size: u8,
}

impl MatchResolver {
    pub const fn new(min_match_size: u8) -> Self {
        Self { min_match_size }
    }

    pub const fn min_match_size(&self) -> u8 {
        self.min_match_size
    }

    /// Every row, then every column. Overlapping row and column runs are
    /// reported as separate matches.
    pub fn scan_all<V: CellView + ?Sized>(&self, view: &V) -> Vec<Match> {
        let size = view.size();
        let mut matches = Vec::new();
        for row in 0..size {
            self.scan_line(view, Orientation::Row, row, &mut matches);
        }
        for col in 0..size {
            self.scan_line(view, Orientation::Column, col, &mut matches);
        }
        matches
    }

    fn scan_line<V: CellView + ?Sized>(
        &self,
        view: &V,
        orientation: Orientation,
        line: u8,
        out: &mut Vec<Match>,
    ) {
        let size = view.size();
        let at = |i: u8| match orientation {
            Orientation::Row => Position::new(line, i),
            Orientation::Column => Position::new(i, line),
        };

        let mut start = 0u8;
        while start < size {
            let Some(element) = view.element_at(at(start)) else {
                start += 1;
                continue;
            };
            let mut end = start + 1;
            while end < size && view.element_at(at(end)) == Some(element) {
                end += 1;
            }
            if end - start >= self.min_match_size {
                out.push(Match {
                    orientation,
                    element,
                    positions: (start..end).map(at).collect(),
                });
            }
            start = end;
        }
    }

    /// Runs through `pos` only: zero, one, or two matches (row first).
    pub fn scan_at<V: CellView + ?Sized>(&self, view: &V, pos: Position) -> Vec<Match> {
        let mut matches = Vec::with_capacity(2);
        let Some(element) = view.element_at(pos) else {
            return matches;
        };
        let size = view.size();
        let same = |p: Position| view.element_at(p) == Some(element);

        let mut left = pos.col;
        while left > 0 && same(Position::new(pos.row, left - 1)) {
            left -= 1;
        }
        let mut right = pos.col;
        while right + 1 < size && same(Position::new(pos.row, right + 1)) {
            right += 1;
        }
        if right - left + 1 >= self.min_match_size {
            matches.push(Match {
                orientation: Orientation::Row,
                element,
                positions: (left..=right).map(|c| Position::new(pos.row, c)).collect(),
            });
        }

        let mut top = pos.row;
        while top > 0 && same(Position::new(top - 1, pos.col)) {
            top -= 1;
        }
        let mut bottom = pos.row;
        while bottom + 1 < size && same(Position::new(bottom + 1, pos.col)) {
            bottom += 1;
        }
        if bottom - top + 1 >= self.min_match_size {
            matches.push(Match {
                orientation: Orientation::Column,
                element,
                positions: (top..=bottom).map(|r| Position::new(r, pos.col)).collect(),
            });
        }

        matches
    }

    pub fn has_match_at<V: CellView + ?Sized>(&self, view: &V, pos: Position) -> bool {
        !self.scan_at(view, pos).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::test_support::grid_from;

    #[test]
    fn scan_all_finds_single_row_match() {
        let grid = grid_from(&[
            "FFFWEZPB", //
            "WEZPBFWE", //
            "ZPBFWEZP", //
            "BFWEZPBF", //
            "WEZPBFWE", //
            "ZPBFWEZP", //
            "BFWEZPBF", //
            "WEZPBFWE", //
        ]);
        let matches = MatchResolver::new(3).scan_all(&grid);
        assert_eq!(
            matches,
            vec![Match {
                orientation: Orientation::Row,
                element: Element::Fire,
                positions: vec![
                    Position::new(0, 0),
                    Position::new(0, 1),
                    Position::new(0, 2)
                ],
            }]
        );
    }

    #[test]
    fn short_runs_never_match() {
        let grid = grid_from(&["FFWW", "WWFF", "FFWW", "WWFF"]);
        assert!(MatchResolver::new(3).scan_all(&grid).is_empty());
        assert!(
            MatchResolver::new(3)
                .scan_all(&grid)
                .iter()
                .all(|m| m.size() >= 3)
        );
    }

    #[test]
    fn overlapping_runs_are_reported_separately() {
        let grid = grid_from(&["FFFW", "FWEW", "FEWE", "WEWE"]);
        let matches = MatchResolver::new(3).scan_all(&grid);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].orientation, Orientation::Row);
        assert_eq!(matches[1].orientation, Orientation::Column);
        assert!(matches[0].contains(Position::new(0, 0)));
        assert!(matches[1].contains(Position::new(0, 0)));
    }

    #[test]
    fn empty_cells_break_runs() {
        let grid = grid_from(&["FF.F", "WEWE", "EWEW", "WEWE"]);
        assert!(MatchResolver::new(3).scan_all(&grid).is_empty());
    }

    #[test]
    fn maximal_run_is_one_match() {
        let grid = grid_from(&["WWWWW", "FEFEF", "EFEFE", "FEFEF", "EFEFE"]);
        let matches = MatchResolver::new(3).scan_all(&grid);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].size(), 5);
    }

    #[test]
    fn scan_at_reports_both_orientations() {
        let grid = grid_from(&[".F..", "FFF.", ".F..", "...."]);
        let matches = MatchResolver::new(3).scan_at(&grid, Position::new(1, 1));
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].orientation, Orientation::Row);
        assert_eq!(matches[1].orientation, Orientation::Column);
        assert!(
            MatchResolver::new(3)
                .scan_at(&grid, Position::new(3, 3))
                .is_empty()
        );
    }

    #[test]
    fn swapped_view_evaluates_without_mutation() {
        let grid = grid_from(&["FFWF", "EWEW", "WEWE", "EWEW"]);
        let resolver = MatchResolver::new(3);
        let view = SwappedView::new(&grid, Position::new(0, 2), Position::new(0, 3));
        assert!(resolver.has_match_at(&view, Position::new(0, 2)));
        assert_eq!(grid.element_at(Position::new(0, 2)), Some(Element::Water));
    }
}
