//! Widget placement checks for the fixed dashboard grid.
//!
//! A dashboard is a grid of [`GRID_COLUMNS`] x [`GRID_ROWS`] cells. Every
//! widget occupies the rectangle `[x, x + width) x [y, y + height)`, which
//! must lie inside the grid and must not share a cell with any other widget
//! of the same dashboard.

use std::collections::HashSet;

use crate::error::CoreError;

/// Number of grid columns.
pub const GRID_COLUMNS: i32 = 24;

/// Number of grid rows.
pub const GRID_ROWS: i32 = 63;

/// Largest accepted `x` coordinate.
pub const MAX_X: i32 = GRID_COLUMNS - 1;

/// Largest accepted `y` coordinate.
pub const MAX_Y: i32 = GRID_ROWS - 1;

/// Minimum / maximum widget width in columns.
pub const MIN_WIDTH: i32 = 1;
pub const MAX_WIDTH: i32 = GRID_COLUMNS;

/// Minimum / maximum widget height in rows.
pub const MIN_HEIGHT: i32 = 2;
pub const MAX_HEIGHT: i32 = 32;

/// The rectangle a widget occupies on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Placement {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the rectangle lies entirely inside the grid.
    pub fn is_within_grid(&self) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.width >= 1
            && self.height >= 1
            && self.x + self.width <= GRID_COLUMNS
            && self.y + self.height <= GRID_ROWS
    }

    /// All `(x, y)` cells covered by the rectangle.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (self.x..self.x + self.width)
            .flat_map(move |x| (self.y..self.y + self.height).map(move |y| (x, y)))
    }
}

/// Check one dashboard's widgets for out-of-bounds placement and overlap.
///
/// Widgets are processed in order. For each widget the bounds check runs
/// first, then its cells are claimed; the first failure aborts.
pub fn check_grid(dashboard_name: &str, placements: &[Placement]) -> Result<(), CoreError> {
    let mut occupied: HashSet<(i32, i32)> = HashSet::new();

    for placement in placements {
        if !placement.is_within_grid() {
            return Err(CoreError::Placement(format!(
                "Dashboard \"{dashboard_name}\" widget in cell X - {} Y - {} is out of bounds.",
                placement.x, placement.y
            )));
        }

        for (x, y) in placement.cells() {
            if !occupied.insert((x, y)) {
                return Err(CoreError::Placement(format!(
                    "Dashboard \"{dashboard_name}\" cell X - {x} Y - {y} is already taken."
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn overlapping_widgets_are_rejected_at_the_shared_cell() {
        let widgets = [Placement::new(0, 0, 2, 2), Placement::new(1, 1, 2, 2)];
        let err = check_grid("Ops", &widgets).unwrap_err();
        assert_matches!(err, CoreError::Placement(msg) if msg.contains("cell X - 1 Y - 1"));
    }

    #[test]
    fn adjacent_widgets_are_accepted() {
        let widgets = [
            Placement::new(0, 0, 12, 5),
            Placement::new(12, 0, 12, 5),
            Placement::new(0, 5, 24, 5),
        ];
        assert!(check_grid("Ops", &widgets).is_ok());
    }

    #[test]
    fn widget_touching_the_far_corner_is_accepted() {
        let widgets = [Placement::new(MAX_X, GRID_ROWS - 2, 1, 2)];
        assert!(check_grid("Ops", &widgets).is_ok());
    }

    #[test]
    fn widget_past_the_right_edge_is_rejected() {
        let widgets = [Placement::new(20, 0, 5, 2)];
        let err = check_grid("Ops", &widgets).unwrap_err();
        assert_matches!(err, CoreError::Placement(msg) if msg.contains("out of bounds"));
    }

    #[test]
    fn widget_past_the_bottom_edge_is_rejected() {
        let widgets = [Placement::new(0, 60, 4, 4)];
        assert_matches!(check_grid("Ops", &widgets), Err(CoreError::Placement(_)));
    }

    #[test]
    fn negative_coordinates_are_out_of_bounds() {
        let widgets = [Placement::new(-1, 0, 2, 2)];
        assert_matches!(check_grid("Ops", &widgets), Err(CoreError::Placement(_)));
    }

    #[test]
    fn identical_widgets_collide() {
        let widgets = [Placement::new(3, 3, 1, 2), Placement::new(3, 3, 1, 2)];
        let err = check_grid("Ops", &widgets).unwrap_err();
        assert_matches!(err, CoreError::Placement(msg) if msg.contains("Dashboard \"Ops\""));
    }

    #[test]
    fn accepts_iff_disjoint_and_in_bounds() {
        // Exhaustive check of a second widget against a fixed first one.
        let first = Placement::new(4, 4, 3, 3);
        for x in -1..GRID_COLUMNS {
            for y in -1..10 {
                let second = Placement::new(x, y, 2, 2);
                let disjoint = first.cells().all(|c| second.cells().all(|d| c != d));
                let expected = disjoint && second.is_within_grid();
                assert_eq!(
                    check_grid("Ops", &[first, second]).is_ok(),
                    expected,
                    "second widget at ({x}, {y})"
                );
            }
        }
    }
}
