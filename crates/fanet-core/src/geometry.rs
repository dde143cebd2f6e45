//! Spatial utilities: positions, distances and grid discretization

use serde::{Deserialize, Serialize};

use crate::error::{FanetError, Result};

/// Discrete spatial bucket of the area of interest, row-major
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell(pub u64);

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cell-{}", self.0)
    }
}

/// Planar coordinates in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        euclidean_distance(*self, *other)
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Straight-line distance between two points
#[inline]
pub fn euclidean_distance(a: Position, b: Position) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Map a position to the grid cell that contains it.
///
/// Cells are `cell_size` wide squares laid out row-major over an area
/// `area_width` wide. Negative coordinates fall into the first row/column.
///
/// # Example
/// ```
/// use fanet_core::geometry::{coord_to_cell, Cell};
///
/// // 1000m wide area, 100m cells: 10 cells per row
/// assert_eq!(coord_to_cell(100.0, 1000.0, 250.0, 130.0).unwrap(), Cell(12));
/// ```
pub fn coord_to_cell(cell_size: f64, area_width: f64, x: f64, y: f64) -> Result<Cell> {
    if !(cell_size.is_finite() && cell_size > 0.0) {
        return Err(FanetError::InvalidGrid(format!(
            "cell size must be positive, got {cell_size}"
        )));
    }
    if !(area_width.is_finite() && area_width > 0.0) {
        return Err(FanetError::InvalidGrid(format!(
            "area width must be positive, got {area_width}"
        )));
    }

    let cells_per_row = (area_width / cell_size).ceil() as u64;
    let column = (x.max(0.0) / cell_size).floor() as u64;
    let row = (y.max(0.0) / cell_size).floor() as u64;

    Ok(Cell(column + row * cells_per_row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean_distance() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        assert!((euclidean_distance(a, b) - 5.0).abs() < 1e-12);
        assert_eq!(euclidean_distance(a, a), 0.0);
    }

    #[test]
    fn test_coord_to_cell_row_major() {
        assert_eq!(coord_to_cell(100.0, 1000.0, 0.0, 0.0).unwrap(), Cell(0));
        assert_eq!(coord_to_cell(100.0, 1000.0, 999.0, 0.0).unwrap(), Cell(9));
        assert_eq!(coord_to_cell(100.0, 1000.0, 0.0, 100.0).unwrap(), Cell(10));
    }

    #[test]
    fn test_coord_to_cell_partial_last_column() {
        // 950 / 100 rounds up to 10 cells per row
        assert_eq!(coord_to_cell(100.0, 950.0, 10.0, 150.0).unwrap(), Cell(10));
    }

    #[test]
    fn test_coord_to_cell_negative_coordinates() {
        assert_eq!(coord_to_cell(100.0, 1000.0, -5.0, -20.0).unwrap(), Cell(0));
    }

    #[test]
    fn test_coord_to_cell_rejects_bad_grid() {
        assert!(matches!(
            coord_to_cell(0.0, 1000.0, 1.0, 1.0),
            Err(FanetError::InvalidGrid(_))
        ));
        assert!(coord_to_cell(100.0, -1.0, 1.0, 1.0).is_err());
    }
}
