use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::Cell;

/// Represents errors that can occur within the grid operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("Coordinates ({x}, {y}) are out of bounds for grid size ({width}, {height})")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: usize,
        height: usize,
    },
}

/// A generic 2D grid structure.
///
/// Stores elements of type `T` in a flat vector using row-major order.
/// Cells are addressed with signed [`Cell`] coordinates; anything with a
/// negative component or beyond the dimensions is out of bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a new grid with the specified dimensions, filled with default values.
    ///
    /// # Panics
    ///
    /// Panics if `width * height` overflows `usize`.
    pub fn new(width: usize, height: usize) -> Self
    where
        T: Default + Clone,
    {
        let size = width.checked_mul(height).expect("Grid size overflow");
        Grid {
            width,
            height,
            cells: vec![T::default(); size],
        }
    }

    /// Returns the width of the grid.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height of the grid.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Converts a cell to a flat vector index.
    ///
    /// Returns `None` if the cell is out of bounds.
    #[inline]
    pub fn cell_to_index(&self, cell: Cell) -> Option<usize> {
        if self.contains(cell) {
            Some(cell.y as usize * self.width + cell.x as usize)
        } else {
            None
        }
    }

    /// Checks if the given cell is within the grid boundaries.
    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0
            && cell.y >= 0
            && (cell.x as usize) < self.width
            && (cell.y as usize) < self.height
    }

    /// Gets an immutable reference to the value at the given cell.
    pub fn get(&self, cell: Cell) -> Option<&T> {
        let index = self.cell_to_index(cell)?;
        self.cells.get(index)
    }

    /// Sets the value at the given cell.
    ///
    /// Returns `Err(GridError::OutOfBounds)` if the cell is invalid.
    pub fn set(&mut self, cell: Cell, value: T) -> Result<(), GridError> {
        let index = self.cell_to_index(cell).ok_or(GridError::OutOfBounds {
            x: cell.x,
            y: cell.y,
            width: self.width,
            height: self.height,
        })?;
        self.cells[index] = value;
        Ok(())
    }
}

/// Indexing by [`Cell`]. Panics when the cell is out of bounds.
impl<T> Index<Cell> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, cell: Cell) -> &Self::Output {
        match self.cell_to_index(cell) {
            Some(idx) => &self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                cell.x, cell.y, self.width, self.height
            ),
        }
    }
}

impl<T> IndexMut<Cell> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, cell: Cell) -> &mut Self::Output {
        let width = self.width;
        let height = self.height;
        match self.cell_to_index(cell) {
            Some(idx) => &mut self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                cell.x, cell.y, width, height
            ),
        }
    }
}
