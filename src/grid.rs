//! Storage shared by the elevation and resource caches: a flat buffer
//! addressed as (column, row).

/// Flat 2D buffer addressed by (column, row). Column indices wrap so the
/// left and right map edges read as neighbors; row indices do not, callers
/// clamp them.
#[derive(Clone)]
pub struct Grid<T> {
    pub width: usize,
    pub height: usize,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            cells: vec![value; width * height],
        }
    }

    fn offset(&self, col: usize, row: usize) -> usize {
        row * self.width + col % self.width
    }

    pub fn get(&self, col: usize, row: usize) -> &T {
        &self.cells[self.offset(col, row)]
    }

    pub fn set(&mut self, col: usize, row: usize, value: T) {
        let at = self.offset(col, row);
        self.cells[at] = value;
    }

    /// Overwrite every cell.
    pub fn fill(&mut self, value: T) {
        self.cells.fill(value);
    }

    /// Visit all cells as (col, row, value), row-major.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(at, value)| (at % width, at / width, value))
    }
}
