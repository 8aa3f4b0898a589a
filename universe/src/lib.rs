/**
* A live cell dies if it has fewer than two live neighbors.
* A live cell with two or three live neighbors lives on to the next generation.
* A live cell with more than three live neighbors dies.
* A dead cell will be brought back to live if it has exactly three live neighbors.
*
* The grid is a torus: rows wrap top-to-bottom and columns wrap left-to-right,
* so every cell has exactly eight neighbors.
*/

pub mod grid {
    use crate::grid::Cell::{Alive, Dead};
    use rand::Rng;
    use thiserror::Error;

    /// Fraction of cells set alive by [`Universe::randomize`].
    pub const ALIVE_DENSITY: f64 = 0.2;

    #[repr(u8)]
    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    pub enum Cell {
        Dead = 0,
        Alive = 1,
    }

    impl Cell {
        pub fn is_alive(self) -> bool {
            self == Alive
        }

        fn toggled(self) -> Self {
            match self {
                Dead => Alive,
                Alive => Dead,
            }
        }
    }

    #[derive(Debug, PartialEq, Eq, Clone, Copy, Error)]
    pub enum UniverseError {
        #[error("universe dimensions must be positive, got {width}x{height}")]
        InvalidDimensions { width: usize, height: usize },
        #[error("cell ({row}, {col}) is outside a {width}x{height} universe")]
        OutOfBounds {
            row: usize,
            col: usize,
            width: usize,
            height: usize,
        },
    }

    /// A fixed-size toroidal Game of Life grid.
    ///
    /// Cell states live in a flat row-major buffer; `next_cells` is the
    /// scratch buffer a tick writes into before committing, so a tick only
    /// ever reads the previous generation.
    #[derive(Debug)]
    pub struct Universe {
        width: usize,
        height: usize,
        cells: Vec<Cell>,
        next_cells: Vec<Cell>,
    }

    impl Universe {
        /// Create a universe with a randomized initial pattern.
        pub fn new(width: usize, height: usize) -> Result<Self, UniverseError> {
            let mut universe = Self::empty(width, height)?;
            universe.randomize();
            Ok(universe)
        }

        /// Create a universe with every cell dead.
        pub fn empty(width: usize, height: usize) -> Result<Self, UniverseError> {
            if width == 0 || height == 0 {
                return Err(UniverseError::InvalidDimensions { width, height });
            }
            Ok(Universe {
                width,
                height,
                cells: vec![Dead; width * height],
                next_cells: vec![Dead; width * height],
            })
        }

        pub fn width(&self) -> usize {
            self.width
        }

        pub fn height(&self) -> usize {
            self.height
        }

        /// The current generation, row-major.
        pub fn cells(&self) -> &[Cell] {
            &self.cells
        }

        pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
            (row < self.height && col < self.width).then(|| self.cells[row * self.width + col])
        }

        /// Number of live cells in the current generation.
        pub fn population(&self) -> usize {
            self.cells.iter().filter(|cell| cell.is_alive()).count()
        }

        pub fn randomize(&mut self) {
            self.randomize_with(&mut rand::rng());
        }

        /// Randomize from a caller-supplied source, so a seeded generator
        /// produces a reproducible pattern.
        pub fn randomize_with<R: Rng>(&mut self, rng: &mut R) {
            for cell in &mut self.cells {
                *cell = if rng.random_bool(ALIVE_DENSITY) { Alive } else { Dead };
            }
        }

        /// Reset every cell in both buffers to dead.
        pub fn clear(&mut self) {
            self.cells.fill(Dead);
            self.next_cells.fill(Dead);
        }

        /// Flip one cell between dead and alive. Out-of-bounds coordinates
        /// are rejected and leave the universe untouched.
        pub fn toggle_cell(&mut self, row: usize, col: usize) -> Result<(), UniverseError> {
            if row >= self.height || col >= self.width {
                return Err(UniverseError::OutOfBounds {
                    row,
                    col,
                    width: self.width,
                    height: self.height,
                });
            }
            let index = row * self.width + col;
            self.cells[index] = self.cells[index].toggled();
            Ok(())
        }

        /// Advance the universe by one generation (Game of Life logic).
        /// Returns whether any cell changed.
        pub fn tick(&mut self) -> bool {
            for row in 0..self.height {
                for col in 0..self.width {
                    let alive_neighbors = self.alive_neighbors(row, col);
                    let index = row * self.width + col;

                    // Apply Game of Life rules
                    self.next_cells[index] = match (self.cells[index], alive_neighbors) {
                        (Alive, 2..=3) => Alive, // Survives
                        (Dead, 3) => Alive,      // Becomes alive
                        _ => Dead,               // Dies or remains dead
                    };
                }
            }

            if self.cells == self.next_cells {
                return false;
            }
            // Commit by value so the buffer identity never changes
            self.cells.copy_from_slice(&self.next_cells);
            true
        }

        /// Count the number of alive neighbors for a cell, wrapping at
        /// every edge.
        fn alive_neighbors(&self, row: usize, col: usize) -> usize {
            let mut count = 0;

            for dr in [-1, 0, 1].iter() {
                for dc in [-1, 0, 1].iter() {
                    if *dr == 0 && *dc == 0 {
                        // Skip the current cell
                        continue;
                    }

                    let neighbor_row =
                        (row as isize + dr).rem_euclid(self.height as isize) as usize;
                    let neighbor_col = (col as isize + dc).rem_euclid(self.width as isize) as usize;

                    if self.cells[neighbor_row * self.width + neighbor_col] == Alive {
                        count += 1;
                    }
                }
            }

            count
        }
    }

    #[cfg(test)]
    mod tests {
        use super::Cell::Alive;
        use super::{Universe, UniverseError, ALIVE_DENSITY};
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        fn universe_with(width: usize, height: usize, alive: &[(usize, usize)]) -> Universe {
            let mut universe = Universe::empty(width, height).unwrap();
            for &(row, col) in alive {
                universe.toggle_cell(row, col).unwrap();
            }
            universe
        }

        fn alive_cells(universe: &Universe) -> Vec<(usize, usize)> {
            let mut alive = Vec::new();
            for row in 0..universe.height() {
                for col in 0..universe.width() {
                    if universe.get(row, col) == Some(Alive) {
                        alive.push((row, col));
                    }
                }
            }
            alive
        }

        #[test]
        fn zero_dimensions_are_rejected() {
            assert_eq!(
                Universe::empty(0, 10).unwrap_err(),
                UniverseError::InvalidDimensions { width: 0, height: 10 }
            );
            assert!(Universe::new(10, 0).is_err());
            assert!(Universe::new(0, 0).is_err());
        }

        #[test]
        fn buffers_match_dimensions() {
            let universe = Universe::empty(7, 3).unwrap();
            assert_eq!(universe.width(), 7);
            assert_eq!(universe.height(), 3);
            assert_eq!(universe.cells().len(), 21);
            assert_eq!(universe.population(), 0);
        }

        #[test]
        fn new_universe_starts_randomized() {
            let universe = Universe::new(50, 50).unwrap();
            let population = universe.population();
            assert!(population > 0 && population < 50 * 50);
        }

        #[test]
        fn toggle_round_trips_and_leaves_the_rest_alone() {
            let mut universe = universe_with(4, 4, &[(0, 3), (2, 1)]);
            universe.toggle_cell(1, 1).unwrap();
            assert_eq!(alive_cells(&universe), vec![(0, 3), (1, 1), (2, 1)]);
            universe.toggle_cell(1, 1).unwrap();
            assert_eq!(alive_cells(&universe), vec![(0, 3), (2, 1)]);
        }

        #[test]
        fn out_of_bounds_toggle_is_rejected() {
            let mut universe = universe_with(4, 4, &[(1, 1)]);
            assert_eq!(
                universe.toggle_cell(4, 0).unwrap_err(),
                UniverseError::OutOfBounds { row: 4, col: 0, width: 4, height: 4 }
            );
            assert!(universe.toggle_cell(0, 4).is_err());
            assert_eq!(alive_cells(&universe), vec![(1, 1)]);
        }

        #[test]
        fn block_is_a_still_life() {
            let mut universe = universe_with(4, 4, &[(1, 1), (1, 2), (2, 1), (2, 2)]);
            assert!(!universe.tick());
            assert_eq!(alive_cells(&universe), vec![(1, 1), (1, 2), (2, 1), (2, 2)]);
        }

        #[test]
        fn blinker_oscillates_with_period_two() {
            let mut universe = universe_with(5, 5, &[(2, 1), (2, 2), (2, 3)]);
            assert!(universe.tick());
            assert_eq!(alive_cells(&universe), vec![(1, 2), (2, 2), (3, 2)]);
            assert!(universe.tick());
            assert_eq!(alive_cells(&universe), vec![(2, 1), (2, 2), (2, 3)]);
        }

        #[test]
        fn blinker_oscillates_across_the_seam() {
            // Vertical blinker spanning the top and bottom edges.
            let mut universe = universe_with(5, 5, &[(0, 2), (1, 2), (4, 2)]);
            assert!(universe.tick());
            assert_eq!(alive_cells(&universe), vec![(0, 1), (0, 2), (0, 3)]);
            assert!(universe.tick());
            assert_eq!(alive_cells(&universe), vec![(0, 2), (1, 2), (4, 2)]);
        }

        #[test]
        fn corner_cells_neighbor_each_other() {
            // The three live corners are mutual neighbors only through the
            // wrap: each survives on two neighbors, and together they birth
            // the fourth corner across the diagonal seam.
            let mut universe = universe_with(5, 5, &[(0, 0), (0, 4), (4, 0)]);
            assert!(universe.tick());
            assert_eq!(alive_cells(&universe), vec![(0, 0), (0, 4), (4, 0), (4, 4)]);
        }

        #[test]
        fn glider_advances_one_step() {
            let mut universe = universe_with(5, 5, &[(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)]);
            assert!(universe.tick());
            assert_eq!(
                alive_cells(&universe),
                vec![(1, 0), (1, 2), (2, 1), (2, 2), (3, 1)]
            );
        }

        #[test]
        fn clear_is_idempotent_and_all_dead_is_a_fixed_point() {
            let mut universe = Universe::new(8, 8).unwrap();
            universe.clear();
            assert_eq!(universe.population(), 0);
            universe.clear();
            assert_eq!(universe.population(), 0);
            assert!(!universe.tick());
            assert_eq!(universe.population(), 0);
        }

        #[test]
        fn randomize_hits_the_target_density() {
            let mut universe = Universe::empty(100, 100).unwrap();
            let mut rng = StdRng::seed_from_u64(0x5eed);
            for _ in 0..5 {
                universe.randomize_with(&mut rng);
                let fraction = universe.population() as f64 / 10_000.0;
                assert!(
                    (fraction - ALIVE_DENSITY).abs() < 0.05,
                    "alive fraction {fraction} strays too far from {ALIVE_DENSITY}"
                );
            }
        }
    }
}
