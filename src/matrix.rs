use serde_derive::{Deserialize, Serialize};

/**
A dense square matrix of `f64` cells, indexed by (row, column).

The trust and willingness relations between industrial agents are square
matrices over the joint recycler+producer index space. They are owned by the
model and handed to agents by reference, never aliased globally.
*/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SquareMatrix {
    n: usize,
    cells: Vec<f64>,
}

impl SquareMatrix {
    pub fn zeros(n: usize) -> SquareMatrix {
        SquareMatrix {
            n,
            cells: vec![0.0; n * n],
        }
    }

    /// Fill every cell from a generator, e.g. a random draw per cell.
    pub fn fill_with<F>(n: usize, mut cell: F) -> SquareMatrix
    where
        F: FnMut() -> f64,
    {
        SquareMatrix {
            n,
            cells: (0..n * n).map(|_| cell()).collect(),
        }
    }

    pub fn size(&self) -> usize {
        self.n
    }

    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.cells[row * self.n + column]
    }

    pub fn set(&mut self, row: usize, column: usize, value: f64) {
        self.cells[row * self.n + column] = value;
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.cells[row * self.n..(row + 1) * self.n]
    }

    pub fn fill_diagonal(&mut self, value: f64) {
        for i in 0..self.n {
            self.cells[i * self.n + i] = value;
        }
    }
}
