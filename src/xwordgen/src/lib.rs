//! Fill a crossword grid from a word list by treating it as a constraint-satisfaction problem:
//! each slot is a variable whose domain is the word list, constrained by its length, by matching
//! letters wherever two slots cross, and by no word appearing twice.
//!
//! ```no_run
//! use xwordgen::{solve, render_grid, Crossword};
//!
//! let crossword = Crossword::from_files("structure.txt", "words.txt").unwrap();
//! match solve(&crossword) {
//!     Some(assignment) => println!("{}", render_grid(&crossword, &assignment)),
//!     None => println!("No solution."),
//! }
//! ```

pub mod arc_consistency;
pub mod backtracking;
pub mod crossword;
pub mod domains;
mod error;
pub mod render;

pub use backtracking::{solve, Assignment, Solution, SolveFailure, Solver, SolverConfig, Statistics};
pub use crossword::{Crossword, Direction, Variable, Word};
pub use error::{Error, Result};
pub use render::{letter_grid, render_grid};

/// The expected maximum length for a single slot. Longer words still work, they just aren't
/// stored inline.
pub const MAX_SLOT_LENGTH: usize = 21;

/// An identifier for a variable, based on its index in the Crossword's `variables`. Ids follow
/// the `Variable` ordering.
pub type VarId = usize;

/// An identifier for a word, based on its index in the Crossword's `words`. Ids follow
/// alphabetical order.
pub type WordId = usize;

/// Zero-indexed (row, col) coords for a cell in the grid, where row 0 is the top row.
pub type GridCoord = (usize, usize);
