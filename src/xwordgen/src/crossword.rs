use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::Path;

use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::{GridCoord, VarId, WordId, MAX_SLOT_LENGTH};

/// Direction that a slot is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Across,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Across => write!(f, "across"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// A word slot in the grid. Two variables are the same variable iff all four fields match, and
/// variables are ordered by `(row, col, direction, length)`; that order is the tie-break used
/// anywhere the solver has to pick between otherwise equal variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    pub row: usize,
    pub col: usize,
    pub direction: Direction,
    pub length: usize,
}

impl Variable {
    pub fn new(row: usize, col: usize, direction: Direction, length: usize) -> Variable {
        Variable { row, col, direction, length }
    }

    /// Generate the (row, col) coords for each cell of this variable.
    pub fn cell_coords(&self) -> Vec<GridCoord> {
        (0..self.length).map(|cell_idx| {
            match self.direction {
                Direction::Across => (self.row, self.col + cell_idx),
                Direction::Down => (self.row + cell_idx, self.col),
            }
        }).collect()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}) {} : {}", self.row, self.col, self.direction, self.length)
    }
}

/// A vocabulary entry, with its chars stored inline so overlap checks don't have to walk UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub string: String,
    pub chars: SmallVec<[char; MAX_SLOT_LENGTH]>,
}

impl Word {
    fn new(string: String) -> Word {
        let chars = string.chars().collect();
        Word { string, chars }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

/// A grid structure plus vocabulary, with the variables and crossings derived from it. This is
/// read-only once built.
pub struct Crossword {
    pub height: usize,
    pub width: usize,

    /// `structure[row][col]` is true for fillable cells.
    pub structure: Vec<Vec<bool>>,

    /// Deduplicated and sorted, so a `WordId` order is also the alphabetical order.
    words: Vec<Word>,

    /// Sorted by the `Variable` ordering, so a `VarId` order is also the variable order.
    variables: Vec<Variable>,
    var_ids: HashMap<Variable, VarId>,

    /// Only crossing pairs are present, in both orientations.
    overlaps: HashMap<(VarId, VarId), (usize, usize)>,
    neighbors: Vec<Vec<VarId>>,
}

impl Debug for Crossword {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crossword")
            .field("height", &self.height)
            .field("width", &self.width)
            .field("variables", &self.variables)
            .field("words", &(["(", &self.words.len().to_string(), " entries)"].join("")))
            .finish()
    }
}

impl Crossword {
    /// Parse a structure, where `_` is a fillable cell and anything else is a block, and a word
    /// list with one word per line.
    pub fn new(structure: &str, words: &str) -> Result<Crossword> {
        let structure: Vec<Vec<bool>> = structure
            .lines()
            .map(|line| line.chars().map(|c| c == '_').collect())
            .collect();

        if structure.iter().all(|row| row.is_empty()) {
            return Err(Error::EmptyStructure);
        }

        let words = words
            .lines()
            .map(str::trim)
            .filter(|word| !word.is_empty())
            .map(str::to_uppercase);

        Ok(Crossword::from_parts(structure, words))
    }

    /// Load a structure file and a words file.
    pub fn from_files<P: AsRef<Path>, Q: AsRef<Path>>(structure: P, words: Q) -> Result<Crossword> {
        let read = |path: &Path| {
            fs::read_to_string(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })
        };

        Crossword::new(&read(structure.as_ref())?, &read(words.as_ref())?)
    }

    /// Build a crossword from an already-parsed grid. Rows shorter than the widest one are padded
    /// with blocks. Words are used verbatim (apart from deduplication).
    pub fn from_parts<I, S>(mut structure: Vec<Vec<bool>>, words: I) -> Crossword
        where
            I: IntoIterator<Item=S>,
            S: Into<String>,
    {
        let height = structure.len();
        let width = structure.iter().map(|row| row.len()).max().unwrap_or(0);
        for row in &mut structure {
            row.resize(width, false);
        }

        let words: Vec<Word> = words.into_iter()
            .map(Into::into)
            .collect::<BTreeSet<String>>()
            .into_iter()
            .map(Word::new)
            .collect();

        let mut variables = find_variables(&structure, Direction::Across);
        variables.extend(find_variables(&structure, Direction::Down));
        variables.sort();

        let var_ids: HashMap<Variable, VarId> =
            variables.iter().enumerate().map(|(id, &variable)| (variable, id)).collect();

        // Build a map from cell location to the variables running through it, which we can then
        // use to calculate crossings.
        let mut cell_by_loc: HashMap<GridCoord, Vec<(VarId, usize)>> = HashMap::new();
        for (var_id, variable) in variables.iter().enumerate() {
            for (cell_idx, loc) in variable.cell_coords().into_iter().enumerate() {
                cell_by_loc.entry(loc).or_default().push((var_id, cell_idx));
            }
        }

        let mut overlaps: HashMap<(VarId, VarId), (usize, usize)> = HashMap::new();
        let mut neighbors: Vec<Vec<VarId>> = vec![vec![]; variables.len()];
        for entries in cell_by_loc.values() {
            for &(x, i) in entries {
                for &(y, j) in entries {
                    if x != y {
                        overlaps.insert((x, y), (i, j));
                        neighbors[x].push(y);
                    }
                }
            }
        }
        for var_neighbors in &mut neighbors {
            var_neighbors.sort_unstable();
            var_neighbors.dedup();
        }

        debug_assert!(overlaps.iter().all(|(&(x, y), &(i, j))| overlaps.get(&(y, x)) == Some(&(j, i))));

        Crossword { height, width, structure, words, variables, var_ids, overlaps, neighbors }
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, var_id: VarId) -> Variable {
        self.variables[var_id]
    }

    pub fn var_id(&self, variable: &Variable) -> Option<VarId> {
        self.var_ids.get(variable).copied()
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn word(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }

    pub fn word_id(&self, word: &str) -> Option<WordId> {
        self.words.binary_search_by(|probe| probe.string.as_str().cmp(word)).ok()
    }

    /// The index of the shared cell within each of `x` and `y`, if they cross.
    pub fn overlap(&self, x: &Variable, y: &Variable) -> Option<(usize, usize)> {
        self.overlap_by_id(self.var_id(x)?, self.var_id(y)?)
    }

    pub fn overlap_by_id(&self, x: VarId, y: VarId) -> Option<(usize, usize)> {
        self.overlaps.get(&(x, y)).copied()
    }

    /// All variables crossing `variable`, in variable order.
    pub fn neighbors(&self, variable: &Variable) -> Vec<Variable> {
        self.var_id(variable)
            .map(|var_id| self.neighbors[var_id].iter().map(|&n| self.variables[n]).collect())
            .unwrap_or_default()
    }

    pub fn neighbor_ids(&self, var_id: VarId) -> &[VarId] {
        &self.neighbors[var_id]
    }

    /// Check a (possibly partial) assignment against every constraint: word lengths, no word used
    /// twice, and matching letters wherever two assigned variables cross. Variables that don't
    /// belong to this crossword make the assignment invalid.
    pub fn check_assignment(&self, assignment: &BTreeMap<Variable, String>) -> bool {
        let mut used: HashSet<&str> = HashSet::with_capacity(assignment.len());

        for (variable, word) in assignment {
            let Some(var_id) = self.var_id(variable) else {
                return false;
            };
            if word.chars().count() != variable.length || !used.insert(word.as_str()) {
                return false;
            }

            for &neighbor_id in &self.neighbors[var_id] {
                let Some(other) = assignment.get(&self.variables[neighbor_id]) else {
                    continue;
                };
                let (i, j) = self.overlaps[&(var_id, neighbor_id)];
                if word.chars().nth(i) != other.chars().nth(j) {
                    return false;
                }
            }
        }

        true
    }
}

/// Collect every maximal run of two or more fillable cells in the given direction.
fn find_variables(structure: &[Vec<bool>], direction: Direction) -> Vec<Variable> {
    let height = structure.len();
    let width = structure.first().map(|row| row.len()).unwrap_or(0);
    let (lines, line_len) = match direction {
        Direction::Across => (height, width),
        Direction::Down => (width, height),
    };

    let mut result = vec![];
    for line in 0..lines {
        let fillable = |idx: usize| match direction {
            Direction::Across => structure[line][idx],
            Direction::Down => structure[idx][line],
        };

        let mut idx = 0;
        while idx < line_len {
            if !fillable(idx) {
                idx += 1;
                continue;
            }

            let start = idx;
            while idx < line_len && fillable(idx) {
                idx += 1;
            }

            let length = idx - start;
            if length > 1 {
                result.push(match direction {
                    Direction::Across => Variable::new(line, start, direction, length),
                    Direction::Down => Variable::new(start, line, direction, length),
                });
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::error::Error;
    use super::{Crossword, Direction::{Across, Down}, Variable};

    /// ___
    /// _#_
    /// ___
    fn ring() -> Crossword {
        Crossword::new("___\n_#_\n___\n", "cat\nCOD\n toe \n\nDYE\ncat\n").unwrap()
    }

    #[test]
    fn test_variables_are_derived_in_order() {
        let crossword = ring();

        assert_eq!(crossword.height, 3);
        assert_eq!(crossword.width, 3);
        assert_eq!(crossword.variables(), &[
            Variable::new(0, 0, Across, 3),
            Variable::new(0, 0, Down, 3),
            Variable::new(0, 2, Down, 3),
            Variable::new(2, 0, Across, 3),
        ]);
    }

    #[test]
    fn test_words_are_normalized() {
        let crossword = ring();
        let words: Vec<&str> = crossword.words().iter().map(|w| w.string.as_str()).collect();

        assert_eq!(words, vec!["CAT", "COD", "DYE", "TOE"]);
        assert_eq!(crossword.word_id("DYE"), Some(2));
        assert_eq!(crossword.word_id("dye"), None);
    }

    #[test]
    fn test_overlaps_are_symmetric() {
        let crossword = ring();
        let top = Variable::new(0, 0, Across, 3);
        let bottom = Variable::new(2, 0, Across, 3);
        let left = Variable::new(0, 0, Down, 3);
        let right = Variable::new(0, 2, Down, 3);

        assert_eq!(crossword.overlap(&top, &left), Some((0, 0)));
        assert_eq!(crossword.overlap(&top, &right), Some((2, 0)));
        assert_eq!(crossword.overlap(&right, &top), Some((0, 2)));
        assert_eq!(crossword.overlap(&bottom, &left), Some((0, 2)));
        assert_eq!(crossword.overlap(&left, &bottom), Some((2, 0)));
        assert_eq!(crossword.overlap(&bottom, &right), Some((2, 2)));
        assert_eq!(crossword.overlap(&top, &bottom), None);
        assert_eq!(crossword.overlap(&top, &top), None);

        assert_eq!(crossword.neighbors(&top), vec![left, right]);
        assert_eq!(crossword.neighbors(&Variable::new(1, 1, Down, 2)), vec![]);
    }

    #[test]
    fn test_short_runs_and_ragged_rows() {
        // The second row is short and gets padded with blocks; single cells aren't slots.
        let crossword = Crossword::new("_#__\n_\n#_#_", "ab").unwrap();

        assert_eq!(crossword.width, 4);
        assert_eq!(crossword.structure[1], vec![true, false, false, false]);
        assert_eq!(crossword.variables(), &[
            Variable::new(0, 0, Down, 2),
            Variable::new(0, 2, Across, 2),
        ]);
        assert!(crossword.neighbors(&Variable::new(0, 0, Down, 2)).is_empty());
    }

    #[test]
    fn test_empty_structure_is_rejected() {
        assert!(matches!(Crossword::new("", "cat"), Err(Error::EmptyStructure)));
        assert!(matches!(Crossword::new("\n\n", "cat"), Err(Error::EmptyStructure)));

        let blocked = Crossword::new("##\n##", "cat").unwrap();
        assert!(blocked.variables().is_empty());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = Crossword::from_files("/nonexistent/structure.txt", "/nonexistent/words.txt")
            .expect_err("loaded a missing file??");

        assert!(err.to_string().contains("/nonexistent/structure.txt"));
    }

    #[test]
    fn test_check_assignment() {
        let crossword = ring();
        let top = Variable::new(0, 0, Across, 3);
        let left = Variable::new(0, 0, Down, 3);
        let right = Variable::new(0, 2, Down, 3);
        let bottom = Variable::new(2, 0, Across, 3);

        let mut assignment = BTreeMap::from([
            (top, "CAT".to_string()),
            (left, "COD".to_string()),
            (right, "TOE".to_string()),
            (bottom, "DYE".to_string()),
        ]);
        assert!(crossword.check_assignment(&assignment));

        assignment.insert(bottom, "DOG".to_string());
        assert!(!crossword.check_assignment(&assignment), "crossing letters differ");

        assignment.remove(&bottom);
        assignment.insert(left, "CAT".to_string());
        assert!(!crossword.check_assignment(&assignment), "word used twice");

        let wrong_length = BTreeMap::from([(top, "CA".to_string())]);
        assert!(!crossword.check_assignment(&wrong_length));

        let unknown = BTreeMap::from([(Variable::new(5, 5, Across, 3), "CAT".to_string())]);
        assert!(!crossword.check_assignment(&unknown));
    }
}
