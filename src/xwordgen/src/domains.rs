use bit_set::BitSet;

use crate::crossword::Crossword;
use crate::{VarId, WordId};

/// A position in the domain store's removal trail. Rolling back to a mark re-inserts every word
/// removed since the mark was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Mark(usize);

/// The live candidate words for each variable, as a set of `WordId`s per `VarId`.
///
/// Every removal is recorded on a trail so that backtracking can restore the exact state of the
/// store at an earlier `Mark`, no matter how far propagation reached in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainStore {
    domains: Vec<BitSet>,

    /// `BitSet::len` counts bits, so we keep the size of each domain alongside it.
    sizes: Vec<usize>,

    trail: Vec<(VarId, WordId)>,
}

impl DomainStore {
    /// Give every variable the full vocabulary.
    pub fn new(crossword: &Crossword) -> DomainStore {
        let word_count = crossword.words().len();
        let variable_count = crossword.variables().len();

        DomainStore {
            domains: (0..variable_count).map(|_| (0..word_count).collect()).collect(),
            sizes: vec![word_count; variable_count],
            trail: vec![],
        }
    }

    pub fn len(&self, var_id: VarId) -> usize {
        self.sizes[var_id]
    }

    pub fn is_empty(&self, var_id: VarId) -> bool {
        self.sizes[var_id] == 0
    }

    pub fn contains(&self, var_id: VarId, word_id: WordId) -> bool {
        self.domains[var_id].contains(word_id)
    }

    /// The candidates for a variable in ascending `WordId` (alphabetical) order.
    pub fn iter(&self, var_id: VarId) -> impl Iterator<Item=WordId> + '_ {
        self.domains[var_id].iter()
    }

    /// Remove a candidate, returning whether it was present.
    pub fn remove(&mut self, var_id: VarId, word_id: WordId) -> bool {
        if !self.domains[var_id].remove(word_id) {
            return false;
        }

        self.sizes[var_id] -= 1;
        self.trail.push((var_id, word_id));
        true
    }

    /// Remove every candidate except `word_id`.
    pub fn restrict_to(&mut self, var_id: VarId, word_id: WordId) {
        let others: Vec<WordId> = self.iter(var_id).filter(|&other| other != word_id).collect();
        for other in others {
            self.remove(var_id, other);
        }
    }

    pub fn mark(&self) -> Mark {
        Mark(self.trail.len())
    }

    /// Undo every removal made since `mark`.
    pub fn rollback(&mut self, mark: Mark) {
        for (var_id, word_id) in self.trail.drain(mark.0..).rev() {
            self.domains[var_id].insert(word_id);
            self.sizes[var_id] += 1;
        }
    }

    /// Make every variable node-consistent by dropping candidates whose length doesn't match the
    /// slot. Idempotent; it may leave a domain empty, which the search deals with.
    pub fn enforce_node_consistency(&mut self, crossword: &Crossword) {
        for (var_id, variable) in crossword.variables().iter().enumerate() {
            let wrong_length: Vec<WordId> = self.iter(var_id)
                .filter(|&word_id| crossword.word(word_id).len() != variable.length)
                .collect();

            for word_id in wrong_length {
                self.remove(var_id, word_id);
            }
        }
    }
}
