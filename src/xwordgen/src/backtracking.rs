//! Backtracking search over the crossword variables. Variables are picked by minimum remaining
//! values (ties: most crossings, then variable order), values by least-constraining-value (ties:
//! alphabetical), and every tentative assignment is followed by AC-3 over the arcs touching the
//! assigned variable. Failed branches roll the domain store back to its state before the branch.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use bit_set::BitSet;
use instant::{Duration, Instant};
use log::{debug, info, trace};

use crate::arc_consistency::{self, ArcConsistencyResult, DirectedArc};
use crate::crossword::{Crossword, Variable};
use crate::domains::{DomainStore, Mark};
use crate::{VarId, WordId};

/// A complete or partial fill, keyed by variable.
pub type Assignment = BTreeMap<Variable, String>;

/// Limits on how long the search may run. The default is unlimited.
#[derive(Debug, Clone, Default)]
pub struct SolverConfig {
    /// Give up after trying this many tentative assignments.
    pub max_states: Option<u64>,
    pub time_limit: Option<Duration>,
}

/// A struct tracking statistics about the search.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub states: u64,
    pub backtracks: u64,
    pub duration: Duration,
}

/// A struct representing the results of a successful search.
#[derive(Debug)]
pub struct Solution {
    pub assignment: Assignment,
    pub statistics: Statistics,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveFailure {
    /// No assignment satisfies the constraints.
    Unsatisfiable,
    /// The `SolverConfig` budget ran out before the search finished.
    BudgetExhausted,
}

impl fmt::Display for SolveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveFailure::Unsatisfiable => write!(f, "No solution"),
            SolveFailure::BudgetExhausted => write!(f, "Search budget exhausted"),
        }
    }
}

impl std::error::Error for SolveFailure {}

/// One level of the search: the variable chosen there, its ordered candidates, how many have been
/// tried, and the domain store mark to roll back to before trying the next one.
#[derive(Debug)]
struct Frame {
    var_id: VarId,
    candidates: Vec<WordId>,
    cursor: usize,
    mark: Mark,
}

/// Live state of a search over one crossword.
pub struct Solver<'a> {
    crossword: &'a Crossword,
    domains: DomainStore,
    config: SolverConfig,
}

impl<'a> Solver<'a> {
    pub fn new(crossword: &'a Crossword) -> Solver<'a> {
        Solver::with_config(crossword, SolverConfig::default())
    }

    pub fn with_config(crossword: &'a Crossword, config: SolverConfig) -> Solver<'a> {
        Solver { crossword, domains: DomainStore::new(crossword), config }
    }

    pub fn domains(&self) -> &DomainStore {
        &self.domains
    }

    pub fn enforce_node_consistency(&mut self) {
        self.domains.enforce_node_consistency(self.crossword);
    }

    /// Make `x` arc-consistent with `y`; see `arc_consistency::revise`.
    pub fn revise(&mut self, x: &Variable, y: &Variable) -> bool {
        match (self.crossword.var_id(x), self.crossword.var_id(y)) {
            (Some(x), Some(y)) => arc_consistency::revise(self.crossword, &mut self.domains, x, y),
            _ => false,
        }
    }

    /// Run AC-3 from the given arcs, or from every arc in the crossword.
    pub fn ac3(&mut self, arcs: Option<&[(Variable, Variable)]>) -> ArcConsistencyResult {
        let arcs = arcs.map(|arcs| {
            arcs.iter()
                .filter_map(|(x, y)| Some((self.crossword.var_id(x)?, self.crossword.var_id(y)?)))
                .collect()
        });

        arc_consistency::ac3(self.crossword, &mut self.domains, arcs)
    }

    /// Is this partial assignment (indexed by `VarId`) free of wrong-length words, repeated words,
    /// and mismatched crossings? The whole assignment is checked on every call. A slice that
    /// doesn't cover every variable exactly is never consistent.
    pub fn consistent(&self, assignment: &[Option<WordId>]) -> bool {
        if assignment.len() != self.crossword.variables().len() {
            return false;
        }

        let mut used = BitSet::with_capacity(self.crossword.words().len());

        for (var_id, word_id) in assignment.iter().enumerate() {
            let Some(word_id) = *word_id else {
                continue;
            };
            let word = self.crossword.word(word_id);

            // The vocabulary is deduplicated, so equal ids mean equal words.
            if word.len() != self.crossword.variable(var_id).length || !used.insert(word_id) {
                return false;
            }

            for &neighbor_id in self.crossword.neighbor_ids(var_id) {
                let Some(other_id) = assignment[neighbor_id] else {
                    continue;
                };
                let (i, j) = self.crossword.overlap_by_id(var_id, neighbor_id)
                    .expect("neighbors always overlap");

                if word.chars.get(i) != self.crossword.word(other_id).chars.get(j) {
                    return false;
                }
            }
        }

        true
    }

    /// Choose the unassigned variable with the fewest remaining candidates, preferring the one
    /// crossing the most other variables, then the lowest in variable order. `None` means the
    /// assignment is complete.
    fn select_unassigned_variable(&self, assignment: &[Option<WordId>]) -> Option<VarId> {
        (0..assignment.len())
            .filter(|&var_id| assignment[var_id].is_none())
            .min_by_key(|&var_id| {
                (
                    self.domains.len(var_id),
                    Reverse(self.crossword.neighbor_ids(var_id).len()),
                    var_id,
                )
            })
    }

    /// Return the candidates for `var_id` ordered by how many candidates each would rule out
    /// across its unassigned neighbors, fewest first.
    fn order_domain_values(&self, var_id: VarId, assignment: &[Option<WordId>]) -> Vec<WordId> {
        // For each unassigned neighbor, the cell of ours that it crosses, its domain size, and how
        // many of its candidates put each letter in the shared cell.
        let neighbor_letter_counts: Vec<(usize, usize, HashMap<char, usize>)> = self.crossword
            .neighbor_ids(var_id)
            .iter()
            .filter(|&&neighbor_id| assignment[neighbor_id].is_none())
            .filter_map(|&neighbor_id| {
                let (i, j) = self.crossword.overlap_by_id(var_id, neighbor_id)?;
                let mut counts: HashMap<char, usize> = HashMap::new();
                for word_id in self.domains.iter(neighbor_id) {
                    if let Some(&c) = self.crossword.word(word_id).chars.get(j) {
                        *counts.entry(c).or_insert(0) += 1;
                    }
                }
                Some((i, self.domains.len(neighbor_id), counts))
            })
            .collect();

        let mut scored: Vec<(usize, WordId)> = self.domains.iter(var_id).map(|word_id| {
            let word = self.crossword.word(word_id);
            let ruled_out: usize = neighbor_letter_counts.iter().map(|(i, size, counts)| {
                let compatible = word.chars.get(*i).and_then(|c| counts.get(c)).copied().unwrap_or(0);
                size - compatible
            }).sum();
            (ruled_out, word_id)
        }).collect();

        scored.sort_unstable();
        scored.into_iter().map(|(_, word_id)| word_id).collect()
    }

    /// Tentatively assign `word_id` to `var_id`, shrink its domain to that word, and propagate
    /// along every arc touching it. Returns whether the search can continue below this choice.
    /// Either way the caller owns undoing it with `unassign`.
    fn assign(&mut self, var_id: VarId, word_id: WordId, assignment: &mut [Option<WordId>]) -> bool {
        assignment[var_id] = Some(word_id);
        self.domains.restrict_to(var_id, word_id);

        let arcs: Vec<DirectedArc> = self.crossword.neighbor_ids(var_id)
            .iter()
            .flat_map(|&neighbor_id| [(var_id, neighbor_id), (neighbor_id, var_id)])
            .collect();

        arc_consistency::ac3(self.crossword, &mut self.domains, Some(arcs)).is_ok()
            && self.consistent(assignment)
    }

    fn unassign(&mut self, var_id: VarId, mark: Mark, assignment: &mut [Option<WordId>]) {
        assignment[var_id] = None;
        self.domains.rollback(mark);
    }

    fn check_budget(&self, statistics: &Statistics, start: Instant) -> Result<(), SolveFailure> {
        let over_states = self.config.max_states.map_or(false, |max| statistics.states > max);
        let over_time = self.config.time_limit.map_or(false, |limit| start.elapsed() >= limit);

        if over_states || over_time {
            debug!("giving up after {} states", statistics.states);
            return Err(SolveFailure::BudgetExhausted);
        }
        Ok(())
    }

    /// Depth-first search from an empty assignment. Each `Frame` on the stack is one level of
    /// recursion; popping an exhausted frame hands control back to its parent, which undoes its
    /// own choice and moves on to its next candidate.
    fn backtrack(
        &mut self,
        statistics: &mut Statistics,
        start: Instant,
    ) -> Result<Vec<Option<WordId>>, SolveFailure> {
        let variable_count = self.crossword.variables().len();
        let mut assignment: Vec<Option<WordId>> = vec![None; variable_count];
        let mut stack: Vec<Frame> = Vec::with_capacity(variable_count);

        'descend: loop {
            let Some(var_id) = self.select_unassigned_variable(&assignment) else {
                return Ok(assignment);
            };

            let candidates = self.order_domain_values(var_id, &assignment);
            trace!(
                "depth {}: {} with {} candidates",
                stack.len(),
                self.crossword.variable(var_id),
                candidates.len(),
            );
            stack.push(Frame { var_id, candidates, cursor: 0, mark: self.domains.mark() });

            while let Some(frame) = stack.last_mut() {
                if assignment[frame.var_id].is_some() {
                    self.unassign(frame.var_id, frame.mark, &mut assignment);
                }

                let Some(&word_id) = frame.candidates.get(frame.cursor) else {
                    stack.pop();
                    statistics.backtracks += 1;
                    continue;
                };
                frame.cursor += 1;

                statistics.states += 1;
                self.check_budget(statistics, start)?;

                if self.assign(frame.var_id, word_id, &mut assignment) {
                    continue 'descend;
                }
            }

            return Err(SolveFailure::Unsatisfiable);
        }
    }

    /// Enforce node and arc consistency, then search. The solver is consumed since the domain
    /// store is left in whatever state the search ended in.
    pub fn run(mut self) -> Result<Solution, SolveFailure> {
        let start = Instant::now();
        let mut statistics = Statistics::default();

        info!(
            "Solving {} variables with {} words",
            self.crossword.variables().len(),
            self.crossword.words().len(),
        );

        self.enforce_node_consistency();

        let result = match self.ac3(None) {
            Ok(()) => self.backtrack(&mut statistics, start),
            Err(failure) => {
                debug!(
                    "initial arc consistency emptied the domain of {}",
                    self.crossword.variable(failure.var_id),
                );
                Err(SolveFailure::Unsatisfiable)
            }
        };
        statistics.duration = start.elapsed();

        match result {
            Ok(assignment) => {
                info!("Found a fill: {:?}", statistics);
                let assignment = assignment.into_iter()
                    .enumerate()
                    .filter_map(|(var_id, word_id)| {
                        let word_id = word_id?;
                        Some((
                            self.crossword.variable(var_id),
                            self.crossword.word(word_id).string.clone(),
                        ))
                    })
                    .collect();
                Ok(Solution { assignment, statistics })
            }
            Err(failure) => {
                info!("{}: {:?}", failure, statistics);
                Err(failure)
            }
        }
    }

    /// Search without a budget; `None` means the puzzle has no valid fill.
    pub fn solve(self) -> Option<Assignment> {
        self.run().ok().map(|solution| solution.assignment)
    }
}

/// Fill the crossword, or return `None` if it can't be filled.
pub fn solve(crossword: &Crossword) -> Option<Assignment> {
    Solver::new(crossword).solve()
}
