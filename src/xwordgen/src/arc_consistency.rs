//! AC-3 over the crossing constraints. A domain store is arc-consistent when, for every pair of
//! crossing variables `(x, y)`, every candidate for `x` agrees with at least one candidate for `y`
//! on the letter in the shared cell.

use std::collections::{HashSet, VecDeque};

use log::trace;

use crate::crossword::Crossword;
use crate::domains::DomainStore;
use crate::{VarId, WordId};

/// An ordered arc: revising `(x, y)` removes candidates of `x` unsupported by `y`.
pub type DirectedArc = (VarId, VarId);

/// Result from a failed call to `ac3`, naming the variable whose domain was wiped out. The store
/// is left as it was at the moment of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub var_id: VarId,
}

pub type ArcConsistencyResult = Result<(), ArcConsistencyFailure>;

/// Worklist used by `ac3`. An arc is only enqueued if that exact arc isn't already pending.
#[derive(Debug)]
struct ArcQueue {
    queue: VecDeque<DirectedArc>,
    pending: HashSet<DirectedArc>,
}

impl ArcQueue {
    fn with_initial_queue<Items>(items: Items) -> ArcQueue
        where
            Items: IntoIterator<Item=DirectedArc>
    {
        let mut queue = ArcQueue { queue: VecDeque::new(), pending: HashSet::new() };
        for arc in items {
            queue.enqueue(arc);
        }
        queue
    }

    fn pop_front(&mut self) -> Option<DirectedArc> {
        let arc = self.queue.pop_front()?;
        self.pending.remove(&arc);
        Some(arc)
    }

    fn enqueue(&mut self, arc: DirectedArc) {
        if self.pending.insert(arc) {
            self.queue.push_back(arc);
        }
    }
}

/// Both orientations of every crossing, visiting each unordered pair once in variable order.
pub fn all_arcs(crossword: &Crossword) -> Vec<DirectedArc> {
    let mut arcs = vec![];
    for x in 0..crossword.variables().len() {
        for &y in crossword.neighbor_ids(x) {
            if x < y {
                arcs.push((x, y));
                arcs.push((y, x));
            }
        }
    }
    arcs
}

/// Make `x` arc-consistent with `y` against the current domain of `y`. Returns whether any
/// candidate was removed from `x`; variables that don't cross are left alone.
pub fn revise(crossword: &Crossword, domains: &mut DomainStore, x: VarId, y: VarId) -> bool {
    let Some((x_cell, y_cell)) = crossword.overlap_by_id(x, y) else {
        return false;
    };

    // Which letters can `y` still put in the shared cell?
    let supported: HashSet<char> = domains.iter(y)
        .filter_map(|word_id| crossword.word(word_id).chars.get(y_cell).copied())
        .collect();

    let unsupported: Vec<WordId> = domains.iter(x)
        .filter(|&word_id| {
            crossword.word(word_id).chars.get(x_cell).map_or(true, |c| !supported.contains(c))
        })
        .collect();

    for &word_id in &unsupported {
        domains.remove(x, word_id);
    }

    !unsupported.is_empty()
}

/// Run AC-3 starting from `arcs`, or from `all_arcs` if none are given. Whenever `x` loses
/// candidates, every arc `(n, x)` for the other neighbors `n` of `x` is rechecked. Fails as soon
/// as a domain is emptied, without restoring anything; rolling back is up to the caller.
pub fn ac3(
    crossword: &Crossword,
    domains: &mut DomainStore,
    arcs: Option<Vec<DirectedArc>>,
) -> ArcConsistencyResult {
    let mut queue = ArcQueue::with_initial_queue(arcs.unwrap_or_else(|| all_arcs(crossword)));

    while let Some((x, y)) = queue.pop_front() {
        if !revise(crossword, domains, x, y) {
            continue;
        }

        if domains.is_empty(x) {
            trace!("domain of {} wiped out by {}", crossword.variable(x), crossword.variable(y));
            return Err(ArcConsistencyFailure { var_id: x });
        }

        for &n in crossword.neighbor_ids(x) {
            if n != y {
                queue.enqueue((n, x));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::crossword::Crossword;
    use crate::domains::DomainStore;
    use super::{ac3, all_arcs, revise, ArcConsistencyFailure};

    fn names(crossword: &Crossword, domains: &DomainStore, var_id: usize) -> Vec<String> {
        domains.iter(var_id).map(|w| crossword.word(w).string.clone()).collect()
    }

    /// Every candidate of every variable has a partner in each crossing variable.
    fn is_arc_consistent(crossword: &Crossword, domains: &DomainStore) -> bool {
        all_arcs(crossword).into_iter().all(|(x, y)| {
            let (i, j) = crossword.overlap_by_id(x, y).unwrap();
            domains.iter(x).all(|a| {
                domains.iter(y).any(|b| crossword.word(a).chars[i] == crossword.word(b).chars[j])
            })
        })
    }

    /// ___
    /// _#_
    /// ___
    fn ring(words: &str) -> (Crossword, DomainStore) {
        let crossword = Crossword::new("___\n_#_\n___", words).unwrap();
        let mut domains = DomainStore::new(&crossword);
        domains.enforce_node_consistency(&crossword);
        (crossword, domains)
    }

    #[test]
    fn test_all_arcs_covers_both_orientations() {
        let (crossword, _) = ring("CAT");
        let arcs = all_arcs(&crossword);

        // Four crossings in the ring.
        assert_eq!(arcs.len(), 8);
        for &(x, y) in &arcs {
            assert!(arcs.contains(&(y, x)));
            assert!(crossword.overlap_by_id(x, y).is_some());
        }
    }

    #[test]
    fn test_revise() {
        let (crossword, mut domains) = ring("CAT\nCOD\nTOE\nDYE\nZIP");
        // 0 = top across, 1 = left down, 2 = right down, 3 = bottom across.

        // The last letter of the left slot starts the bottom slot.
        assert!(revise(&crossword, &mut domains, 1, 3));
        assert_eq!(names(&crossword, &domains, 1), vec!["CAT", "COD"]);

        // Nothing left to remove.
        assert!(!revise(&crossword, &mut domains, 1, 3));

        // No crossing between the two across slots.
        let before = domains.clone();
        assert!(!revise(&crossword, &mut domains, 0, 3));
        assert_eq!(domains, before);
    }

    #[test]
    fn test_revise_sees_current_domain() {
        let (crossword, mut domains) = ring("CAT\nCOD\nTOE\nDYE\nZIP");

        let toe = crossword.word_id("TOE").unwrap();
        domains.remove(3, toe);
        assert!(revise(&crossword, &mut domains, 1, 3));
        assert_eq!(names(&crossword, &domains, 1), vec!["COD"]);
    }

    #[test]
    fn test_ac3_reaches_fixpoint() {
        let (crossword, mut domains) = ring("CAT\nCOD\nTOE\nDYE\nZIP\nAPE\nOAK\nEEL");

        assert_eq!(ac3(&crossword, &mut domains, None), Ok(()));
        assert!(is_arc_consistent(&crossword, &domains));
        assert_eq!(names(&crossword, &domains, 0), vec!["APE", "CAT", "COD", "DYE", "TOE"]);
        assert_eq!(names(&crossword, &domains, 2), vec!["DYE", "EEL", "TOE"]);

        let before = domains.clone();
        assert_eq!(ac3(&crossword, &mut domains, None), Ok(()));
        assert_eq!(domains, before);
    }

    #[test]
    fn test_ac3_detects_wipeout() {
        // A 3-across crossing a 2-down at its first cell, with no shared first letter.
        let crossword = Crossword::new("___\n_##", "CAT\nOX").unwrap();
        let mut domains = DomainStore::new(&crossword);
        domains.enforce_node_consistency(&crossword);

        let result = ac3(&crossword, &mut domains, None);

        match result {
            Err(ArcConsistencyFailure { var_id }) => assert!(domains.is_empty(var_id)),
            Ok(()) => panic!("AC-3 missed an empty domain"),
        }
    }

    #[test]
    fn test_ac3_with_explicit_arcs() {
        let (crossword, mut domains) = ring("CAT\nCOD\nTOE\nDYE\nZIP");
        let cat = crossword.word_id("CAT").unwrap();
        domains.restrict_to(0, cat);

        // Only the arcs pointing at the top slot, so the bottom slot is reached by propagation.
        assert_eq!(ac3(&crossword, &mut domains, Some(vec![(1, 0), (2, 0)])), Ok(()));

        assert_eq!(names(&crossword, &domains, 1), vec!["CAT", "COD"]);
        assert_eq!(names(&crossword, &domains, 2), vec!["TOE"]);
        assert_eq!(names(&crossword, &domains, 3), vec!["DYE", "TOE"]);
    }

    #[test]
    fn test_ac3_with_no_arcs_does_nothing() {
        let (crossword, mut domains) = ring("CAT\nCOD\nTOE\nDYE\nZIP");
        let before = domains.clone();

        assert_eq!(ac3(&crossword, &mut domains, Some(vec![])), Ok(()));
        assert_eq!(domains, before);
    }
}
