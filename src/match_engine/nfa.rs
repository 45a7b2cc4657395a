//! Cached NFA simulation (the `None`/fallback tier): the matcher that always
//! works, even when the DFA exceeded `state_limit`. Grounded on
//! `original_source/regex.cc::FullMatchNFA`: a step counter doubling as a
//! "seen" epoch, and a hash-consed subset <-> synthetic-id cache with a
//! lazily populated per-synthetic-state transition cache.
//!
//! Owns a [`Positions`] snapshot rather than borrowing the `ExprTree`, so it
//! can be cached on the engine without a lifetime parameter.

use std::collections::HashMap;

use crate::expr::{Positions, StateId};

const UNCOMPUTED: i32 = i32::MIN;
const REJECT: i32 = -1;

pub struct CachedNfa {
    positions: Positions,
    subset_to_id: HashMap<Vec<StateId>, i32>,
    id_to_subset: Vec<Vec<StateId>>,
    /// `transition_cache[id][byte]`: `UNCOMPUTED` until first queried,
    /// `REJECT` if dead, else a synthetic state id (hash-consed subset).
    transition_cache: Vec<Vec<i32>>,
    accept_cache: Vec<bool>,
}

impl CachedNfa {
    pub fn new(positions: Positions) -> Self {
        let initial = positions.initial.clone();
        let mut nfa = CachedNfa {
            positions,
            subset_to_id: HashMap::new(),
            id_to_subset: Vec::new(),
            transition_cache: Vec::new(),
            accept_cache: Vec::new(),
        };
        nfa.intern(initial);
        nfa
    }

    fn intern(&mut self, subset: Vec<StateId>) -> i32 {
        if let Some(&id) = self.subset_to_id.get(&subset) {
            return id;
        }
        let id = self.id_to_subset.len() as i32;
        let accepts = subset.iter().any(|&s| self.positions.eop[s as usize]);
        self.subset_to_id.insert(subset.clone(), id);
        self.id_to_subset.push(subset);
        self.transition_cache.push(vec![UNCOMPUTED; 256]);
        self.accept_cache.push(accepts);
        id
    }

    fn step(&mut self, state: i32, b: u8) -> i32 {
        let cached = self.transition_cache[state as usize][b as usize];
        if cached != UNCOMPUTED {
            return cached;
        }
        let subset = self.id_to_subset[state as usize].clone();
        let mut next: Vec<StateId> = Vec::new();
        for &p in &subset {
            if self.positions.matches[p as usize].matches(b) {
                next.extend_from_slice(&self.positions.follow[p as usize]);
            }
        }
        let result = if next.is_empty() {
            REJECT
        } else {
            next.sort_unstable();
            next.dedup();
            self.intern(next)
        };
        self.transition_cache[state as usize][b as usize] = result;
        result
    }

    pub fn full_match(&mut self, input: &[u8]) -> bool {
        let mut state: i32 = 0;
        for &b in input {
            state = self.step(state, b);
            if state == REJECT {
                return false;
            }
        }
        self.accept_cache[state as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::Parser;

    fn positions_for(pattern: &str) -> Positions {
        let out = Parser::parse(pattern, 16).unwrap();
        let mut tree = out.tree;
        tree.number_states();
        tree.fill_transition();
        tree.extract_positions()
    }

    #[test]
    fn matches_same_strings_as_repeated_calls() {
        let mut nfa = CachedNfa::new(positions_for("a(b|c)*d"));
        assert!(nfa.full_match(b"ad"));
        assert!(nfa.full_match(b"abcbcd"));
        assert!(!nfa.full_match(b"abcbc"));
        // repeat to exercise the transition cache
        assert!(nfa.full_match(b"abcbcd"));
    }
}
