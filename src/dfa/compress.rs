//! `AlterTrans` row compression: reduce a 256-entry DFA row to at most two
//! contiguous byte-range successors plus a modal default, and `inline_level`
//! computation for chain fusion. Grounded on
//! `original_source/dfa.cc::EliminateBranch` and `::Reduce`.

use super::{Dfa, NONE, REJECT};

/// A compressed row: outside `[begin1,end1]` and `[begin2,end2]`, `default`
/// applies. `next1`/`next2` are `NONE` when that slot is unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlterTrans {
    pub next1: i32,
    pub begin1: u8,
    pub end1: u8,
    pub next2: i32,
    pub begin2: u8,
    pub end2: u8,
    /// `NONE` means this row could not be compressed to <=2 ranges; the
    /// caller must fall back to the full table for this state.
    pub default: i32,
}

impl AlterTrans {
    pub fn is_compressed(&self) -> bool {
        self.default != NONE
    }
}

/// Computes the `AlterTrans` form of one DFA row. `row[c]` may be `REJECT`;
/// compression treats `REJECT` as an ordinary target value like any other.
pub fn compute_row(row: &[i32; 256]) -> AlterTrans {
    let mut counts: std::collections::BTreeMap<i32, u32> = std::collections::BTreeMap::new();
    for &t in row.iter() {
        *counts.entry(t).or_insert(0) += 1;
    }
    let default = *counts
        .iter()
        .max_by_key(|&(_, &c)| c)
        .map(|(t, _)| t)
        .unwrap();

    let mut runs: Vec<(i32, u8, u8)> = Vec::new();
    let mut i: usize = 0;
    while i < 256 {
        if row[i] != default {
            let target = row[i];
            let begin = i as u8;
            let mut end = begin;
            while i + 1 < 256 && row[i + 1] == target {
                i += 1;
                end = i as u8;
            }
            runs.push((target, begin, end));
        }
        i += 1;
    }

    if runs.len() > 2 {
        return AlterTrans {
            next1: NONE,
            begin1: 0,
            end1: 0,
            next2: NONE,
            begin2: 0,
            end2: 0,
            default: NONE,
        };
    }
    let (next1, begin1, end1) = runs.first().copied().unwrap_or((NONE, 0, 0));
    let (next2, begin2, end2) = runs.get(1).copied().unwrap_or((NONE, 0, 0));
    AlterTrans {
        next1,
        begin1,
        end1,
        next2,
        begin2,
        end2,
        default,
    }
}

pub fn compute_all(dfa: &Dfa) -> Vec<AlterTrans> {
    dfa.transition.iter().map(compute_row).collect()
}

/// How many states deep a linear, single-predecessor, non-accepting,
/// compressible chain extends from each state. Used by the dispatch backend
/// to fuse consecutive byte comparisons into one combined check, mirroring
/// `original_source/dfa.cc::Reduce`'s `inline_level`.
pub const MAX_INLINE_DEPTH: u32 = 8;

pub fn compute_inline_levels(dfa: &Dfa, alter: &[AlterTrans]) -> Vec<u32> {
    let n = dfa.state_count();
    let mut level = vec![0u32; n];
    // Process in reverse topological-ish order by iterating until fixpoint;
    // chains are short in practice so a bounded number of passes suffices.
    for _ in 0..MAX_INLINE_DEPTH {
        let mut changed = false;
        for s in 0..n {
            if dfa.accept[s] || !alter[s].is_compressed() {
                continue;
            }
            let succ = alter[s].default;
            if succ == REJECT || succ as usize == s {
                continue;
            }
            let succ = succ as usize;
            if dfa.src_states[succ].len() != 1 {
                continue;
            }
            let candidate = (level[succ] + 1).min(MAX_INLINE_DEPTH);
            if candidate > level[s] {
                level[s] = candidate;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    level
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compresses_a_two_range_row() {
        let mut row = [7i32; 256];
        for c in b'a'..=b'z' {
            row[c as usize] = 1;
        }
        for c in b'0'..=b'9' {
            row[c as usize] = 2;
        }
        let at = compute_row(&row);
        assert!(at.is_compressed());
        assert_eq!(at.default, 7);
    }

    #[test]
    fn three_distinct_targets_are_uncompressed() {
        let mut row = [0i32; 256];
        row[10] = 1;
        row[20] = 2;
        row[30] = 3;
        let at = compute_row(&row);
        assert!(!at.is_compressed());
    }
}
