//! Subset construction (NFA -> DFA), bounded by `state_limit`. Grounded on
//! `original_source/regex.cc::Regex::Compile`, which caps the same
//! construction at `positions^3` by default.

use std::collections::HashMap;
use std::collections::VecDeque;

use super::{Dfa, NONE, REJECT};
use crate::expr::{ExprTree, StateId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("DFA construction exceeded the state limit of {0}")]
pub struct DfaBuildError(pub usize);

/// Builds a DFA from `tree`'s position automaton via subset construction.
/// Each DFA state is a sorted, deduplicated subset of `StateId`s; subsets are
/// hash-consed so structurally identical subsets collapse to one state.
pub fn build_dfa(tree: &ExprTree, state_limit: usize) -> Result<Dfa, DfaBuildError> {
    let eop: Vec<bool> = (0..tree.state_count() as StateId)
        .map(|s| tree.is_eop(s))
        .collect();

    let mut subset_id: HashMap<Vec<StateId>, i32> = HashMap::new();
    let mut subsets: Vec<Vec<StateId>> = Vec::new();
    let mut transition: Vec<[i32; 256]> = Vec::new();
    let mut accept: Vec<bool> = Vec::new();
    let mut worklist: VecDeque<i32> = VecDeque::new();

    let mut initial: Vec<StateId> = tree.first_root().to_vec();
    initial.sort_unstable();
    initial.dedup();

    let mut intern = |subset: Vec<StateId>,
                      subsets: &mut Vec<Vec<StateId>>,
                      subset_id: &mut HashMap<Vec<StateId>, i32>,
                      transition: &mut Vec<[i32; 256]>,
                      accept: &mut Vec<bool>,
                      worklist: &mut VecDeque<i32>|
     -> Result<i32, DfaBuildError> {
        if let Some(&id) = subset_id.get(&subset) {
            return Ok(id);
        }
        if subsets.len() >= state_limit {
            return Err(DfaBuildError(state_limit));
        }
        let id = subsets.len() as i32;
        let accepts = subset.iter().any(|&s| eop[s as usize]);
        subset_id.insert(subset.clone(), id);
        subsets.push(subset);
        transition.push([REJECT; 256]);
        accept.push(accepts);
        worklist.push_back(id);
        Ok(id)
    };

    let start = intern(
        initial,
        &mut subsets,
        &mut subset_id,
        &mut transition,
        &mut accept,
        &mut worklist,
    )?;
    debug_assert_eq!(start, 0);

    while let Some(id) = worklist.pop_front() {
        let subset = subsets[id as usize].clone();
        for c in 0..256u16 {
            let c = c as u8;
            let mut next: Vec<StateId> = Vec::new();
            for &p in &subset {
                if tree.match_byte(p, c) {
                    next.extend_from_slice(tree.follow(p));
                }
            }
            if next.is_empty() {
                continue;
            }
            next.sort_unstable();
            next.dedup();
            let next_id = intern(
                next,
                &mut subsets,
                &mut subset_id,
                &mut transition,
                &mut accept,
                &mut worklist,
            )?;
            transition[id as usize][c as usize] = next_id;
        }
    }

    let n = transition.len();
    let mut dfa = Dfa {
        transition,
        accept,
        default_next: vec![NONE; n],
        dst_states: vec![Default::default(); n],
        src_states: vec![Default::default(); n],
    };
    dfa.set_state_info();
    Ok(dfa)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ExprKind;

    #[test]
    fn builds_small_dfa_for_literal_concat() {
        let mut tree = ExprTree::new();
        let a = tree.leaf(ExprKind::Literal(b'a'));
        let b = tree.leaf(ExprKind::Literal(b'b'));
        let cat = tree.concat(a, b);
        let eop = tree.leaf(ExprKind::Eop);
        let root = tree.concat(cat, eop);
        tree.set_root(root);
        tree.number_states();
        tree.fill_transition();

        let dfa = build_dfa(&tree, 1000).unwrap();
        let s1 = dfa.transition[0][b'a' as usize];
        assert_ne!(s1, REJECT);
        let s2 = dfa.transition[s1 as usize][b'b' as usize];
        assert_ne!(s2, REJECT);
        assert!(dfa.accept[s2 as usize]);
        assert_eq!(dfa.transition[0][b'x' as usize], REJECT);
    }

    #[test]
    fn respects_state_limit() {
        let mut tree = ExprTree::new();
        let mut e = tree.leaf(ExprKind::Literal(b'a'));
        for _ in 0..8 {
            let next = tree.leaf(ExprKind::Literal(b'a'));
            let u = tree.union(e, next);
            e = u;
        }
        let eop = tree.leaf(ExprKind::Eop);
        let root = tree.concat(e, eop);
        tree.set_root(root);
        tree.number_states();
        tree.fill_transition();
        assert!(build_dfa(&tree, 1).is_err());
    }
}
