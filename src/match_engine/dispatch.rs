//! The compiled dispatch backend realising `O1`-`O3`. `original_source`'s
//! `XbyakCompiler` emits real x86-64 for this job, conditionally compiled
//! behind `REGEN_ENABLE_XBYAK`, with an `#else` that makes `Compile` a no-op.
//! No crate in this workspace's dependency corpus provides executable-memory
//! codegen (see DESIGN.md), so this reproduces the same tiered structure —
//! one dispatch block per state, `AlterTrans` range checks, inline-chain
//! fusion — as a safe, pure-Rust interpreter over a small `Vec<AlterTrans>`
//! program instead of emitted machine code.

use crate::dfa::compress::{compute_all, compute_inline_levels, AlterTrans};
use crate::dfa::{Dfa, NONE, REJECT};
use crate::error::CompileLevel;

pub struct Dispatcher {
    rows: Vec<AlterTrans>,
    full: Vec<[i32; 256]>,
    accept: Vec<bool>,
    inline_level: Vec<u32>,
    use_compression: bool,
    fuse_chains: bool,
}

impl Dispatcher {
    pub fn build(dfa: &Dfa, level: CompileLevel) -> Self {
        let rows = compute_all(dfa);
        let inline_level = compute_inline_levels(dfa, &rows);
        Dispatcher {
            rows,
            full: dfa.transition.clone(),
            accept: dfa.accept.clone(),
            inline_level,
            use_compression: level >= CompileLevel::O2,
            fuse_chains: level >= CompileLevel::O3,
        }
    }

    #[inline]
    fn step(&self, state: usize, b: u8) -> i32 {
        if self.use_compression {
            let row = &self.rows[state];
            if row.is_compressed() {
                if row.next1 != NONE && b >= row.begin1 && b <= row.end1 {
                    return row.next1;
                }
                if row.next2 != NONE && b >= row.begin2 && b <= row.end2 {
                    return row.next2;
                }
                return row.default;
            }
        }
        self.full[state][b as usize]
    }

    pub fn full_match(&self, input: &[u8]) -> bool {
        let mut state: i32 = 0;
        let mut i = 0usize;
        while i < input.len() {
            state = self.step(state as usize, input[i]);
            i += 1;
            if state == REJECT {
                return false;
            }
            if self.fuse_chains {
                // Inline-chain fusion: ride a linear, single-predecessor
                // successor run without leaving this loop, the same runs
                // `original_source/dfa.cc::Reduce` identifies as fusible.
                while i < input.len() && self.inline_level[state as usize] > 0 {
                    state = self.step(state as usize, input[i]);
                    i += 1;
                    if state == REJECT {
                        return false;
                    }
                }
            }
        }
        self.accept[state as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dfa::build_dfa;

    fn dfa_for(pattern: &str) -> Dfa {
        let out = crate::parse::Parser::parse(pattern, 16).unwrap();
        let mut tree = out.tree;
        tree.number_states();
        tree.fill_transition();
        build_dfa(&tree, 10_000).unwrap()
    }

    #[test]
    fn o1_matches_like_table_interpreter() {
        let dfa = dfa_for("a(b|c)+d");
        let disp = Dispatcher::build(&dfa, CompileLevel::O1);
        assert!(disp.full_match(b"abcbcd"));
        assert!(!disp.full_match(b"abcbc"));
    }

    #[test]
    fn o3_with_fusion_agrees_with_o1() {
        let dfa = dfa_for("hello[0-9]+world");
        let o1 = Dispatcher::build(&dfa, CompileLevel::O1);
        let o3 = Dispatcher::build(&dfa, CompileLevel::O3);
        for input in [&b"hello123world"[..], b"hello world", b"helloworld", b"hello9world"] {
            assert_eq!(o1.full_match(input), o3.full_match(input), "mismatch on {:?}", input);
        }
    }
}
