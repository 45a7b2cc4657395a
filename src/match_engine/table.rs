//! The `O0` tier: a plain table-walking interpreter over the minimised DFA.
//! No compression, no fusion — the baseline every other tier is checked
//! against.

use crate::dfa::{Dfa, REJECT};

pub struct TableInterpreter<'a> {
    dfa: &'a Dfa,
}

impl<'a> TableInterpreter<'a> {
    pub fn new(dfa: &'a Dfa) -> Self {
        TableInterpreter { dfa }
    }

    pub fn full_match(&self, input: &[u8]) -> bool {
        let mut state: i32 = 0;
        for &b in input {
            state = self.dfa.transition[state as usize][b as usize];
            if state == REJECT {
                return false;
            }
        }
        self.dfa.accept[state as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dfa::build_dfa;
    use crate::parse::Parser;

    #[test]
    fn matches_simple_pattern() {
        let out = Parser::parse("[a-z]+[0-9]{2,3}", 16).unwrap();
        let mut tree = out.tree;
        tree.number_states();
        tree.fill_transition();
        let dfa = build_dfa(&tree, 10_000).unwrap();
        let interp = TableInterpreter::new(&dfa);
        assert!(interp.full_match(b"hello42"));
        assert!(interp.full_match(b"hi123"));
        assert!(!interp.full_match(b"hi1"));
        assert!(!interp.full_match(b"42"));
    }
}
