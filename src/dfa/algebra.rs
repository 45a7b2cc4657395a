//! Intersection and complement, realised as regex nodes by round-tripping
//! through a DFA: build a local DFA for the operand subtree(s), apply the
//! DFA-level algebra, then convert the resulting DFA back into a regex
//! fragment via GNFA state elimination. Grounded on
//! `original_source/regex.cc`'s `e1()`/`e4()` (which build a temporary DFA
//! for `&`/`!` and call `CreateRegexFromDFA`) and `CreateRegexFromDFA` itself.

use std::collections::HashMap;

use super::build::build_dfa;
use super::Dfa;
use crate::expr::{ByteSet, ExprId, ExprKind, ExprTree};

const LOCAL_STATE_LIMIT: usize = 1 << 20;

/// Deep-copies the subtree at `root` into a fresh, independently numbered
/// `ExprTree` terminated with its own `Eop`, so it can be subset-constructed
/// in isolation from the outer parse in progress.
fn local_dfa(tree: &ExprTree, root: ExprId) -> Dfa {
    let mut local = ExprTree::new();
    let copy = deep_copy(tree, &mut local, root);
    let eop = local.leaf(ExprKind::Eop);
    let local_root = local.concat(copy, eop);
    local.set_root(local_root);
    local.number_states();
    local.fill_transition();
    let limit = (local.state_count() as usize).saturating_pow(3).max(64).min(LOCAL_STATE_LIMIT);
    build_dfa(&local, limit).unwrap_or_else(|_| {
        log::warn!("intersection/complement operand exceeded the local DFA state limit; truncating to a trap-only DFA");
        trap_only_dfa()
    })
}

fn trap_only_dfa() -> Dfa {
    let mut dfa = Dfa {
        transition: vec![[super::REJECT; 256]],
        accept: vec![false],
        default_next: vec![super::NONE],
        dst_states: vec![Default::default()],
        src_states: vec![Default::default()],
    };
    dfa.set_state_info();
    dfa
}

fn deep_copy(src: &ExprTree, dst: &mut ExprTree, id: ExprId) -> ExprId {
    match src.get(id).kind.clone() {
        ExprKind::None => dst.leaf(ExprKind::None),
        ExprKind::Eop => dst.leaf(ExprKind::Eop),
        ExprKind::Literal(b) => dst.leaf(ExprKind::Literal(b)),
        ExprKind::Dot => dst.leaf(ExprKind::Dot),
        ExprKind::CharClass(s) => dst.leaf(ExprKind::CharClass(s)),
        ExprKind::BegLine => dst.leaf(ExprKind::BegLine),
        ExprKind::EndLine => dst.leaf(ExprKind::EndLine),
        ExprKind::Concat(l, r) => {
            let l2 = deep_copy(src, dst, l);
            let r2 = deep_copy(src, dst, r);
            dst.concat(l2, r2)
        }
        ExprKind::Union(l, r) => {
            let l2 = deep_copy(src, dst, l);
            let r2 = deep_copy(src, dst, r);
            dst.union(l2, r2)
        }
        ExprKind::Star(x) => {
            let x2 = deep_copy(src, dst, x);
            dst.star(x2)
        }
        ExprKind::Plus(x) => {
            let x2 = deep_copy(src, dst, x);
            dst.plus(x2)
        }
        ExprKind::Qmark(x) => {
            let x2 = deep_copy(src, dst, x);
            dst.qmark(x2)
        }
    }
}

pub fn intersect_exprs(tree: &mut ExprTree, a: ExprId, b: ExprId) -> ExprId {
    let dfa_a = local_dfa(tree, a);
    let dfa_b = local_dfa(tree, b);
    let mut product = Dfa::intersect(&dfa_a, &dfa_b);
    product.minimize();
    dfa_to_regex(tree, &product)
}

pub fn complement_expr(tree: &mut ExprTree, a: ExprId) -> ExprId {
    let mut dfa_a = local_dfa(tree, a);
    dfa_a.complement();
    dfa_a.minimize();
    dfa_to_regex(tree, &dfa_a)
}

/// GNFA state elimination (Brzozowski/Kleene's algorithm), grounded on
/// `original_source/regex.cc::CreateRegexFromDFA`. `GSTART`/`GACCEPT` are
/// synthetic node ids appended after the DFA's own `0..n` states.
pub fn dfa_to_regex(tree: &mut ExprTree, dfa: &Dfa) -> ExprId {
    let n = dfa.state_count();
    let gstart = n;
    let gaccept = n + 1;

    // Merging two parallel edges where exactly one is the `None` (epsilon)
    // label needs care: `ExprTree::union` treats `None` as an identity
    // element and elides it, which would silently drop "accept/stay here"
    // in favour of "take the other edge". `CreateRegexFromDFA`
    // (`original_source/regex.cc:710-737`) avoids this by wrapping the
    // non-null alternative in a `Qmark` instead of unioning it away, so
    // both alternatives survive: `Qmark(x)` is nullable (keeps the epsilon
    // alternative) and still matches `x` (keeps the other alternative).
    let mut edges: HashMap<(usize, usize), ExprId> = HashMap::new();
    let mut add_edge = |edges: &mut HashMap<(usize, usize), ExprId>, tree: &mut ExprTree, from: usize, to: usize, label: ExprId| {
        match edges.get(&(from, to)) {
            Some(&existing) => {
                let merged = match (tree.is_none(existing), tree.is_none(label)) {
                    (true, true) => existing,
                    (true, false) => tree.qmark(label),
                    (false, true) => tree.qmark(existing),
                    (false, false) => tree.union(existing, label),
                };
                edges.insert((from, to), merged);
            }
            None => {
                edges.insert((from, to), label);
            }
        }
    };

    let eps = tree.leaf(ExprKind::None);
    add_edge(&mut edges, tree, gstart, 0, eps);
    for s in 0..n {
        if dfa.accept[s] {
            let eps = tree.leaf(ExprKind::None);
            add_edge(&mut edges, tree, s, gaccept, eps);
        }
    }

    // Merge per-(src,dst) byte sets before building edges, so parallel
    // single-byte transitions collapse into one `CharClass` label.
    let mut byte_sets: HashMap<(usize, usize), ByteSet> = HashMap::new();
    for s in 0..n {
        for c in 0..256usize {
            let t = dfa.transition[s][c];
            if t == super::REJECT {
                continue;
            }
            byte_sets.entry((s, t as usize)).or_insert_with(ByteSet::empty).insert(c as u8);
        }
    }
    for ((s, t), set) in byte_sets {
        let label = tree.leaf(ExprKind::CharClass(set));
        add_edge(&mut edges, tree, s, t, label);
    }

    for r in 0..n {
        let incoming: Vec<(usize, ExprId)> = edges
            .iter()
            .filter_map(|(&(i, o), &l)| if o == r && i != r { Some((i, l)) } else { None })
            .collect();
        let outgoing: Vec<(usize, ExprId)> = edges
            .iter()
            .filter_map(|(&(i, o), &l)| if i == r && o != r { Some((o, l)) } else { None })
            .collect();
        let self_loop = edges.get(&(r, r)).copied();

        edges.retain(|&(i, o), _| i != r && o != r);

        for &(i, label_i) in &incoming {
            for &(o, label_o) in &outgoing {
                let li = tree.clone_subtree(label_i);
                let lo = tree.clone_subtree(label_o);
                let mid = match self_loop {
                    Some(sl) => {
                        let sl_copy = tree.clone_subtree(sl);
                        let star = tree.star(sl_copy);
                        let left = tree.concat(li, star);
                        tree.concat(left, lo)
                    }
                    None => tree.concat(li, lo),
                };
                add_edge(&mut edges, tree, i, o, mid);
            }
        }
    }

    match edges.get(&(gstart, gaccept)) {
        Some(&label) => label,
        // Empty language: a position that can never match, per DESIGN.md.
        None => tree.leaf(ExprKind::CharClass(ByteSet::empty())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::Parser;

    fn accepts(tree: &ExprTree, root: ExprId, input: &[u8]) -> bool {
        // brute-force NFA simulation over first/last/follow, for testing
        // dfa_to_regex output independent of the DFA builder.
        let mut eop_positions = Vec::new();
        for s in 0..tree.state_count() as u32 {
            if tree.is_eop(s) {
                eop_positions.push(s);
            }
        }
        let mut current: Vec<u32> = tree.get(root).transition.first.clone();
        for &b in input {
            let mut next = Vec::new();
            for &p in &current {
                if tree.match_byte(p, b) {
                    next.extend_from_slice(tree.follow(p));
                }
            }
            next.sort_unstable();
            next.dedup();
            current = next;
        }
        current.iter().any(|c| eop_positions.contains(c))
    }

    #[test]
    fn complement_of_single_literal() {
        let out = Parser::parse("!a", 16).unwrap();
        let mut tree = out.tree;
        tree.number_states();
        tree.fill_transition();
        assert!(!accepts(&tree, tree.root(), b"a"));
        assert!(accepts(&tree, tree.root(), b"b"));
    }

    #[test]
    fn intersection_is_conjunctive_on_literals() {
        let out = Parser::parse("(a|b)&(b|c)", 16).unwrap();
        let mut tree = out.tree;
        tree.number_states();
        tree.fill_transition();
        assert!(accepts(&tree, tree.root(), b"b"));
        assert!(!accepts(&tree, tree.root(), b"a"));
        assert!(!accepts(&tree, tree.root(), b"c"));
    }
}
