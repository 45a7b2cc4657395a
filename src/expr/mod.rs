//! The expression tree: a tagged arena of regex nodes carrying Glushkov
//! first/last/follow position sets.
//!
//! Unlike a pointer- or `Rc`-based tree, nodes live in a flat `Vec` indexed by
//! [`ExprId`]. `Star`/`Plus` self-loops are expressed purely through the
//! `follow` relation, so the arena never needs a cycle-breaking smart pointer.

pub mod charclass;

use std::collections::BTreeMap;

pub use charclass::ByteSet;

/// Index into the node arena. Dense over *all* nodes, including interior
/// `Concat`/`Union`/`Star` nodes.
pub type ExprId = u32;

/// Index assigned only to state-bearing leaf nodes, dense in `[0, N)`. This is
/// the "position" of Glushkov's construction and the row index used
/// throughout the DFA builder.
pub type StateId = u32;

/// Which group(s) a position enters or leaves. Parsed but never surfaced as
/// extracted spans (capture extraction is a Non-goal).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureTag {
    pub enter: Vec<u32>,
    pub leave: Vec<u32>,
}

/// `first`/`last` position sets for a node, and whether it accepts the empty
/// string. Populated by [`fill_transition`].
#[derive(Debug, Clone, Default)]
pub struct Transition {
    pub nullable: bool,
    pub first: Vec<StateId>,
    pub last: Vec<StateId>,
}

fn merge_sorted(a: &[StateId], b: &[StateId]) -> Vec<StateId> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    out.extend_from_slice(a);
    out.extend_from_slice(b);
    out.sort_unstable();
    out.dedup();
    out
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    /// The empty language's identity element: nullable, contributes no
    /// positions. See DESIGN.md for why this is *not* the absorbing empty
    /// language the data model prose suggests.
    None,
    /// Synthetic terminal appended once per top-level pattern.
    Eop,
    Literal(u8),
    Dot,
    CharClass(ByteSet),
    BegLine,
    EndLine,
    Concat(ExprId, ExprId),
    Union(ExprId, ExprId),
    Star(ExprId),
    Plus(ExprId),
    Qmark(ExprId),
}

#[derive(Debug, Clone)]
pub struct ExprNode {
    pub kind: ExprKind,
    pub state_id: Option<StateId>,
    pub transition: Transition,
    pub tag: CaptureTag,
}

impl ExprNode {
    fn leaf(kind: ExprKind) -> Self {
        ExprNode {
            kind,
            state_id: None,
            transition: Transition::default(),
            tag: CaptureTag::default(),
        }
    }
}

/// Whether `kind` is one of the position-bearing leaf kinds: everything that
/// consumes exactly one input byte. `BegLine`/`EndLine` are deliberately
/// excluded — matching is always whole-input (Non-goal: partial/anchored
/// modes), so "start of input"/"end of input" are trivially true at the
/// pattern's own boundaries and behave exactly like `None` (zero positions,
/// always nullable) rather than consuming a byte.
fn is_state_bearing(kind: &ExprKind) -> bool {
    matches!(
        kind,
        ExprKind::Eop | ExprKind::Literal(_) | ExprKind::Dot | ExprKind::CharClass(_)
    )
}

pub struct ExprTree {
    nodes: Vec<ExprNode>,
    root: ExprId,
    /// `StateId -> ExprId` of the owning leaf, populated by `number_states`.
    state_owner: Vec<ExprId>,
    follow: Vec<Vec<StateId>>,
}

impl ExprTree {
    pub fn new() -> Self {
        ExprTree {
            nodes: Vec::new(),
            root: 0,
            state_owner: Vec::new(),
            follow: Vec::new(),
        }
    }

    pub fn push(&mut self, node: ExprNode) -> ExprId {
        let id = self.nodes.len() as ExprId;
        self.nodes.push(node);
        id
    }

    pub fn leaf(&mut self, kind: ExprKind) -> ExprId {
        self.push(ExprNode::leaf(kind))
    }

    pub fn get(&self, id: ExprId) -> &ExprNode {
        &self.nodes[id as usize]
    }

    pub fn get_mut(&mut self, id: ExprId) -> &mut ExprNode {
        &mut self.nodes[id as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn set_root(&mut self, root: ExprId) {
        self.root = root;
    }

    pub fn root(&self) -> ExprId {
        self.root
    }

    pub fn is_none(&self, id: ExprId) -> bool {
        matches!(self.get(id).kind, ExprKind::None)
    }

    /// Concatenation, eliding `None` operands (identity element). See
    /// DESIGN.md "`None` semantics".
    pub fn concat(&mut self, a: ExprId, b: ExprId) -> ExprId {
        if self.is_none(a) {
            return b;
        }
        if self.is_none(b) {
            return a;
        }
        self.push(ExprNode::leaf(ExprKind::Concat(a, b)))
    }

    /// Union, eliding `None` operands (identity element).
    pub fn union(&mut self, a: ExprId, b: ExprId) -> ExprId {
        if self.is_none(a) {
            return b;
        }
        if self.is_none(b) {
            return a;
        }
        self.push(ExprNode::leaf(ExprKind::Union(a, b)))
    }

    pub fn star(&mut self, a: ExprId) -> ExprId {
        if self.is_none(a) {
            return a;
        }
        self.push(ExprNode::leaf(ExprKind::Star(a)))
    }

    pub fn plus(&mut self, a: ExprId) -> ExprId {
        if self.is_none(a) {
            return a;
        }
        self.push(ExprNode::leaf(ExprKind::Plus(a)))
    }

    pub fn qmark(&mut self, a: ExprId) -> ExprId {
        if self.is_none(a) {
            return a;
        }
        self.push(ExprNode::leaf(ExprKind::Qmark(a)))
    }

    /// Deep-clones the subtree rooted at `id`, used by `{m,n}` repetition
    /// rewriting (each copy needs independent positions).
    pub fn clone_subtree(&mut self, id: ExprId) -> ExprId {
        let kind = match self.get(id).kind.clone() {
            ExprKind::None => ExprKind::None,
            ExprKind::Eop => ExprKind::Eop,
            ExprKind::Literal(b) => ExprKind::Literal(b),
            ExprKind::Dot => ExprKind::Dot,
            ExprKind::CharClass(set) => ExprKind::CharClass(set),
            ExprKind::BegLine => ExprKind::BegLine,
            ExprKind::EndLine => ExprKind::EndLine,
            ExprKind::Concat(l, r) => {
                let l2 = self.clone_subtree(l);
                let r2 = self.clone_subtree(r);
                ExprKind::Concat(l2, r2)
            }
            ExprKind::Union(l, r) => {
                let l2 = self.clone_subtree(l);
                let r2 = self.clone_subtree(r);
                ExprKind::Union(l2, r2)
            }
            ExprKind::Star(x) => ExprKind::Star(self.clone_subtree(x)),
            ExprKind::Plus(x) => ExprKind::Plus(self.clone_subtree(x)),
            ExprKind::Qmark(x) => ExprKind::Qmark(self.clone_subtree(x)),
        };
        let tag = self.get(id).tag.clone();
        let mut node = ExprNode::leaf(kind);
        node.tag = tag;
        self.push(node)
    }

    /// Assigns dense [`StateId`]s to every state-bearing leaf, visiting the
    /// tree left-to-right. Must run before [`fill_transition`].
    pub fn number_states(&mut self) {
        self.state_owner.clear();
        let root = self.root;
        self.number_rec(root);
        self.follow = vec![Vec::new(); self.state_owner.len()];
    }

    fn number_rec(&mut self, id: ExprId) {
        let kind = self.get(id).kind.clone();
        match kind {
            ExprKind::Concat(l, r) | ExprKind::Union(l, r) => {
                self.number_rec(l);
                self.number_rec(r);
            }
            ExprKind::Star(x) | ExprKind::Plus(x) | ExprKind::Qmark(x) => {
                self.number_rec(x);
            }
            ExprKind::None => {}
            _ if is_state_bearing(&kind) => {
                let sid = self.state_owner.len() as StateId;
                self.state_owner.push(id);
                self.get_mut(id).state_id = Some(sid);
            }
            _ => {}
        }
    }

    pub fn state_count(&self) -> usize {
        self.state_owner.len()
    }

    pub fn state_owner(&self, sid: StateId) -> ExprId {
        self.state_owner[sid as usize]
    }

    pub fn follow(&self, sid: StateId) -> &[StateId] {
        &self.follow[sid as usize]
    }

    fn add_follow(&mut self, positions: &[StateId], additions: &[StateId]) {
        if additions.is_empty() {
            return;
        }
        for &p in positions {
            let slot = &mut self.follow[p as usize];
            let merged = merge_sorted(slot, additions);
            *slot = merged;
        }
    }

    /// Computes `nullable`/`first`/`last` for every node bottom-up, and
    /// `follow` for every position, via the standard Glushkov rules.
    /// Must run after [`number_states`].
    pub fn fill_transition(&mut self) {
        let root = self.root;
        self.fill_rec(root);
    }

    fn fill_rec(&mut self, id: ExprId) -> Transition {
        let kind = self.get(id).kind.clone();
        let t = match kind {
            ExprKind::None => Transition {
                nullable: true,
                first: Vec::new(),
                last: Vec::new(),
            },
            ExprKind::Concat(l, r) => {
                let tl = self.fill_rec(l);
                let tr = self.fill_rec(r);
                self.add_follow(&tl.last, &tr.first);
                let first = if tl.nullable {
                    merge_sorted(&tl.first, &tr.first)
                } else {
                    tl.first.clone()
                };
                let last = if tr.nullable {
                    merge_sorted(&tr.last, &tl.last)
                } else {
                    tr.last.clone()
                };
                Transition {
                    nullable: tl.nullable && tr.nullable,
                    first,
                    last,
                }
            }
            ExprKind::Union(l, r) => {
                let tl = self.fill_rec(l);
                let tr = self.fill_rec(r);
                Transition {
                    nullable: tl.nullable || tr.nullable,
                    first: merge_sorted(&tl.first, &tr.first),
                    last: merge_sorted(&tl.last, &tr.last),
                }
            }
            ExprKind::Star(x) => {
                let tx = self.fill_rec(x);
                self.add_follow(&tx.last, &tx.first);
                Transition {
                    nullable: true,
                    first: tx.first,
                    last: tx.last,
                }
            }
            ExprKind::Plus(x) => {
                let tx = self.fill_rec(x);
                self.add_follow(&tx.last, &tx.first);
                Transition {
                    nullable: tx.nullable,
                    first: tx.first,
                    last: tx.last,
                }
            }
            ExprKind::Qmark(x) => {
                let tx = self.fill_rec(x);
                Transition {
                    nullable: true,
                    first: tx.first,
                    last: tx.last,
                }
            }
            ExprKind::BegLine | ExprKind::EndLine => Transition {
                nullable: true,
                first: Vec::new(),
                last: Vec::new(),
            },
            _ => {
                let sid = self
                    .get(id)
                    .state_id
                    .expect("state-bearing leaf must be numbered before fill_transition");
                Transition {
                    nullable: false,
                    first: vec![sid],
                    last: vec![sid],
                }
            }
        };
        self.get_mut(id).transition = t.clone();
        t
    }

    /// Whether the leaf owning `sid` matches byte `b`.
    pub fn match_byte(&self, sid: StateId, b: u8) -> bool {
        match &self.get(self.state_owner(sid)).kind {
            ExprKind::Eop => false,
            ExprKind::Literal(lit) => *lit == b,
            ExprKind::Dot => b != b'\n',
            ExprKind::CharClass(set) => set.contains(b),
            ExprKind::BegLine | ExprKind::EndLine => false,
            _ => unreachable!("non-leaf owner for a state id"),
        }
    }

    pub fn is_eop(&self, sid: StateId) -> bool {
        matches!(self.get(self.state_owner(sid)).kind, ExprKind::Eop)
    }

    pub fn nullable_root(&self) -> bool {
        self.get(self.root).transition.nullable
    }

    pub fn first_root(&self) -> &[StateId] {
        &self.get(self.root).transition.first
    }

    /// All state ids in ascending order, convenience for building the DFA's
    /// initial subset from `first(root)`.
    pub fn follow_map(&self) -> BTreeMap<StateId, Vec<StateId>> {
        self.follow
            .iter()
            .enumerate()
            .map(|(i, v)| (i as StateId, v.clone()))
            .collect()
    }

    /// Extracts a self-contained, owned snapshot of the position automaton,
    /// for strategies (like the cached-NFA matcher) that must outlive a
    /// borrow of the tree itself.
    pub fn extract_positions(&self) -> Positions {
        let matches = self
            .state_owner
            .iter()
            .map(|&id| MatchSpec::from_kind(&self.get(id).kind))
            .collect();
        let eop = self
            .state_owner
            .iter()
            .map(|&id| matches!(self.get(id).kind, ExprKind::Eop))
            .collect();
        let mut initial = self.first_root().to_vec();
        initial.sort_unstable();
        initial.dedup();
        Positions {
            matches,
            follow: self.follow.clone(),
            eop,
            initial,
        }
    }
}

/// What a single position matches, independent of the arena that produced
/// it. Zero-width anchors never match a byte; the matcher treats them as
/// dead ends for byte-consuming simulation (capture of `^`/`$` semantics is
/// out of scope, see DESIGN.md).
#[derive(Debug, Clone, Copy)]
pub enum MatchSpec {
    Literal(u8),
    Dot,
    Class(ByteSet),
    Anchor,
    Eop,
}

impl MatchSpec {
    fn from_kind(kind: &ExprKind) -> Self {
        match kind {
            ExprKind::Literal(b) => MatchSpec::Literal(*b),
            ExprKind::Dot => MatchSpec::Dot,
            ExprKind::CharClass(set) => MatchSpec::Class(*set),
            ExprKind::BegLine | ExprKind::EndLine => MatchSpec::Anchor,
            ExprKind::Eop => MatchSpec::Eop,
            _ => unreachable!("non-leaf kind in position table"),
        }
    }

    #[inline]
    pub fn matches(&self, b: u8) -> bool {
        match self {
            MatchSpec::Literal(lit) => *lit == b,
            MatchSpec::Dot => b != b'\n',
            MatchSpec::Class(set) => set.contains(b),
            MatchSpec::Anchor | MatchSpec::Eop => false,
        }
    }
}

/// Owned snapshot of the position automaton: everything the cached-NFA
/// matcher needs, detached from the arena's lifetime.
#[derive(Debug, Clone)]
pub struct Positions {
    pub matches: Vec<MatchSpec>,
    pub follow: Vec<Vec<StateId>>,
    pub eop: Vec<bool>,
    pub initial: Vec<StateId>,
}

impl Default for ExprTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_ab() -> ExprTree {
        // matches "ab"
        let mut t = ExprTree::new();
        let a = t.leaf(ExprKind::Literal(b'a'));
        let b = t.leaf(ExprKind::Literal(b'b'));
        let cat = t.concat(a, b);
        let eop = t.leaf(ExprKind::Eop);
        let root = t.concat(cat, eop);
        t.set_root(root);
        t.number_states();
        t.fill_transition();
        t
    }

    #[test]
    fn numbers_three_states() {
        let t = build_ab();
        assert_eq!(t.state_count(), 3);
    }

    #[test]
    fn follow_chains_literals() {
        let t = build_ab();
        // state 0 = 'a', state 1 = 'b', state 2 = eop
        assert_eq!(t.follow(0), &[1]);
        assert_eq!(t.follow(1), &[2]);
        assert!(t.follow(2).is_empty());
    }

    #[test]
    fn none_is_concat_identity() {
        let mut t = ExprTree::new();
        let none = t.leaf(ExprKind::None);
        let a = t.leaf(ExprKind::Literal(b'a'));
        let cat = t.concat(none, a);
        assert_eq!(cat, a, "Concat(None, a) should elide to a");
    }

    #[test]
    fn star_self_loops_via_follow() {
        let mut t = ExprTree::new();
        let a = t.leaf(ExprKind::Literal(b'a'));
        let star = t.star(a);
        let eop = t.leaf(ExprKind::Eop);
        let root = t.concat(star, eop);
        t.set_root(root);
        t.number_states();
        t.fill_transition();
        // state 0 = 'a' follows itself and eop
        assert_eq!(t.follow(0), &[0, 1]);
    }
}
