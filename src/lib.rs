/*!
`algex`: an algebraic regular-expression engine.

Beyond the usual concatenation, alternation, repetition, grouping and
character classes, the grammar adds two algebraic operators and one
structural one:

- `a&b` — intersection: matches only strings both `a` and `b` accept.
- `!a` — complement: matches every string `a` does not.
- `(?R)` — bounded self-recursion, rewritten at parse time up to a
  configurable depth.

A pattern compiles to a minimised DFA via subset construction; intersection
and complement are realised by building a temporary DFA for their operands,
applying the DFA-level algebra, and converting the result back into a regex
fragment through GNFA state elimination. Matching itself runs at one of four
tiers, selected by [`CompileLevel`]: a cached NFA simulation that never fails
(used when the DFA would have exceeded its state budget), a table-walking
DFA interpreter, and two tiers of compiled dispatch that compress transition
rows and fuse linear successor chains.

## Usage

```
use algex::Engine;

let mut engine = Engine::builder("[a-z]+@[a-z]+\\.[a-z]{2,3}")
    .build()
    .unwrap();
assert!(engine.full_match(b"user@example.com"));
assert!(!engine.full_match(b"not an email"));
```

## Intersection and complement

```
use algex::Engine;

// Strings starting with "a" that are also 3 bytes long.
let mut engine = Engine::builder("a..&...").build().unwrap();
assert!(engine.full_match(b"abc"));
assert!(!engine.full_match(b"xyz"));
assert!(!engine.full_match(b"ab"));
```

## Submatch extraction, partial matching and Unicode-aware classes are out of
scope: patterns match the *entire* input against a byte alphabet.
*/
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod dfa;
pub mod error;
pub mod expr;
pub mod match_engine;
pub mod parse;

use bon::bon;

pub use error::{CompileLevel, ParseError};

use dfa::Dfa;
use expr::ExprTree;
use match_engine::{CachedNfa, Dispatcher, TableInterpreter};
use parse::{apply_capture_tags, Parser};

const DEFAULT_RECURSIVE_LIMIT: u32 = 4096;

/// A compiled pattern. Owns the expression tree (kept for diagnostics and
/// for `(?R)`/`&`/`!` bookkeeping), the DFA if one was successfully built,
/// and whichever compiled-dispatch tier `compile` last reached.
pub struct Engine {
    tree: ExprTree,
    dfa: Option<Dfa>,
    dispatcher: Option<Dispatcher>,
    cached_nfa: Option<CachedNfa>,
    /// Set once the DFA construction hit `state_limit`, or an `(?R)`
    /// occurrence degraded past `recursive_limit`. Not an error: the engine
    /// stays usable through the cached-NFA path.
    pub capacity_exceeded: bool,
    pub recursion_capped: bool,
    recursive_limit: u32,
    state_limit: usize,
    effective_level: Option<CompileLevel>,
}

#[bon]
impl Engine {
    /// Compiles `pattern`. `recursive_limit` bounds `(?R)` expansion depth
    /// (default 4096); `state_limit` bounds DFA subset construction (default
    /// `positions^3`, as `original_source/regex.cc::Regex::Compile` computes
    /// it); `level` is the optimisation tier attempted immediately (default
    /// `O0`, i.e. "build the DFA but don't compile dispatch yet").
    #[builder(finish_fn = build)]
    pub fn new(
        #[builder(start_fn)] pattern: &str,
        recursive_limit: Option<u32>,
        state_limit: Option<usize>,
        level: Option<CompileLevel>,
    ) -> Result<Engine, ParseError> {
        let recursive_limit = recursive_limit.unwrap_or(DEFAULT_RECURSIVE_LIMIT);
        let out = Parser::parse(pattern, recursive_limit)?;
        let mut tree = out.tree;
        tree.number_states();
        tree.fill_transition();
        apply_capture_tags(&mut tree, &out.groups);

        let state_limit = state_limit.unwrap_or_else(|| {
            (tree.state_count() as usize).saturating_pow(3).max(64)
        });

        let mut engine = Engine {
            tree,
            dfa: None,
            dispatcher: None,
            cached_nfa: None,
            capacity_exceeded: false,
            recursion_capped: out.recursion_capped,
            recursive_limit,
            state_limit,
            effective_level: None,
        };
        if engine.recursion_capped {
            log::warn!("(?R) occurrence exceeded recursive_limit={recursive_limit}; degraded to the empty language at that point");
        }
        engine.build_dfa();
        engine.compile(level.unwrap_or_default());
        Ok(engine)
    }
}

impl Engine {
    fn build_dfa(&mut self) {
        match dfa::build_dfa(&self.tree, self.state_limit) {
            Ok(dfa) => self.dfa = Some(dfa),
            Err(err) => {
                self.capacity_exceeded = true;
                log::warn!("DFA construction exceeded state_limit={}: {err}; falling back to cached-NFA matching", self.state_limit);
                self.dfa = None;
            }
        }
    }

    /// Re-attempts reaching `level`. Returns the level actually reached:
    /// lower than requested either because no DFA exists (`state_limit` was
    /// exceeded) or because the `jit` feature wasn't built (levels `O1..O3`
    /// then cap at `O0`), mirroring `original_source/regex.cc::Regex::Compile`,
    /// which is idempotent and safely re-callable.
    pub fn compile(&mut self, level: CompileLevel) -> CompileLevel {
        let dfa = match &self.dfa {
            Some(dfa) => dfa,
            None => {
                self.effective_level = None;
                self.dispatcher = None;
                return CompileLevel::O0;
            }
        };

        let reachable = if cfg!(feature = "jit") {
            level
        } else if level > CompileLevel::O0 {
            log::warn!("requested {level:?} but the `jit` feature is disabled; capping at O0");
            CompileLevel::O0
        } else {
            level
        };

        self.dispatcher = if reachable > CompileLevel::O0 {
            Some(Dispatcher::build(dfa, reachable))
        } else {
            None
        };
        self.effective_level = Some(reachable);
        reachable
    }

    /// The level last reached by `compile`, or `None` if no DFA exists and
    /// matching always goes through the cached-NFA fallback.
    pub fn effective_level(&self) -> Option<CompileLevel> {
        self.effective_level
    }

    /// Matches `input` against the whole pattern (no partial/anchored
    /// modes). Dispatches to whichever tier `compile` last reached.
    pub fn full_match(&mut self, input: &[u8]) -> bool {
        if let Some(dispatcher) = &self.dispatcher {
            return dispatcher.full_match(input);
        }
        if let Some(dfa) = &self.dfa {
            return TableInterpreter::new(dfa).full_match(input);
        }
        let nfa = self
            .cached_nfa
            .get_or_insert_with(|| CachedNfa::new(self.tree.extract_positions()));
        nfa.full_match(input)
    }

    /// Deterministic text dump of the expression tree, one line per node in
    /// prefix order. No external graph/dotty tooling (Non-goal).
    pub fn dump_expr_tree(&self) -> String {
        let mut out = String::new();
        dump_rec(&self.tree, self.tree.root(), 0, &mut out);
        out
    }

    /// Alias kept for parity with `original_source`'s `PrintParseTree`/
    /// `DumpExprTree` pair; both print the same structure in this crate.
    pub fn print_parse_tree(&self) -> String {
        self.dump_expr_tree()
    }
}

fn dump_rec(tree: &ExprTree, id: expr::ExprId, depth: usize, out: &mut String) {
    use expr::ExprKind::*;
    let indent = "  ".repeat(depth);
    let node = tree.get(id);
    match &node.kind {
        None => out.push_str(&format!("{indent}None\n")),
        Eop => out.push_str(&format!("{indent}Eop\n")),
        Literal(b) => out.push_str(&format!("{indent}Literal({:?})\n", *b as char)),
        Dot => out.push_str(&format!("{indent}Dot\n")),
        CharClass(set) => out.push_str(&format!("{indent}CharClass({:?})\n", set)),
        BegLine => out.push_str(&format!("{indent}BegLine\n")),
        EndLine => out.push_str(&format!("{indent}EndLine\n")),
        Concat(l, r) => {
            out.push_str(&format!("{indent}Concat\n"));
            let (l, r) = (*l, *r);
            dump_rec(tree, l, depth + 1, out);
            dump_rec(tree, r, depth + 1, out);
        }
        Union(l, r) => {
            out.push_str(&format!("{indent}Union\n"));
            let (l, r) = (*l, *r);
            dump_rec(tree, l, depth + 1, out);
            dump_rec(tree, r, depth + 1, out);
        }
        Star(x) => {
            out.push_str(&format!("{indent}Star\n"));
            dump_rec(tree, *x, depth + 1, out);
        }
        Plus(x) => {
            out.push_str(&format!("{indent}Plus\n"));
            dump_rec(tree, *x, depth + 1, out);
        }
        Qmark(x) => {
            out.push_str(&format!("{indent}Qmark\n"));
            dump_rec(tree, *x, depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_reach_o0() {
        let engine = Engine::builder("abc").build().unwrap();
        assert_eq!(engine.effective_level(), Some(CompileLevel::O0));
    }

    #[test]
    fn full_match_whole_input_only() {
        let mut engine = Engine::builder("abc").build().unwrap();
        assert!(engine.full_match(b"abc"));
        assert!(!engine.full_match(b"abcd"));
        assert!(!engine.full_match(b"ab"));
    }

    #[test]
    fn recursion_cap_is_recorded_not_fatal() {
        let mut engine = Engine::builder("a(?R)?b")
            .recursive_limit(4)
            .build()
            .unwrap();
        assert!(engine.full_match(b"aaabbb"));
        assert!(!engine.full_match(b"aabbb"));
    }

    #[test]
    fn compile_degrades_gracefully_without_dfa() {
        // A pattern whose DFA trivially fits; force state_limit to 0 so the
        // engine falls back to cached-NFA matching only.
        let mut engine = Engine::builder("a").state_limit(0).build().unwrap();
        assert!(engine.capacity_exceeded);
        assert_eq!(engine.compile(CompileLevel::O3), CompileLevel::O0);
        assert!(engine.full_match(b"a"));
    }

    #[test]
    fn dump_expr_tree_is_non_empty() {
        let engine = Engine::builder("a|b").build().unwrap();
        assert!(engine.dump_expr_tree().contains("Union"));
    }
}
