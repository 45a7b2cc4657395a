//! Recursive-descent parser implementing the grammar from
//! `original_source/regex.cc`:
//!
//! ```text
//! e0 ::= e1 ('|' e1)*
//! e1 ::= e2 ('&' e2)*
//! e2 ::= e3+
//! e3 ::= e4 ([?+*] | '{' m ',' n '}')*
//! e4 ::= ATOM | '(' e0 ')' | '!' e0
//! ```

mod lexer;

pub use lexer::Token;

use crate::error::ParseError;
use crate::expr::{ExprId, ExprKind, ExprTree};
use lexer::Lexer;

/// Result of a successful parse: the tree, its root, and every `(...)` group
/// recorded as `(subtree root, group index)` so capture tags can be applied
/// once `first`/`last` positions are known (after `fill_transition`).
pub struct ParseOutput {
    pub tree: ExprTree,
    pub groups: Vec<(ExprId, u32)>,
    pub recursion_capped: bool,
}

pub struct Parser {
    lexer: Lexer,
    cur: Token,
    tree: ExprTree,
    groups: Vec<(ExprId, u32)>,
    next_group: u32,
}

impl Parser {
    pub fn parse(pattern: &str, recursive_limit: u32) -> Result<ParseOutput, ParseError> {
        let mut lexer = Lexer::new(pattern, recursive_limit);
        let cur = lexer.next_token()?;
        let mut p = Parser {
            lexer,
            cur,
            tree: ExprTree::new(),
            groups: Vec::new(),
            next_group: 0,
        };
        let body = p.e0()?;
        if p.cur != Token::Eof {
            return Err(ParseError::ExpectedEndOfPattern(p.lexer.offset()));
        }
        let eop = p.tree.leaf(ExprKind::Eop);
        let root = p.tree.concat(body, eop);
        p.tree.set_root(root);
        Ok(ParseOutput {
            tree: p.tree,
            groups: p.groups,
            recursion_capped: p.lexer.recursion_capped,
        })
    }

    fn bump(&mut self) -> Result<Token, ParseError> {
        let prev = std::mem::replace(&mut self.cur, self.lexer.next_token()?);
        Ok(prev)
    }

    fn e0(&mut self) -> Result<ExprId, ParseError> {
        let mut e = self.e1()?;
        while self.cur == Token::Union {
            self.bump()?;
            let rhs = self.e1()?;
            e = self.tree.union(e, rhs);
        }
        Ok(e)
    }

    fn e1(&mut self) -> Result<ExprId, ParseError> {
        let mut e = self.e2()?;
        while self.cur == Token::Intersect {
            self.bump()?;
            let rhs = self.e2()?;
            e = self.intersect(e, rhs);
        }
        Ok(e)
    }

    /// Placeholder node kept symmetrical with union/concat; actual DFA-level
    /// realisation of `&` happens in `crate::dfa::algebra::intersect_exprs`,
    /// which this calls through a thin marker so the parser stays
    /// DFA-agnostic. See DESIGN.md "intersection realisation".
    fn intersect(&mut self, a: ExprId, b: ExprId) -> ExprId {
        crate::dfa::algebra::intersect_exprs(&mut self.tree, a, b)
    }

    fn e2(&mut self) -> Result<ExprId, ParseError> {
        let mut e = self.e3()?;
        loop {
            match self.cur {
                Token::Eof
                | Token::RParen
                | Token::Union
                | Token::Intersect => break,
                _ => {
                    let rhs = self.e3()?;
                    e = self.tree.concat(e, rhs);
                }
            }
        }
        Ok(e)
    }

    fn e3(&mut self) -> Result<ExprId, ParseError> {
        let mut e = self.e4()?;
        loop {
            match self.cur.clone() {
                Token::Star => {
                    self.bump()?;
                    e = self.tree.star(e);
                }
                Token::Plus => {
                    self.bump()?;
                    e = self.tree.plus(e);
                }
                Token::Qmark => {
                    self.bump()?;
                    e = self.tree.qmark(e);
                }
                Token::Repeat(lo, hi) => {
                    self.bump()?;
                    e = self.expand_repeat(e, lo, hi);
                }
                _ => break,
            }
        }
        Ok(e)
    }

    /// `{m,n}` rewriting via subtree cloning: `m` mandatory copies followed
    /// by `n - m` optional copies, or an unbounded `Star` tail when `n` is
    /// absent. Mirrors `e3()` in `original_source/regex.cc`.
    fn expand_repeat(&mut self, e: ExprId, lo: u32, hi: Option<u32>) -> ExprId {
        if lo == 0 && hi == Some(0) {
            return self.tree.leaf(ExprKind::None);
        }
        let mut result = self.tree.leaf(ExprKind::None);
        for _ in 0..lo {
            let copy = self.tree.clone_subtree(e);
            result = self.tree.concat(result, copy);
        }
        match hi {
            Some(hi) => {
                for _ in lo..hi {
                    let copy = self.tree.clone_subtree(e);
                    let opt = self.tree.qmark(copy);
                    result = self.tree.concat(result, opt);
                }
            }
            None => {
                let copy = self.tree.clone_subtree(e);
                let star = self.tree.star(copy);
                result = self.tree.concat(result, star);
            }
        }
        result
    }

    fn e4(&mut self) -> Result<ExprId, ParseError> {
        match self.bump()? {
            Token::Literal(b) => Ok(self.tree.leaf(ExprKind::Literal(b))),
            Token::Class(set) => Ok(self.tree.leaf(ExprKind::CharClass(set))),
            Token::Dot => Ok(self.tree.leaf(ExprKind::Dot)),
            Token::BegLine => Ok(self.tree.leaf(ExprKind::BegLine)),
            Token::EndLine => Ok(self.tree.leaf(ExprKind::EndLine)),
            Token::None => Ok(self.tree.leaf(ExprKind::None)),
            Token::Not => {
                let inner = self.e0()?;
                Ok(crate::dfa::algebra::complement_expr(&mut self.tree, inner))
            }
            Token::LParen => {
                let group = self.next_group;
                self.next_group += 1;
                let inner = self.e0()?;
                match self.cur {
                    Token::RParen => {
                        self.bump()?;
                        self.groups.push((inner, group));
                        Ok(inner)
                    }
                    _ => Err(ParseError::MismatchedParens(self.lexer.offset())),
                }
            }
            Token::RParen => Err(ParseError::StrayRparen(self.lexer.offset())),
            Token::Eof => Err(ParseError::EmptyOperand(self.lexer.offset())),
            other => unreachable!("token {:?} cannot start e4", other),
        }
    }
}

/// Applies group `enter`/`leave` tags to the leaves bounding each recorded
/// group, using the `first`/`last` positions computed by `fill_transition`.
/// Must run after `ExprTree::number_states` and `fill_transition`.
pub fn apply_capture_tags(tree: &mut ExprTree, groups: &[(ExprId, u32)]) {
    for &(root, group) in groups {
        let (first, last) = {
            let t = &tree.get(root).transition;
            (t.first.clone(), t.last.clone())
        };
        for sid in first {
            let owner = tree.state_owner(sid);
            tree.get_mut(owner).tag.enter.push(group);
        }
        for sid in last {
            let owner = tree.state_owner(sid);
            tree.get_mut(owner).tag.leave.push(group);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(pattern: &str) -> ParseOutput {
        Parser::parse(pattern, 16).expect("pattern should parse")
    }

    #[test]
    fn literal_concat() {
        let mut out = parse_ok("ab");
        out.tree.number_states();
        out.tree.fill_transition();
        assert_eq!(out.tree.state_count(), 3); // a, b, eop
    }

    #[test]
    fn stray_rparen_is_an_error() {
        assert!(matches!(
            Parser::parse("a)", 16),
            Err(ParseError::StrayRparen(_))
        ));
    }

    #[test]
    fn unmatched_lparen_is_an_error() {
        assert!(matches!(
            Parser::parse("(a", 16),
            Err(ParseError::MismatchedParens(_))
        ));
    }

    #[test]
    fn repeat_expands_without_panicking() {
        let mut out = parse_ok("a{2,4}");
        out.tree.number_states();
        out.tree.fill_transition();
        assert!(out.tree.state_count() >= 5);
    }

    #[test]
    fn groups_are_recorded() {
        let out = parse_ok("(a)(b)");
        assert_eq!(out.groups.len(), 2);
    }
}
