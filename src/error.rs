//! Error types. `ParseError` is fatal (the engine is never constructed);
//! `CapacityExceeded`/`OptimisationUnavailable` are degrade-not-fail signals
//! recorded on the engine and surfaced through `log::warn!`, the way the
//! sibling `kbnf` crate reports `GrammarError` via `thiserror`.

/// Byte offset into the top-level pattern text. Best-effort across `(?R)`
/// and `\d`/`\w` macro expansion frames, which splice in synthetic text that
/// doesn't correspond 1:1 with user-visible offsets.
pub type Offset = usize;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unterminated character class starting at byte {0}")]
    UnterminatedCharClass(Offset),

    #[error("stray ')' at byte {0}")]
    StrayRparen(Offset),

    #[error("unmatched '(' at byte {0}")]
    MismatchedParens(Offset),

    #[error("expected an expression at byte {0} but found none")]
    EmptyOperand(Offset),

    #[error("malformed hex escape at byte {0}")]
    MalformedHexEscape(Offset),

    #[error("invalid repetition {{{lo},{hi:?}}} at byte {offset}: upper bound below lower bound")]
    InvalidRepetition {
        offset: Offset,
        lo: u32,
        hi: Option<u32>,
    },

    #[error("trailing input at byte {0}: expected end of pattern")]
    ExpectedEndOfPattern(Offset),
}

/// The effective optimisation level reached by [`crate::Engine::compile`].
/// Never an error: a request for `O2` that only resolves to `O0` is a normal,
/// loggable degradation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CompileLevel {
    /// Table-walking interpreter over the minimised DFA.
    O0,
    /// `AlterTrans`-compressed row dispatch.
    O1,
    /// `AlterTrans` plus inline-chain fusion.
    O2,
    /// All of the above, applied to a DFA additionally pruned of states
    /// unreachable after `AlterTrans` compression.
    O3,
}

impl Default for CompileLevel {
    fn default() -> Self {
        CompileLevel::O0
    }
}
