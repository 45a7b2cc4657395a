//! The four match strategies, selected by [`crate::error::CompileLevel`].
//! `Engine` (in the crate root) owns one of each that applies and dispatches
//! to whichever the current compile level selected.

pub mod dispatch;
pub mod nfa;
pub mod table;

pub use dispatch::Dispatcher;
pub use nfa::CachedNfa;
pub use table::TableInterpreter;
