//! Incremental term highlighting over a [`tree::ContentTree`].
//!
//! Typical host flow:
//! 1. build a [`Highlighter`] with a [`MatchConfig`] and mount it on a root;
//! 2. let the renderer edit the tree;
//! 3. call [`host::settle`] (or [`Highlighter::process`] after
//!    [`bus::MutationBus::dispatch`]) to bring markers up to date.

pub mod annotator;
pub mod config;
pub mod handle;
pub mod host;
pub mod scope;
pub mod signature;
pub mod terms;
pub mod watcher;

pub use crate::annotator::{PassReport, apply, apply_compiled, clear_marks};
pub use crate::config::{MARKER_ATTR, MatchConfig, Presentation, SCOPE_ATTR};
pub use crate::handle::RootHandle;
pub use crate::host::{SettleReport, settle};
pub use crate::scope::{Scope, in_scope, scoped_marks};
pub use crate::signature::{Signature, signature};
pub use crate::terms::{CompiledTerms, Pattern, PatternFlags, Term, TermError, compile, parse_terms};
pub use crate::watcher::{Highlighter, Reaction, WatchStats};
