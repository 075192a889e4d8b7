//! Binary-local application orchestration.
//!
//! `entry` picks the dispatch branch; the other modules implement one branch
//! each, plus the shared shutdown path in `signals`.

pub(crate) mod completion;
pub(crate) mod entry;
pub(crate) mod history;
pub(crate) mod interactive;
pub(crate) mod signals;
pub(crate) mod viewer;
