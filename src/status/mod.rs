//! Status matching.
//!
//! Expected fleet states are expressed as a tagged [`Expectation`] per role
//! and evaluated by a single matcher ([`matches`]). Call sites never compare
//! status strings themselves.

mod catalog;
mod diff;
mod expectation;
mod matcher;
pub use catalog::*;
pub use diff::*;
pub use expectation::*;
pub use matcher::*;

#[cfg(test)]
mod catalog_test;
