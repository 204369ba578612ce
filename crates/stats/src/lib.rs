//! Statistics about a gateway configuration bundle.
//!
//! Each [`Category`] has its own [`Calculator`]. [`analyze`] runs all of them
//! concurrently against one [`Bundle`](ember_source::Bundle) and collects
//! the results into a [`Report`], where every category is present, absent or
//! failed independently of the others.

mod aggregate;
mod calculator;
pub mod categories;
pub mod error;
mod report;
#[cfg(test)]
mod testing;

pub use crate::aggregate::{analyze, analyze_with};
pub use crate::calculator::{Calculator, Category};
pub use crate::report::{Outcome, Report};
