//! Data models for the gate
//!
//! Every value here is constructed, consumed, and discarded within one
//! request. Nothing is long-lived inside the core.

mod access;
mod audit;
mod category;
mod file;
mod scan;
mod screening;
mod validation;
mod verdict;

pub use access::*;
pub use audit::*;
pub use category::*;
pub use file::*;
pub use scan::*;
pub use screening::*;
pub use validation::*;
pub use verdict::*;
