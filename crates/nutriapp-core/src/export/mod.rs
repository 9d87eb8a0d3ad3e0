//! Export functionality: text documents, CSV and JSON.

mod batch;
mod document;

pub use batch::*;
pub use document::*;
