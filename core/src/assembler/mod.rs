pub mod pdf;

pub use pdf::{AssembleError, Document, DocumentAssembler, PageInfo};
