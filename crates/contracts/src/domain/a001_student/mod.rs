pub mod aggregate;
pub mod import;

pub use aggregate::{Student, StudentDto, StudentId};
pub use import::{ImportOutcome, ImportReport, ImportRow, REQUIRED_IMPORT_FIELDS};
