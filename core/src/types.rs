//! Shared primitive types used across the pipeline.

/// One-based position of a data row in the input file (header excluded).
/// Every error that names a row uses this numbering.
pub type RowNumber = usize;

/// Composite grouping key: `{agency}_{recipient_type}`.
pub type EntityKey = String;

/// The identifier attached to one pipeline invocation.
pub type RunId = String;
