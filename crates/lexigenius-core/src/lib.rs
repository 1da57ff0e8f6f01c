//! Clause model, placeholder resolution, and document assembly.
//!
//! Everything here is pure and synchronous: the resolver and assembler take
//! their inputs explicitly and may be re-run at any point of a review.

pub mod assembler;
pub mod clause;
mod error;
pub mod resolver;
pub mod session;
pub mod split;
pub mod token;
pub mod value;
pub mod writer;

pub use assembler::{Block, BlockSource, Run, assemble};
pub use clause::{Clause, Decision, Edit, ReviewStatus, ReviewedEdit};
pub use error::WorkflowError;
pub use resolver::{PlaceholderSet, resolve_placeholders};
pub use session::{FieldKind, FormField, Session, Stage};
pub use split::clauses_from_text;
pub use value::{FormValue, FormValues};
pub use writer::{OutputFormat, RenderError};
