//! Syntax tree to VHDL transformation for silica.
//!
//! [`transform`] is the entry point. It resolves the tree, selects entry
//! points, plans the call graph (instances, invocation slots, inlining),
//! lowers every hardware member to a state machine in parallel, wires the
//! invocation proxies and renders the result, going through the cache when
//! one is given.

#![warn(missing_docs)]

pub mod assemble;
pub mod callgraph;
pub mod context;
pub mod entry;
pub mod error;
pub mod lower;
pub mod pipeline;
pub mod proxy;
pub mod types;

pub use callgraph::{CallPlan, MemberPlan};
pub use context::{transformation_identity, TransformationContext, IDENTITY_VERSION};
pub use entry::{is_entry_point, select_entry_points};
pub use error::{ConfigurationError, TransformError};
pub use pipeline::transform;
