//! Owned syntax-tree model for silica.
//!
//! The tree is the already-parsed input handed over by the decompiler: types,
//! their fields and methods, and method bodies made of [`Stmt`]s and
//! [`Expr`]s. Every node carries a [`NodeId`] assigned in pre-order when the
//! tree is built, so passes can refer to nodes without holding borrows.
//!
//! Parent relationships live in a separate [`ParentIndex`] and member lookup
//! by name or signature goes through a precomputed [`TypeIndex`]; the tree
//! itself stays strictly tree-shaped.

#![warn(missing_docs)]

pub mod error;
pub mod expr;
pub mod ids;
pub mod index;
pub mod parents;
pub mod stmt;
pub mod tree;
pub mod ty;
pub mod visit;

pub use error::AstError;
pub use expr::{BinaryOp, Expr, ExprKind, FieldRef, Literal, MemberRef, UnaryOp};
pub use ids::NodeId;
pub use index::{name_alternates, MemberHandle, MemberSignature, TypeIndex};
pub use parents::{NodeKind, ParentIndex};
pub use stmt::{AssignTarget, Stmt, StmtKind};
pub use tree::{FieldDecl, MethodDecl, Modifiers, Parameter, SyntaxTree, TypeDecl};
pub use ty::{TypeKind, TypeRef, Visibility};
