//! Node-id to parent-id index.

use crate::expr::Expr;
use crate::ids::NodeId;
use crate::stmt::Stmt;
use crate::tree::SyntaxTree;
use std::collections::HashMap;

/// What kind of node an id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A type declaration.
    Type,
    /// A field declaration.
    Field,
    /// A method declaration.
    Method,
    /// A statement.
    Statement,
    /// An expression.
    Expression,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    parent: Option<NodeId>,
    kind: NodeKind,
}

/// Parent and kind of every node in a numbered tree.
#[derive(Debug, Clone, Default)]
pub struct ParentIndex {
    entries: HashMap<NodeId, Entry>,
}

impl ParentIndex {
    /// Indexes every node of `tree`.
    pub fn build(tree: &SyntaxTree) -> Self {
        let mut index = Self::default();
        for ty in &tree.types {
            index.insert(ty.id, None, NodeKind::Type);
            for field in &ty.fields {
                index.insert(field.id, Some(ty.id), NodeKind::Field);
                if let Some(init) = &field.initializer {
                    index.add_expr(init, field.id);
                }
            }
            for method in &ty.methods {
                index.insert(method.id, Some(ty.id), NodeKind::Method);
                if let Some(body) = &method.body {
                    index.add_stmt(body, method.id);
                }
            }
        }
        index
    }

    fn insert(&mut self, id: NodeId, parent: Option<NodeId>, kind: NodeKind) {
        self.entries.insert(id, Entry { parent, kind });
    }

    fn add_stmt(&mut self, stmt: &Stmt, parent: NodeId) {
        self.insert(stmt.id, Some(parent), NodeKind::Statement);
        for expr in stmt.exprs() {
            self.add_expr(expr, stmt.id);
        }
        for child in stmt.children() {
            self.add_stmt(child, stmt.id);
        }
    }

    fn add_expr(&mut self, expr: &Expr, parent: NodeId) {
        self.insert(expr.id, Some(parent), NodeKind::Expression);
        for child in expr.children() {
            self.add_expr(child, expr.id);
        }
    }

    /// Returns the parent of `id`; `None` for types and unknown ids.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entries.get(&id).and_then(|e| e.parent)
    }

    /// Returns the kind of `id`.
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.entries.get(&id).map(|e| e.kind)
    }

    /// Iterates the ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&current| self.parent(current))
    }

    /// Returns the nearest ancestor of `id` of the given kind.
    pub fn enclosing(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.ancestors(id).find(|&a| self.kind(a) == Some(kind))
    }

    /// Number of indexed nodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
