//! Precomputed type and member lookup.
//!
//! Members are indexed once per transformation under every name alternate
//! produced by [`name_alternates`], so explicit interface implementations
//! (`Demo.IKernel.Run`) and generic arity suffixes (``Map`1``, `Map<T>`)
//! resolve without formatting names at query time.

use crate::error::AstError;
use crate::expr::MemberRef;
use crate::ids::NodeId;
use crate::tree::{MethodDecl, SyntaxTree, TypeDecl};
use crate::ty::TypeRef;
use std::collections::HashMap;

/// Position of a method in a [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemberHandle {
    /// Index into [`SyntaxTree::types`].
    pub type_pos: u32,
    /// Index into [`TypeDecl::methods`].
    pub method_pos: u32,
}

/// A method name plus parameter types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberSignature {
    /// Name (one of the alternates).
    pub name: String,
    /// Parameter types.
    pub parameter_types: Vec<TypeRef>,
}

/// Returns the names a method may be referred to by: the raw name, the part
/// after the last `.`, and either of those without a generic suffix.
/// Duplicates are removed; the raw name always comes first.
pub fn name_alternates(name: &str) -> Vec<String> {
    let mut out = vec![name.to_string()];
    let mut push = |candidate: &str| {
        if !candidate.is_empty() && !out.iter().any(|n| n == candidate) {
            out.push(candidate.to_string());
        }
    };
    let simple = name.rsplit('.').next().unwrap_or(name);
    push(simple);
    push(strip_generic_suffix(name));
    push(strip_generic_suffix(simple));
    out
}

fn strip_generic_suffix(name: &str) -> &str {
    let cut = name.find(|c: char| c == '`' || c == '<').unwrap_or(name.len());
    &name[..cut]
}

/// Lookup tables over one tree.
#[derive(Debug, Clone, Default)]
pub struct TypeIndex {
    types: HashMap<String, u32>,
    by_signature: HashMap<(u32, MemberSignature), MemberHandle>,
    by_name: HashMap<(u32, String), Vec<MemberHandle>>,
    by_full_name: HashMap<String, MemberHandle>,
    by_node: HashMap<NodeId, MemberHandle>,
}

impl TypeIndex {
    /// Indexes every type and method of `tree`.
    pub fn build(tree: &SyntaxTree) -> Result<Self, AstError> {
        let mut index = Self::default();
        for (type_pos, ty) in tree.types.iter().enumerate() {
            let type_pos = type_pos as u32;
            if index.types.insert(ty.full_name.clone(), type_pos).is_some() {
                return Err(AstError::DuplicateType {
                    name: ty.full_name.clone(),
                });
            }
            for (method_pos, method) in ty.methods.iter().enumerate() {
                let handle = MemberHandle {
                    type_pos,
                    method_pos: method_pos as u32,
                };
                let full_name = ty.member_full_name(method);
                if index.by_full_name.insert(full_name.clone(), handle).is_some() {
                    return Err(AstError::DuplicateMember { name: full_name });
                }
                index.by_node.insert(method.id, handle);
                index.by_signature.insert(
                    (type_pos, signature(&method.name, method)),
                    handle,
                );
            }
            // Alternates never shadow a raw name.
            for (method_pos, method) in ty.methods.iter().enumerate() {
                let handle = MemberHandle {
                    type_pos,
                    method_pos: method_pos as u32,
                };
                for name in name_alternates(&method.name) {
                    index
                        .by_signature
                        .entry((type_pos, signature(&name, method)))
                        .or_insert(handle);
                    index.by_name.entry((type_pos, name)).or_default().push(handle);
                }
            }
        }
        Ok(index)
    }

    /// Returns the position of a type by full name.
    pub fn type_position(&self, full_name: &str) -> Option<u32> {
        self.types.get(full_name).copied()
    }

    /// Resolves a call target to a method.
    pub fn resolve_call(&self, target: &MemberRef) -> Option<MemberHandle> {
        let type_pos = self.type_position(&target.declaring_type)?;
        name_alternates(&target.name).into_iter().find_map(|name| {
            self.by_signature
                .get(&(
                    type_pos,
                    MemberSignature {
                        name,
                        parameter_types: target.parameter_types.clone(),
                    },
                ))
                .copied()
        })
    }

    /// Returns the methods of a type reachable under `name` or any of its
    /// alternates, in declaration order.
    pub fn methods_named(&self, type_full_name: &str, name: &str) -> Vec<MemberHandle> {
        let Some(type_pos) = self.type_position(type_full_name) else {
            return Vec::new();
        };
        let mut out: Vec<MemberHandle> = name_alternates(name)
            .into_iter()
            .filter_map(|alt| self.by_name.get(&(type_pos, alt)))
            .flatten()
            .copied()
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// Looks a method up by its full name.
    pub fn member_by_full_name(&self, full_name: &str) -> Option<MemberHandle> {
        self.by_full_name.get(full_name).copied()
    }

    /// Looks a method up by its node id.
    pub fn member_by_node(&self, id: NodeId) -> Option<MemberHandle> {
        self.by_node.get(&id).copied()
    }

    /// Number of indexed methods.
    pub fn member_count(&self) -> usize {
        self.by_full_name.len()
    }
}

fn signature(name: &str, method: &MethodDecl) -> MemberSignature {
    MemberSignature {
        name: name.to_string(),
        parameter_types: method.parameters.iter().map(|p| p.ty.clone()).collect(),
    }
}

impl SyntaxTree {
    /// Returns the method at `handle`.
    ///
    /// # Panics
    ///
    /// Panics if the handle does not come from an index over this tree.
    pub fn method(&self, handle: MemberHandle) -> &MethodDecl {
        &self.types[handle.type_pos as usize].methods[handle.method_pos as usize]
    }

    /// Returns the type declaring the method at `handle`.
    pub fn declaring_type(&self, handle: MemberHandle) -> &TypeDecl {
        &self.types[handle.type_pos as usize]
    }

    /// Returns the full name of the method at `handle`.
    pub fn member_full_name(&self, handle: MemberHandle) -> String {
        self.declaring_type(handle)
            .member_full_name(self.method(handle))
    }
}
