//! The syntax tree root and its declarations.

use crate::error::AstError;
use crate::expr::Expr;
use crate::ids::NodeId;
use crate::stmt::Stmt;
use crate::ty::{TypeKind, TypeRef, Visibility};
use serde::{Deserialize, Serialize};
use silica_common::{ContentHash, InternalError, SilicaResult};
use std::fmt::Write;

/// Method modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    /// Declared visibility.
    pub visibility: Visibility,
    /// `virtual` (or `override`).
    pub is_virtual: bool,
    /// `static`.
    pub is_static: bool,
    /// `async`.
    pub is_async: bool,
    /// `abstract`; such methods have no body.
    pub is_abstract: bool,
    /// Marked for aggressive inlining.
    pub inline_hint: bool,
}

/// A method parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Parameter type.
    pub ty: TypeRef,
}

impl Parameter {
    /// Creates a parameter.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A method declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    /// Node id.
    #[serde(default)]
    pub id: NodeId,
    /// Method name. Explicit interface implementations carry the qualified
    /// form, e.g. `Demo.IKernel.Run`.
    pub name: String,
    /// Full name of the interface this method explicitly implements.
    #[serde(default)]
    pub explicit_interface: Option<String>,
    /// Modifiers.
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Parameters in order.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Return type.
    #[serde(default = "void")]
    pub return_type: TypeRef,
    /// Body, absent for abstract and interface methods.
    #[serde(default)]
    pub body: Option<Stmt>,
}

fn void() -> TypeRef {
    TypeRef::Void
}

impl MethodDecl {
    /// Creates a private, non-virtual method with the given body.
    pub fn new(name: impl Into<String>, parameters: Vec<Parameter>, return_type: TypeRef, body: Option<Stmt>) -> Self {
        Self {
            id: NodeId::UNASSIGNED,
            name: name.into(),
            explicit_interface: None,
            modifiers: Modifiers::default(),
            parameters,
            return_type,
            body,
        }
    }

    /// Replaces the modifiers.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Marks this method as an explicit implementation of `interface`.
    pub fn implementing(mut self, interface: impl Into<String>) -> Self {
        self.explicit_interface = Some(interface.into());
        self
    }

    /// Returns the signature suffix, e.g. `(i32,bool[])`.
    pub fn signature_suffix(&self) -> String {
        signature_suffix(self.parameters.iter().map(|p| &p.ty))
    }

    /// Returns the parameter with the given name.
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Formats parameter types as `(t1,t2,...)`.
pub fn signature_suffix<'a>(types: impl IntoIterator<Item = &'a TypeRef>) -> String {
    let mut out = String::from("(");
    for (i, ty) in types.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{ty}");
    }
    out.push(')');
    out
}

/// A field declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    /// Node id.
    #[serde(default)]
    pub id: NodeId,
    /// Field name.
    pub name: String,
    /// Field type.
    pub ty: TypeRef,
    /// Declared visibility.
    #[serde(default)]
    pub visibility: Visibility,
    /// `static`.
    #[serde(default)]
    pub is_static: bool,
    /// `readonly`.
    #[serde(default)]
    pub is_readonly: bool,
    /// Initializer expression.
    #[serde(default)]
    pub initializer: Option<Expr>,
}

/// A type declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    /// Node id.
    #[serde(default)]
    pub id: NodeId,
    /// Namespace-qualified name, e.g. `Demo.Kernels.Calculator`.
    pub full_name: String,
    /// Class, struct or interface.
    #[serde(default)]
    pub kind: TypeKind,
    /// Declared visibility.
    #[serde(default)]
    pub visibility: Visibility,
    /// Every interface this type implements, inherited ones included.
    #[serde(default)]
    pub interfaces: Vec<String>,
    /// Fields.
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    /// Methods.
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

impl TypeDecl {
    /// Creates an empty type.
    pub fn new(full_name: impl Into<String>, kind: TypeKind, visibility: Visibility) -> Self {
        Self {
            id: NodeId::UNASSIGNED,
            full_name: full_name.into(),
            kind,
            visibility,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Returns the full name of one of this type's methods, e.g.
    /// `Demo.Kernels.Calculator.Add(i32,i32)`.
    pub fn member_full_name(&self, method: &MethodDecl) -> String {
        format!("{}.{}{}", self.full_name, method.name, method.signature_suffix())
    }

    /// Returns the field with the given name.
    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// An already-parsed program: the input of the hardware transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxTree {
    /// All types, in the order the decompiler produced them.
    pub types: Vec<TypeDecl>,
}

impl SyntaxTree {
    /// Builds a tree and numbers its nodes.
    pub fn new(types: Vec<TypeDecl>) -> Self {
        let mut tree = Self { types };
        tree.assign_ids();
        tree
    }

    /// Parses the JSON interchange form and numbers the nodes.
    ///
    /// Ids present in the document are overwritten.
    pub fn from_json(json: &str) -> Result<Self, AstError> {
        let tree: SyntaxTree = serde_json::from_str(json)?;
        Ok(Self::new(tree.types))
    }

    /// Renders the JSON interchange form.
    pub fn to_json(&self) -> Result<String, AstError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Renumbers every node in pre-order, starting at 1.
    pub fn assign_ids(&mut self) {
        let mut next = 1u32;
        let mut fresh = || {
            let id = NodeId::from_raw(next);
            next += 1;
            id
        };
        for ty in &mut self.types {
            ty.id = fresh();
            for field in &mut ty.fields {
                field.id = fresh();
                if let Some(init) = &mut field.initializer {
                    number_expr(init, &mut fresh);
                }
            }
            for method in &mut ty.methods {
                method.id = fresh();
                if let Some(body) = &mut method.body {
                    number_stmt(body, &mut fresh);
                }
            }
        }
    }

    /// Returns the type with the given full name.
    pub fn find_type(&self, full_name: &str) -> Option<&TypeDecl> {
        self.types.iter().find(|t| t.full_name == full_name)
    }

    /// Returns the content identity of the tree.
    ///
    /// Two trees with equal content hash equal regardless of where they were
    /// loaded from.
    pub fn content_hash(&self) -> SilicaResult<ContentHash> {
        let bytes = bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| InternalError::new(format!("failed to encode syntax tree: {e}")))?;
        Ok(ContentHash::from_bytes(&bytes))
    }
}

fn number_stmt(stmt: &mut Stmt, fresh: &mut impl FnMut() -> NodeId) {
    stmt.id = fresh();
    for expr in stmt.exprs_mut() {
        number_expr(expr, fresh);
    }
    for child in stmt.children_mut() {
        number_stmt(child, fresh);
    }
}

fn number_expr(expr: &mut Expr, fresh: &mut impl FnMut() -> NodeId) {
    expr.id = fresh();
    for child in expr.children_mut() {
        number_expr(child, fresh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::BinaryOp;

    fn sample() -> SyntaxTree {
        let mut ty = TypeDecl::new("Demo.Calc", TypeKind::Class, Visibility::Public);
        ty.methods.push(MethodDecl::new(
            "Add",
            vec![
                Parameter::new("a", TypeRef::i32()),
                Parameter::new("b", TypeRef::i32()),
            ],
            TypeRef::i32(),
            Some(Stmt::block(vec![Stmt::ret(Some(Expr::binary(
                BinaryOp::Add,
                Expr::param("a"),
                Expr::param("b"),
            )))])),
        ));
        SyntaxTree::new(vec![ty])
    }

    #[test]
    fn ids_are_preorder() {
        let tree = sample();
        let ty = &tree.types[0];
        assert_eq!(ty.id.as_raw(), 1);
        assert_eq!(ty.methods[0].id.as_raw(), 2);
        let body = ty.methods[0].body.as_ref().unwrap();
        assert_eq!(body.id.as_raw(), 3);
    }

    #[test]
    fn member_full_name_includes_signature() {
        let tree = sample();
        let ty = &tree.types[0];
        assert_eq!(ty.member_full_name(&ty.methods[0]), "Demo.Calc.Add(i32,i32)");
    }

    #[test]
    fn json_roundtrip_renumbers() {
        let tree = sample();
        let json = tree.to_json().unwrap();
        let restored = SyntaxTree::from_json(&json).unwrap();
        assert_eq!(tree, restored);
    }

    #[test]
    fn content_hash_is_stable() {
        let a = sample();
        let b = sample();
        assert_eq!(a.content_hash().unwrap(), b.content_hash().unwrap());

        let mut c = sample();
        c.types[0].full_name = "Demo.Other".into();
        assert_ne!(a.content_hash().unwrap(), c.content_hash().unwrap());
    }

    #[test]
    fn parse_minimal_json() {
        let json = r#"{"types":[{"full_name":"Demo.K","visibility":"public","methods":[
            {"name":"Run","modifiers":{"visibility":"public","is_virtual":true},
             "return_type":"Void","body":{"kind":{"Block":[]}}}]}]}"#;
        let tree = SyntaxTree::from_json(json).unwrap();
        let method = &tree.types[0].methods[0];
        assert!(method.modifiers.is_virtual);
        assert_eq!(method.id.as_raw(), 2);
    }

    #[test]
    fn parse_error_is_reported() {
        assert!(matches!(
            SyntaxTree::from_json("{ not json"),
            Err(AstError::Parse(_))
        ));
    }
}
