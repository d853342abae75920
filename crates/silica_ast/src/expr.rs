//! Expressions.

use crate::ids::NodeId;
use crate::ty::TypeRef;
use serde::{Deserialize, Serialize};

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Arithmetic negation (`-x`).
    Neg,
    /// Bitwise complement (`~x`).
    Not,
    /// Logical negation (`!x`).
    LogicNot,
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
    /// Remainder.
    Rem,
    /// Bitwise AND.
    BitAnd,
    /// Bitwise OR.
    BitOr,
    /// Bitwise XOR.
    BitXor,
    /// Left shift.
    Shl,
    /// Right shift (arithmetic for signed operands).
    Shr,
    /// Equality.
    Eq,
    /// Inequality.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// Short-circuit AND.
    LogicAnd,
    /// Short-circuit OR.
    LogicOr,
}

impl BinaryOp {
    /// Returns `true` for operators producing a boolean from two operands of
    /// the same type.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    /// Returns `true` for the short-circuit boolean operators.
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::LogicAnd | BinaryOp::LogicOr)
    }
}

/// A compile-time literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Literal {
    /// A boolean literal.
    Bool(bool),
    /// An integer literal of a given width and signedness.
    Int {
        /// The value, already truncated to `width` bits and sign-extended.
        value: i64,
        /// Width in bits.
        width: u16,
        /// Signedness.
        signed: bool,
    },
}

impl Literal {
    /// A signed 32-bit literal.
    pub fn i32(value: i32) -> Self {
        Literal::Int {
            value: value as i64,
            width: 32,
            signed: true,
        }
    }

    /// Returns the literal's type.
    pub fn ty(&self) -> TypeRef {
        match self {
            Literal::Bool(_) => TypeRef::Bool,
            Literal::Int { width, signed, .. } => TypeRef::Int {
                width: *width,
                signed: *signed,
            },
        }
    }

    /// Returns the integer value, if this is an integer literal.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Literal::Int { value, .. } => Some(*value),
            Literal::Bool(_) => None,
        }
    }

    /// Returns the boolean value, if this is a boolean literal.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Literal::Bool(value) => Some(*value),
            Literal::Int { .. } => None,
        }
    }
}

/// A reference to a method by declaring type, name and parameter types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberRef {
    /// Full name of the declaring type.
    pub declaring_type: String,
    /// Method name as written at the call site.
    pub name: String,
    /// Parameter types of the target overload.
    #[serde(default)]
    pub parameter_types: Vec<TypeRef>,
}

/// A reference to a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldRef {
    /// Full name of the declaring type.
    pub declaring_type: String,
    /// Field name.
    pub name: String,
}

/// An expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    /// Node id, assigned when the tree is numbered.
    #[serde(default)]
    pub id: NodeId,
    /// What the expression is.
    pub kind: ExprKind,
}

/// The kinds of expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    /// A literal value.
    Literal(Literal),
    /// A local variable.
    Local(String),
    /// A method parameter.
    Parameter(String),
    /// A field.
    Field(FieldRef),
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// A method call.
    Call {
        /// The called method.
        target: MemberRef,
        /// Arguments in parameter order.
        args: Vec<Expr>,
    },
    /// `new T[length]`.
    NewArray {
        /// Element type.
        element: TypeRef,
        /// Requested length.
        length: Box<Expr>,
    },
    /// `array[index]`.
    ArrayElement {
        /// The array.
        array: Box<Expr>,
        /// The index.
        index: Box<Expr>,
    },
    /// `array.Length`.
    ArrayLength(Box<Expr>),
    /// `condition ? if_true : if_false`.
    Conditional {
        /// The condition.
        condition: Box<Expr>,
        /// Value when the condition holds.
        if_true: Box<Expr>,
        /// Value otherwise.
        if_false: Box<Expr>,
    },
    /// An explicit conversion.
    Cast {
        /// Target type.
        ty: TypeRef,
        /// Converted value.
        operand: Box<Expr>,
    },
}

impl Expr {
    /// Creates an unnumbered expression.
    pub fn new(kind: ExprKind) -> Self {
        Self {
            id: NodeId::UNASSIGNED,
            kind,
        }
    }

    /// A literal expression.
    pub fn literal(literal: Literal) -> Self {
        Self::new(ExprKind::Literal(literal))
    }

    /// A signed 32-bit literal.
    pub fn int(value: i32) -> Self {
        Self::literal(Literal::i32(value))
    }

    /// A boolean literal.
    pub fn bool(value: bool) -> Self {
        Self::literal(Literal::Bool(value))
    }

    /// A local variable reference.
    pub fn local(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Local(name.into()))
    }

    /// A parameter reference.
    pub fn param(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Parameter(name.into()))
    }

    /// A field reference.
    pub fn field(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(ExprKind::Field(FieldRef {
            declaring_type: declaring_type.into(),
            name: name.into(),
        }))
    }

    /// A unary operation.
    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::new(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// A binary operation.
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Self::new(ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    /// A call.
    pub fn call(target: MemberRef, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::Call { target, args })
    }

    /// An array allocation.
    pub fn new_array(element: TypeRef, length: Expr) -> Self {
        Self::new(ExprKind::NewArray {
            element,
            length: Box::new(length),
        })
    }

    /// An array element read.
    pub fn element(array: Expr, index: Expr) -> Self {
        Self::new(ExprKind::ArrayElement {
            array: Box::new(array),
            index: Box::new(index),
        })
    }

    /// An array length read.
    pub fn length_of(array: Expr) -> Self {
        Self::new(ExprKind::ArrayLength(Box::new(array)))
    }

    /// A conditional expression.
    pub fn conditional(condition: Expr, if_true: Expr, if_false: Expr) -> Self {
        Self::new(ExprKind::Conditional {
            condition: Box::new(condition),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        })
    }

    /// A conversion.
    pub fn cast(ty: TypeRef, operand: Expr) -> Self {
        Self::new(ExprKind::Cast {
            ty,
            operand: Box::new(operand),
        })
    }

    /// Returns the literal if this expression is one.
    pub fn as_literal(&self) -> Option<&Literal> {
        match &self.kind {
            ExprKind::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    /// Returns the direct subexpressions in evaluation order.
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Literal(_)
            | ExprKind::Local(_)
            | ExprKind::Parameter(_)
            | ExprKind::Field(_) => Vec::new(),
            ExprKind::Unary { operand, .. } => vec![&**operand],
            ExprKind::Binary { lhs, rhs, .. } => vec![&**lhs, &**rhs],
            ExprKind::Call { args, .. } => args.iter().collect(),
            ExprKind::NewArray { length, .. } => vec![&**length],
            ExprKind::ArrayElement { array, index } => vec![&**array, &**index],
            ExprKind::ArrayLength(array) => vec![&**array],
            ExprKind::Conditional {
                condition,
                if_true,
                if_false,
            } => vec![&**condition, &**if_true, &**if_false],
            ExprKind::Cast { operand, .. } => vec![&**operand],
        }
    }

    /// Returns the direct subexpressions mutably, in evaluation order.
    pub fn children_mut(&mut self) -> Vec<&mut Expr> {
        match &mut self.kind {
            ExprKind::Literal(_)
            | ExprKind::Local(_)
            | ExprKind::Parameter(_)
            | ExprKind::Field(_) => Vec::new(),
            ExprKind::Unary { operand, .. } => vec![&mut **operand],
            ExprKind::Binary { lhs, rhs, .. } => vec![&mut **lhs, &mut **rhs],
            ExprKind::Call { args, .. } => args.iter_mut().collect(),
            ExprKind::NewArray { length, .. } => vec![&mut **length],
            ExprKind::ArrayElement { array, index } => vec![&mut **array, &mut **index],
            ExprKind::ArrayLength(array) => vec![&mut **array],
            ExprKind::Conditional {
                condition,
                if_true,
                if_false,
            } => vec![&mut **condition, &mut **if_true, &mut **if_false],
            ExprKind::Cast { operand, .. } => vec![&mut **operand],
        }
    }

    /// Returns `true` if a call appears anywhere in this expression.
    pub fn contains_call(&self) -> bool {
        matches!(self.kind, ExprKind::Call { .. })
            || self.children().into_iter().any(Expr::contains_call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_types() {
        assert_eq!(Literal::i32(5).ty(), TypeRef::i32());
        assert_eq!(Literal::Bool(true).ty(), TypeRef::Bool);
        assert_eq!(Literal::i32(5).as_int(), Some(5));
        assert_eq!(Literal::Bool(false).as_bool(), Some(false));
        assert_eq!(Literal::Bool(false).as_int(), None);
    }

    #[test]
    fn children_in_order() {
        let expr = Expr::binary(BinaryOp::Add, Expr::local("a"), Expr::int(1));
        let children = expr.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].kind, ExprKind::Local("a".into()));
    }

    #[test]
    fn contains_nested_call() {
        let call = Expr::call(
            MemberRef {
                declaring_type: "T".into(),
                name: "F".into(),
                parameter_types: vec![],
            },
            vec![],
        );
        let expr = Expr::binary(BinaryOp::Mul, Expr::int(2), call);
        assert!(expr.contains_call());
        assert!(!Expr::local("x").contains_call());
    }

    #[test]
    fn operator_classes() {
        assert!(BinaryOp::Le.is_comparison());
        assert!(!BinaryOp::Add.is_comparison());
        assert!(BinaryOp::LogicOr.is_logical());
    }

    #[test]
    fn json_without_ids() {
        let expr: Expr = serde_json::from_str(r#"{"kind":{"Local":"x"}}"#).unwrap();
        assert_eq!(expr.id, NodeId::UNASSIGNED);
        assert_eq!(expr, Expr::local("x"));
    }
}
