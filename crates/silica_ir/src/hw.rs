//! Hardware-level types, expressions and statements.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The type of a hardware value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HwType {
    /// A single boolean.
    Boolean,
    /// A two's complement vector of the given width.
    Signed(u16),
    /// An unsigned vector of the given width.
    Unsigned(u16),
    /// A fixed-length array.
    Array {
        /// Element type.
        element: Box<HwType>,
        /// Number of elements.
        length: u32,
    },
}

impl HwType {
    /// Maps a scalar shape to a type; width 1 unsigned stays a vector.
    pub fn scalar(width: u16, signed: bool) -> Self {
        if signed {
            HwType::Signed(width)
        } else {
            HwType::Unsigned(width)
        }
    }

    /// Returns `(width, signed)` for vector types and `(1, false)` for booleans.
    pub fn shape(&self) -> Option<(u16, bool)> {
        match self {
            HwType::Boolean => Some((1, false)),
            HwType::Signed(w) => Some((*w, true)),
            HwType::Unsigned(w) => Some((*w, false)),
            HwType::Array { .. } => None,
        }
    }

    /// Returns the element type of an array.
    pub fn element(&self) -> Option<&HwType> {
        match self {
            HwType::Array { element, .. } => Some(element),
            _ => None,
        }
    }
}

impl fmt::Display for HwType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HwType::Boolean => write!(f, "bool"),
            HwType::Signed(w) => write!(f, "i{w}"),
            HwType::Unsigned(w) => write!(f, "u{w}"),
            HwType::Array { element, length } => write!(f, "{element}[{length}]"),
        }
    }
}

/// A port of an invocation interface.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PortKind {
    /// Raised by the caller to start an invocation.
    Started,
    /// Raised by the callee once the result is ready.
    Finished,
    /// One argument.
    Parameter(String),
    /// The return value.
    Return,
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortKind::Started => write!(f, "Started"),
            PortKind::Finished => write!(f, "Finished"),
            PortKind::Parameter(name) => write!(f, "Parameter.{name}"),
            PortKind::Return => write!(f, "Return"),
        }
    }
}

/// A signal seen from inside a component. Instance numbers are filled in
/// when the component is written out once per physical instance.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignalRef {
    /// A port of the component's own invocation interface.
    Own(PortKind),
    /// A port of one of the component's outgoing invocation slots.
    Invocation {
        /// Full name of the called member.
        target: String,
        /// Slot index among this component's slots for `target`.
        slot: u32,
        /// The port.
        port: PortKind,
    },
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HwUnaryOp {
    /// Two's complement negation.
    Neg,
    /// Bitwise or boolean complement.
    Not,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HwBinaryOp {
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
    /// AND.
    And,
    /// OR.
    Or,
    /// XOR.
    Xor,
    /// Left shift.
    Shl,
    /// Right shift.
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
}

/// A hardware expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HwExpr {
    /// A boolean constant.
    Bool(bool),
    /// An integer constant of the given type.
    Int {
        /// The value.
        value: i64,
        /// Its type.
        ty: HwType,
    },
    /// A process variable.
    Variable(String),
    /// A signal.
    Signal(SignalRef),
    /// A unary operation.
    Unary {
        /// Operator.
        op: HwUnaryOp,
        /// Operand.
        operand: Box<HwExpr>,
    },
    /// A binary operation.
    Binary {
        /// Operator.
        op: HwBinaryOp,
        /// Left operand.
        lhs: Box<HwExpr>,
        /// Right operand.
        rhs: Box<HwExpr>,
        /// Result type.
        ty: HwType,
    },
    /// An array element read.
    Index {
        /// The array.
        array: Box<HwExpr>,
        /// The index.
        index: Box<HwExpr>,
    },
    /// A width or signedness conversion.
    Resize {
        /// The converted value.
        operand: Box<HwExpr>,
        /// Its type.
        from: HwType,
        /// The target type.
        to: HwType,
    },
}

impl HwExpr {
    /// A variable reference.
    pub fn var(name: impl Into<String>) -> Self {
        HwExpr::Variable(name.into())
    }

    /// A reference to one of the component's own ports.
    pub fn own(port: PortKind) -> Self {
        HwExpr::Signal(SignalRef::Own(port))
    }
}

/// An assignable location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HwTarget {
    /// A process variable.
    Variable(String),
    /// One element of an array variable.
    Element {
        /// The array variable.
        array: String,
        /// The index.
        index: HwExpr,
    },
    /// A signal.
    Signal(SignalRef),
}

/// A sequential statement executed inside a state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HwStmt {
    /// An assignment.
    Assign {
        /// Location.
        target: HwTarget,
        /// Value.
        value: HwExpr,
    },
    /// A conditional block.
    If {
        /// The condition.
        condition: HwExpr,
        /// Statements run when it holds.
        then_body: Vec<HwStmt>,
        /// Statements run otherwise.
        else_body: Vec<HwStmt>,
    },
    /// A comment, written in verbose mode only.
    Comment(String),
}

impl HwStmt {
    /// Assigns a variable.
    pub fn set_var(name: impl Into<String>, value: HwExpr) -> Self {
        HwStmt::Assign {
            target: HwTarget::Variable(name.into()),
            value,
        }
    }

    /// Drives a signal.
    pub fn drive(signal: SignalRef, value: HwExpr) -> Self {
        HwStmt::Assign {
            target: HwTarget::Signal(signal),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_display() {
        assert_eq!(HwType::Signed(32).to_string(), "i32");
        assert_eq!(
            HwType::Array {
                element: Box::new(HwType::Unsigned(8)),
                length: 4
            }
            .to_string(),
            "u8[4]"
        );
    }

    #[test]
    fn shapes() {
        assert_eq!(HwType::scalar(16, true), HwType::Signed(16));
        assert_eq!(HwType::Boolean.shape(), Some((1, false)));
        assert_eq!(HwType::Unsigned(8).shape(), Some((8, false)));
        let arr = HwType::Array {
            element: Box::new(HwType::Boolean),
            length: 2,
        };
        assert_eq!(arr.shape(), None);
        assert_eq!(arr.element(), Some(&HwType::Boolean));
    }

    #[test]
    fn port_display() {
        assert_eq!(PortKind::Parameter("x".into()).to_string(), "Parameter.x");
        assert_eq!(PortKind::Return.to_string(), "Return");
    }
}
