//! Costed operators.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An operation with a device-specific latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Negation.
    Neg,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
    /// Remainder.
    Rem,
    /// Bitwise or logical AND.
    And,
    /// Bitwise or logical OR.
    Or,
    /// Bitwise or logical XOR.
    Xor,
    /// Bitwise or logical NOT.
    Not,
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
    /// Array element access.
    Index,
}

const NAMES: &[(Operator, &str)] = &[
    (Operator::Add, "add"),
    (Operator::Sub, "sub"),
    (Operator::Neg, "neg"),
    (Operator::Mul, "mul"),
    (Operator::Div, "div"),
    (Operator::Rem, "rem"),
    (Operator::And, "and"),
    (Operator::Or, "or"),
    (Operator::Xor, "xor"),
    (Operator::Not, "not"),
    (Operator::Shl, "shl"),
    (Operator::Shr, "shr"),
    (Operator::Eq, "eq"),
    (Operator::Ne, "ne"),
    (Operator::Lt, "lt"),
    (Operator::Le, "le"),
    (Operator::Gt, "gt"),
    (Operator::Ge, "ge"),
    (Operator::Index, "index"),
];

impl Operator {
    /// Returns the report name of this operator.
    pub fn as_str(self) -> &'static str {
        NAMES
            .iter()
            .find(|(op, _)| *op == self)
            .map(|(_, name)| *name)
            .unwrap_or("?")
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NAMES
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(s.trim()))
            .map(|(op, _)| *op)
            .ok_or_else(|| format!("unknown operator `{s}`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_roundtrip() {
        for (op, name) in NAMES {
            assert_eq!(op.as_str(), *name);
            assert_eq!(name.parse::<Operator>().unwrap(), *op);
        }
    }

    #[test]
    fn unknown_operator() {
        assert!("pow".parse::<Operator>().is_err());
        assert_eq!("MUL".parse::<Operator>().unwrap(), Operator::Mul);
    }
}
