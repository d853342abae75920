//! Compile-time evaluation of literal operations.
//!
//! Integer arithmetic wraps at the operand width, matching two's complement
//! hardware. Operations that cannot be evaluated exactly (division by zero,
//! mixed operand types) return `None` and are left in the tree.

use silica_ast::{BinaryOp, Literal, TypeRef, UnaryOp};

/// Truncates `value` to `width` bits, sign-extending when `signed`.
pub fn wrap(value: i128, width: u16, signed: bool) -> i64 {
    let bits = u32::from(width.min(64));
    if bits == 0 {
        return 0;
    }
    let mask = (1i128 << bits) - 1;
    let mut truncated = value & mask;
    if signed && (truncated >> (bits - 1)) & 1 == 1 {
        truncated -= 1i128 << bits;
    }
    truncated as i64
}

/// Returns the mathematical value of an integer literal.
fn numeric(value: i64, width: u16, signed: bool) -> i128 {
    if signed {
        i128::from(value)
    } else {
        let bits = u32::from(width.min(64));
        let raw = value as u64 as i128;
        if bits == 64 {
            raw
        } else {
            raw & ((1i128 << bits) - 1)
        }
    }
}

fn int(value: i128, width: u16, signed: bool) -> Literal {
    Literal::Int {
        value: wrap(value, width, signed),
        width,
        signed,
    }
}

/// Evaluates a unary operator on a literal.
pub fn eval_unary(op: UnaryOp, operand: &Literal) -> Option<Literal> {
    match (op, *operand) {
        (UnaryOp::LogicNot, Literal::Bool(b)) => Some(Literal::Bool(!b)),
        (UnaryOp::Neg, Literal::Int { value, width, signed }) => {
            Some(int(-numeric(value, width, signed), width, signed))
        }
        (UnaryOp::Not, Literal::Int { value, width, signed }) => {
            Some(int(!numeric(value, width, signed), width, signed))
        }
        (UnaryOp::Not, Literal::Bool(b)) => Some(Literal::Bool(!b)),
        _ => None,
    }
}

/// Evaluates a binary operator on two literals.
pub fn eval_binary(op: BinaryOp, lhs: &Literal, rhs: &Literal) -> Option<Literal> {
    match (*lhs, *rhs) {
        (Literal::Bool(a), Literal::Bool(b)) => {
            let value = match op {
                BinaryOp::LogicAnd | BinaryOp::BitAnd => a && b,
                BinaryOp::LogicOr | BinaryOp::BitOr => a || b,
                BinaryOp::BitXor | BinaryOp::Ne => a != b,
                BinaryOp::Eq => a == b,
                _ => return None,
            };
            Some(Literal::Bool(value))
        }
        (
            Literal::Int {
                value: a,
                width,
                signed,
            },
            Literal::Int {
                value: b,
                width: rhs_width,
                signed: rhs_signed,
            },
        ) => {
            let x = numeric(a, width, signed);
            let y = numeric(b, rhs_width, rhs_signed);
            if matches!(op, BinaryOp::Shl | BinaryOp::Shr) {
                let amount = (y & i128::from(width.max(1) - 1)) as u32;
                let shifted = if op == BinaryOp::Shl {
                    x << amount
                } else {
                    x >> amount
                };
                return Some(int(shifted, width, signed));
            }
            if width != rhs_width || signed != rhs_signed {
                return None;
            }
            let value = match op {
                BinaryOp::Add => x + y,
                BinaryOp::Sub => x - y,
                BinaryOp::Mul => x.checked_mul(y)?,
                BinaryOp::Div if y != 0 => x / y,
                BinaryOp::Rem if y != 0 => x % y,
                BinaryOp::BitAnd => x & y,
                BinaryOp::BitOr => x | y,
                BinaryOp::BitXor => x ^ y,
                BinaryOp::Eq => return Some(Literal::Bool(x == y)),
                BinaryOp::Ne => return Some(Literal::Bool(x != y)),
                BinaryOp::Lt => return Some(Literal::Bool(x < y)),
                BinaryOp::Le => return Some(Literal::Bool(x <= y)),
                BinaryOp::Gt => return Some(Literal::Bool(x > y)),
                BinaryOp::Ge => return Some(Literal::Bool(x >= y)),
                _ => return None,
            };
            Some(int(value, width, signed))
        }
        _ => None,
    }
}

/// Converts a literal to `ty`.
pub fn eval_cast(ty: &TypeRef, operand: &Literal) -> Option<Literal> {
    match (ty, *operand) {
        (TypeRef::Int { width, signed }, Literal::Int { value, width: w, signed: s }) => {
            Some(int(numeric(value, w, s), *width, *signed))
        }
        (TypeRef::Bool, Literal::Bool(b)) => Some(Literal::Bool(b)),
        _ => None,
    }
}
