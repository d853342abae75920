//! Expressions: typing, costing and conversion to [`HwExpr`].

use super::{Binding, Builder, Lowered};
use crate::error::TransformError;
use crate::types::{self, cost_shape, fits, promote};
use silica_ast::{BinaryOp, Expr, ExprKind, Literal, MemberHandle, TypeRef, UnaryOp};
use silica_ir::{HwBinaryOp, HwExpr, HwStmt, HwType, HwUnaryOp};
use silica_resolve::arrays::{member_array_key, return_array_key};
use silica_timing::Operator;

/// Converts `expr` from `from` to `to`. Integer constants that fit are
/// retyped rather than resized.
pub(super) fn coerce(expr: HwExpr, from: &HwType, to: &HwType) -> HwExpr {
    if from == to {
        return expr;
    }
    match expr {
        HwExpr::Int { value, .. } if fits(value, to) => HwExpr::Int {
            value,
            ty: to.clone(),
        },
        expr => HwExpr::Resize {
            operand: Box::new(expr),
            from: from.clone(),
            to: to.clone(),
        },
    }
}

/// Converts a lowered value to `to`.
pub(super) fn coerce_lowered(value: &Lowered, to: &HwType) -> HwExpr {
    coerce(value.expr.clone(), &value.ty, to)
}

fn int_literal(expr: &HwExpr) -> Option<i64> {
    match expr {
        HwExpr::Int { value, ty } if !matches!(ty, HwType::Array { .. }) => Some(*value),
        _ => None,
    }
}

/// The type both operands of a binary operation are converted to. A
/// constant adopts the other operand's type when it fits.
fn operand_type(
    lhs: &HwType,
    lhs_const: Option<i64>,
    rhs: &HwType,
    rhs_const: Option<i64>,
) -> Option<HwType> {
    match (lhs_const, rhs_const) {
        (Some(value), None) if fits(value, rhs) => Some(rhs.clone()),
        (None, Some(value)) if fits(value, lhs) => Some(lhs.clone()),
        _ => promote(lhs, rhs),
    }
}

fn hw_binary(op: BinaryOp) -> HwBinaryOp {
    match op {
        BinaryOp::Add => HwBinaryOp::Add,
        BinaryOp::Sub => HwBinaryOp::Sub,
        BinaryOp::Mul => HwBinaryOp::Mul,
        BinaryOp::Div => HwBinaryOp::Div,
        BinaryOp::Rem => HwBinaryOp::Rem,
        BinaryOp::BitAnd | BinaryOp::LogicAnd => HwBinaryOp::And,
        BinaryOp::BitOr | BinaryOp::LogicOr => HwBinaryOp::Or,
        BinaryOp::BitXor => HwBinaryOp::Xor,
        BinaryOp::Shl => HwBinaryOp::Shl,
        BinaryOp::Shr => HwBinaryOp::Shr,
        BinaryOp::Eq => HwBinaryOp::Eq,
        BinaryOp::Ne => HwBinaryOp::Ne,
        BinaryOp::Lt => HwBinaryOp::Lt,
        BinaryOp::Le => HwBinaryOp::Le,
        BinaryOp::Gt => HwBinaryOp::Gt,
        BinaryOp::Ge => HwBinaryOp::Ge,
    }
}

fn timing_operator(op: BinaryOp) -> Operator {
    match op {
        BinaryOp::Add => Operator::Add,
        BinaryOp::Sub => Operator::Sub,
        BinaryOp::Mul => Operator::Mul,
        BinaryOp::Div => Operator::Div,
        BinaryOp::Rem => Operator::Rem,
        BinaryOp::BitAnd | BinaryOp::LogicAnd => Operator::And,
        BinaryOp::BitOr | BinaryOp::LogicOr => Operator::Or,
        BinaryOp::BitXor => Operator::Xor,
        BinaryOp::Shl => Operator::Shl,
        BinaryOp::Shr => Operator::Shr,
        BinaryOp::Eq => Operator::Eq,
        BinaryOp::Ne => Operator::Ne,
        BinaryOp::Lt => Operator::Lt,
        BinaryOp::Le => Operator::Le,
        BinaryOp::Gt => Operator::Gt,
        BinaryOp::Ge => Operator::Ge,
    }
}

fn is_bitwise(op: BinaryOp) -> bool {
    matches!(op, BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor)
}

fn literal(literal: &Literal) -> Lowered {
    match *literal {
        Literal::Bool(value) => Lowered::free(HwExpr::Bool(value), HwType::Boolean),
        Literal::Int {
            value,
            width,
            signed,
        } => {
            let ty = HwType::scalar(width, signed);
            Lowered::free(HwExpr::Int { value, ty: ty.clone() }, ty)
        }
    }
}

fn scalar_cast_type(ty: &TypeRef) -> Option<HwType> {
    match ty {
        TypeRef::Bool => Some(HwType::Boolean),
        TypeRef::Int { width, signed } => Some(HwType::scalar(*width, *signed)),
        _ => None,
    }
}

impl Builder<'_> {
    /// Cycles one `operator` takes on values of `ty`.
    pub(super) fn op_cost(
        &self,
        operator: Operator,
        ty: &HwType,
        constant_rhs: Option<i64>,
    ) -> Result<f64, TransformError> {
        let (width, signed) = cost_shape(ty)
            .ok_or_else(|| self.unsupported(format!("`{operator}` on a value of type {ty}")))?;
        Ok(self
            .ctx
            .timing
            .clock_cycles(operator, width, signed, constant_rhs)?)
    }

    /// Return type of a called member.
    pub(super) fn callee_return_type(
        &self,
        handle: MemberHandle,
    ) -> Result<Option<HwType>, TransformError> {
        let callee = self.ctx.member_name(handle);
        types::return_type(
            &self.ctx.tree.method(handle).return_type,
            &return_array_key(&callee),
            &self.ctx.arrays,
            self.member_name(),
        )
    }

    /// Lowers a call-free expression, or one whose calls were evaluated
    /// ahead by [`Builder::prepare`].
    pub(super) fn expr(&mut self, e: &Expr) -> Result<Lowered, TransformError> {
        if let Some(result) = self.results.get(&e.id) {
            return result
                .clone()
                .map(|value| Lowered::free(value.expr, value.ty))
                .ok_or_else(|| self.unsupported("use of a void call result"));
        }
        match &e.kind {
            ExprKind::Literal(value) => Ok(literal(value)),
            ExprKind::Local(name) | ExprKind::Parameter(name) => Ok(match self.lookup(name)? {
                Binding::Var { name, ty } => Lowered::free(HwExpr::var(name), ty),
                Binding::Const { value, ty } => Lowered::free(value, ty),
            }),
            ExprKind::Field(field) => Err(self.unsupported(format!(
                "field access `{}.{}`",
                field.declaring_type, field.name
            ))),
            ExprKind::Unary { op, operand } => {
                let value = self.expr(operand)?;
                let (hw_op, operator) = match op {
                    UnaryOp::Neg => (HwUnaryOp::Neg, Operator::Neg),
                    UnaryOp::Not | UnaryOp::LogicNot => (HwUnaryOp::Not, Operator::Not),
                };
                if *op == UnaryOp::Neg && value.ty == HwType::Boolean {
                    return Err(self.unsupported("negation of a boolean"));
                }
                let cost = self.op_cost(operator, &value.ty, None)? + value.cost;
                Ok(Lowered {
                    expr: HwExpr::Unary {
                        op: hw_op,
                        operand: Box::new(value.expr),
                    },
                    ty: value.ty,
                    cost,
                })
            }
            ExprKind::Binary { op, lhs, rhs } => self.binary(*op, lhs, rhs),
            ExprKind::Call { .. } => {
                self.prepare(e)?;
                self.expr(e)
            }
            ExprKind::NewArray { element, length } => {
                let ty = self.new_array_type(element, length)?;
                Ok(Lowered::free(HwExpr::Int { value: 0, ty: ty.clone() }, ty))
            }
            ExprKind::ArrayElement { array, index } => {
                let array = self.expr(array)?;
                let index = self.expr(index)?;
                let element = array
                    .ty
                    .element()
                    .cloned()
                    .ok_or_else(|| self.unsupported("indexing a value that is not an array"))?;
                let cost = self.op_cost(Operator::Index, &index.ty, None)?
                    + array.cost.max(index.cost);
                Ok(Lowered {
                    expr: HwExpr::Index {
                        array: Box::new(array.expr),
                        index: Box::new(index.expr),
                    },
                    ty: element,
                    cost,
                })
            }
            ExprKind::ArrayLength(array) => match self.infer(array)? {
                HwType::Array { length, .. } => Ok(Lowered::free(
                    HwExpr::Int {
                        value: i64::from(length),
                        ty: HwType::Signed(32),
                    },
                    HwType::Signed(32),
                )),
                _ => Err(self.unsupported("length of a value that is not an array")),
            },
            ExprKind::Conditional {
                condition,
                if_true,
                if_false,
            } => {
                let ty = self.infer(e)?;
                let condition = self.expr(condition)?;
                let if_true = self.expr(if_true)?;
                let if_false = self.expr(if_false)?;
                let var = self.temp(ty.clone(), "conditional value");
                let cost = condition.cost + if_true.cost.max(if_false.cost);
                self.emit(
                    HwStmt::If {
                        condition: coerce_lowered(&condition, &HwType::Boolean),
                        then_body: vec![HwStmt::set_var(var.clone(), coerce_lowered(&if_true, &ty))],
                        else_body: vec![HwStmt::set_var(var.clone(), coerce_lowered(&if_false, &ty))],
                    },
                    cost,
                );
                Ok(Lowered::free(HwExpr::var(var), ty))
            }
            ExprKind::Cast { ty, operand } => {
                let to = scalar_cast_type(ty)
                    .ok_or_else(|| self.unsupported(format!("conversion to `{ty}`")))?;
                let value = self.expr(operand)?;
                Ok(Lowered {
                    expr: coerce_lowered(&value, &to),
                    ty: to,
                    cost: value.cost,
                })
            }
        }
    }

    fn binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<Lowered, TransformError> {
        let l = self.expr(lhs)?;
        let r = self.expr(rhs)?;
        let rhs_const = int_literal(&r.expr);

        if matches!(op, BinaryOp::Shl | BinaryOp::Shr) {
            let cost = self.op_cost(timing_operator(op), &l.ty, rhs_const)? + l.cost.max(r.cost);
            let ty = l.ty.clone();
            return Ok(Lowered {
                expr: HwExpr::Binary {
                    op: hw_binary(op),
                    lhs: Box::new(l.expr),
                    rhs: Box::new(r.expr),
                    ty: ty.clone(),
                },
                ty,
                cost,
            });
        }

        let operands = if op.is_logical() {
            if l.ty != HwType::Boolean || r.ty != HwType::Boolean {
                return Err(self.unsupported("short-circuit operator on non-boolean operands"));
            }
            HwType::Boolean
        } else {
            operand_type(&l.ty, int_literal(&l.expr), &r.ty, rhs_const).ok_or_else(|| {
                self.unsupported(format!("operands of types {} and {}", l.ty, r.ty))
            })?
        };
        if operands == HwType::Boolean
            && !(op.is_logical() || is_bitwise(op) || matches!(op, BinaryOp::Eq | BinaryOp::Ne))
        {
            return Err(self.unsupported("arithmetic on booleans"));
        }
        let ty = if op.is_comparison() {
            HwType::Boolean
        } else {
            operands.clone()
        };
        let cost = self.op_cost(timing_operator(op), &operands, rhs_const)? + l.cost.max(r.cost);
        Ok(Lowered {
            expr: HwExpr::Binary {
                op: hw_binary(op),
                lhs: Box::new(coerce_lowered(&l, &operands)),
                rhs: Box::new(coerce_lowered(&r, &operands)),
                ty: ty.clone(),
            },
            ty,
            cost,
        })
    }

    fn new_array_type(&self, element: &TypeRef, length: &Expr) -> Result<HwType, TransformError> {
        let element = scalar_cast_type(element)
            .ok_or_else(|| self.unsupported(format!("array of `{element}`")))?;
        let length = length
            .as_literal()
            .and_then(Literal::as_int)
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| self.unsupported("array allocated with a non-constant length"))?;
        Ok(HwType::Array {
            element: Box::new(element),
            length,
        })
    }

    /// The type `e` lowers to, without lowering it.
    pub(super) fn infer(&self, e: &Expr) -> Result<HwType, TransformError> {
        if let Some(result) = self.results.get(&e.id) {
            return result
                .as_ref()
                .map(|value| value.ty.clone())
                .ok_or_else(|| self.unsupported("use of a void call result"));
        }
        match &e.kind {
            ExprKind::Literal(value) => Ok(literal(value).ty),
            ExprKind::Local(name) | ExprKind::Parameter(name) => Ok(match self.lookup(name)? {
                Binding::Var { ty, .. } | Binding::Const { ty, .. } => ty,
            }),
            ExprKind::Field(field) => Err(self.unsupported(format!(
                "field access `{}.{}`",
                field.declaring_type, field.name
            ))),
            ExprKind::Unary { operand, .. } => self.infer(operand),
            ExprKind::Binary { op, lhs, rhs } => {
                if op.is_comparison() || op.is_logical() {
                    return Ok(HwType::Boolean);
                }
                let l = self.infer(lhs)?;
                if matches!(op, BinaryOp::Shl | BinaryOp::Shr) {
                    return Ok(l);
                }
                let r = self.infer(rhs)?;
                let constant = |e: &Expr| e.as_literal().and_then(Literal::as_int);
                operand_type(&l, constant(lhs), &r, constant(rhs)).ok_or_else(|| {
                    self.unsupported(format!("operands of types {l} and {r}"))
                })
            }
            ExprKind::Call { target, .. } => {
                let handle = self
                    .ctx
                    .types
                    .resolve_call(target)
                    .ok_or_else(|| self.unsupported(format!("call to unknown member `{}`", target.name)))?;
                self.callee_return_type(handle)?
                    .ok_or_else(|| self.unsupported("use of a void call result"))
            }
            ExprKind::NewArray { element, length } => self.new_array_type(element, length),
            ExprKind::ArrayElement { array, .. } => self
                .infer(array)?
                .element()
                .cloned()
                .ok_or_else(|| self.unsupported("indexing a value that is not an array")),
            ExprKind::ArrayLength(_) => Ok(HwType::Signed(32)),
            ExprKind::Conditional {
                if_true, if_false, ..
            } => {
                let a = self.infer(if_true)?;
                let b = self.infer(if_false)?;
                let constant = |e: &Expr| e.as_literal().and_then(Literal::as_int);
                operand_type(&a, constant(if_true), &b, constant(if_false)).ok_or_else(|| {
                    self.unsupported(format!("conditional branches of types {a} and {b}"))
                })
            }
            ExprKind::Cast { ty, .. } => {
                scalar_cast_type(ty).ok_or_else(|| self.unsupported(format!("conversion to `{ty}`")))
            }
        }
    }

    /// Hardware type of a callee's parameter.
    pub(super) fn parameter_type(
        &self,
        callee: &str,
        param: &silica_ast::Parameter,
    ) -> Result<HwType, TransformError> {
        types::hw_type(
            &param.ty,
            &member_array_key(callee, &param.name),
            &self.ctx.arrays,
            self.member_name(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_retyped_when_they_fit() {
        let value = HwExpr::Int {
            value: 7,
            ty: HwType::Signed(32),
        };
        assert_eq!(
            coerce(value, &HwType::Signed(32), &HwType::Unsigned(8)),
            HwExpr::Int {
                value: 7,
                ty: HwType::Unsigned(8)
            }
        );
        let big = HwExpr::Int {
            value: 300,
            ty: HwType::Signed(32),
        };
        assert!(matches!(
            coerce(big, &HwType::Signed(32), &HwType::Unsigned(8)),
            HwExpr::Resize { .. }
        ));
    }

    #[test]
    fn constant_operands_adopt_the_other_type() {
        assert_eq!(
            operand_type(&HwType::Unsigned(16), None, &HwType::Signed(32), Some(3)),
            Some(HwType::Unsigned(16))
        );
        assert_eq!(
            operand_type(&HwType::Unsigned(8), None, &HwType::Signed(32), Some(-1)),
            Some(HwType::Signed(32))
        );
    }
}
