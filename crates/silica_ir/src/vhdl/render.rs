//! Rendering of hardware types, expressions and statements as VHDL text.

use super::names::{array_type_name, Names};
use super::Emitter;
use crate::component::ArchitectureComponent;
use crate::hw::{HwBinaryOp, HwExpr, HwStmt, HwTarget, HwType, HwUnaryOp, SignalRef};
use std::collections::HashMap;

/// Returns the VHDL subtype indication for a hardware type.
pub fn vhdl_type(ty: &HwType) -> String {
    match ty {
        HwType::Boolean => "boolean".to_string(),
        HwType::Signed(w) => format!("signed({} downto 0)", w.saturating_sub(1)),
        HwType::Unsigned(w) => format!("unsigned({} downto 0)", w.saturating_sub(1)),
        HwType::Array { .. } => array_type_name(ty),
    }
}

/// Returns the reset value of a hardware type.
pub fn default_value(ty: &HwType) -> String {
    match ty {
        HwType::Boolean => "false".to_string(),
        HwType::Signed(_) | HwType::Unsigned(_) => "(others => '0')".to_string(),
        HwType::Array { element, .. } => format!("(others => {})", default_value(element)),
    }
}

fn bit_string(value: i64, width: u16) -> String {
    (0..width)
        .rev()
        .map(|bit| {
            let shifted = value >> u32::from(bit).min(63);
            if shifted & 1 == 1 {
                '1'
            } else {
                '0'
            }
        })
        .collect()
}

/// Renders an integer constant of the given type.
pub fn literal(value: i64, ty: &HwType) -> String {
    match ty {
        HwType::Boolean => (value != 0).to_string(),
        HwType::Signed(w) => {
            if i32::try_from(value).is_ok() {
                format!("to_signed({value}, {w})")
            } else {
                format!("signed'(\"{}\")", bit_string(value, *w))
            }
        }
        HwType::Unsigned(w) => {
            if (0..=i64::from(i32::MAX)).contains(&value) {
                format!("to_unsigned({value}, {w})")
            } else {
                format!("unsigned'(\"{}\")", bit_string(value, *w))
            }
        }
        HwType::Array { element, .. } => format!("(others => {})", literal(value, element)),
    }
}

/// Naming context of one component instance.
pub struct Scope<'n, 'a> {
    names: &'n Names<'a>,
    component: &'a ArchitectureComponent,
    instance: u32,
    variables: HashMap<&'a str, usize>,
}

impl<'n, 'a> Scope<'n, 'a> {
    /// Creates the scope of `instance` of `component`.
    pub fn new(names: &'n Names<'a>, component: &'a ArchitectureComponent, instance: u32) -> Self {
        let variables = component
            .declarations
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name.as_str(), i))
            .collect();
        Self {
            names,
            component,
            instance,
            variables,
        }
    }

    /// Returns the identifier of a process variable.
    pub fn variable(&self, name: &str) -> String {
        let position = self
            .variables
            .get(name)
            .copied()
            .unwrap_or(self.variables.len());
        self.names.variable(name, position)
    }

    /// Returns the identifier of a signal as seen by this instance.
    pub fn signal(&self, signal: &SignalRef) -> String {
        match signal {
            SignalRef::Own(port) => {
                self.names
                    .instance_signal(&self.component.name, self.instance, port)
            }
            SignalRef::Invocation { target, slot, port } => self.names.slot_signal(
                target,
                &self.component.name,
                self.instance,
                *slot,
                port,
            ),
        }
    }

    /// Renders an expression.
    pub fn expr(&self, expr: &HwExpr) -> String {
        match expr {
            HwExpr::Bool(b) => b.to_string(),
            HwExpr::Int { value, ty } => literal(*value, ty),
            HwExpr::Variable(name) => self.variable(name),
            HwExpr::Signal(signal) => self.signal(signal),
            HwExpr::Unary { op, operand } => {
                let operand = self.expr(operand);
                match op {
                    HwUnaryOp::Neg => format!("(-{operand})"),
                    HwUnaryOp::Not => format!("(not {operand})"),
                }
            }
            HwExpr::Binary { op, lhs, rhs, ty } => {
                let (l, r) = (self.expr(lhs), self.expr(rhs));
                match op {
                    HwBinaryOp::Mul => {
                        let width = ty.shape().map(|(w, _)| w).unwrap_or(32);
                        format!("resize({l} * {r}, {width})")
                    }
                    HwBinaryOp::Shl => format!("shift_left({l}, to_integer({r}))"),
                    HwBinaryOp::Shr => format!("shift_right({l}, to_integer({r}))"),
                    other => format!("({l} {} {r})", infix(*other)),
                }
            }
            HwExpr::Index { array, index } => {
                format!("{}(to_integer({}))", self.expr(array), self.expr(index))
            }
            HwExpr::Resize { operand, from, to } => resize(&self.expr(operand), from, to),
        }
    }

    /// Renders an assignment target and the matching assignment operator.
    fn target(&self, target: &HwTarget) -> (String, &'static str) {
        match target {
            HwTarget::Variable(name) => (self.variable(name), ":="),
            HwTarget::Element { array, index } => (
                format!("{}(to_integer({}))", self.variable(array), self.expr(index)),
                ":=",
            ),
            HwTarget::Signal(signal) => (self.signal(signal), "<="),
        }
    }

    /// Writes a statement list.
    pub fn stmts(&self, out: &mut Emitter, stmts: &[HwStmt]) {
        for stmt in stmts {
            self.stmt(out, stmt);
        }
    }

    fn stmt(&self, out: &mut Emitter, stmt: &HwStmt) {
        match stmt {
            HwStmt::Assign { target, value } => {
                let (target, op) = self.target(target);
                out.line(format!("{target} {op} {};", self.expr(value)));
            }
            HwStmt::If {
                condition,
                then_body,
                else_body,
            } => {
                out.line(format!("if {} then", self.expr(condition)));
                out.indent();
                if then_body.is_empty() {
                    out.line("null;");
                }
                self.stmts(out, then_body);
                out.dedent();
                if !else_body.is_empty() {
                    out.line("else");
                    out.indent();
                    self.stmts(out, else_body);
                    out.dedent();
                }
                out.line("end if;");
            }
            HwStmt::Comment(text) => {
                if self.names.verbose() {
                    out.comment(text);
                }
            }
        }
    }
}

fn infix(op: HwBinaryOp) -> &'static str {
    match op {
        HwBinaryOp::Add => "+",
        HwBinaryOp::Sub => "-",
        HwBinaryOp::Mul => "*",
        HwBinaryOp::Div => "/",
        HwBinaryOp::Rem => "rem",
        HwBinaryOp::And => "and",
        HwBinaryOp::Or => "or",
        HwBinaryOp::Xor => "xor",
        HwBinaryOp::Shl => "sll",
        HwBinaryOp::Shr => "srl",
        HwBinaryOp::Eq => "=",
        HwBinaryOp::Ne => "/=",
        HwBinaryOp::Lt => "<",
        HwBinaryOp::Le => "<=",
        HwBinaryOp::Gt => ">",
        HwBinaryOp::Ge => ">=",
    }
}

fn resize(operand: &str, from: &HwType, to: &HwType) -> String {
    match (from, to) {
        (HwType::Boolean, HwType::Boolean) => operand.to_string(),
        (_, HwType::Boolean) => format!("({operand} /= 0)"),
        (HwType::Signed(_), HwType::Signed(w)) | (HwType::Unsigned(_), HwType::Unsigned(w)) => {
            format!("resize({operand}, {w})")
        }
        (HwType::Signed(_), HwType::Unsigned(w)) => format!("unsigned(resize({operand}, {w}))"),
        (HwType::Unsigned(_), HwType::Signed(w)) => format!("signed(resize({operand}, {w}))"),
        _ => operand.to_string(),
    }
}
