//! Identifier generation for both generation modes.
//!
//! Verbose mode keeps source names as VHDL extended identifiers
//! (`\Type.Member(i32).0.Started\`). Compact mode uses short positional
//! names (`c0_0_start`) that depend only on the canonical component order.

use crate::component::{ArchitectureComponent, ComponentPort};
use crate::hw::{HwType, PortKind};
use crate::ids::StateId;
use silica_config::GenerationMode;
use std::collections::BTreeMap;

/// Wraps `text` as an extended identifier, doubling inner backslashes.
pub fn extended(text: &str) -> String {
    format!("\\{}\\", text.replace('\\', "\\\\"))
}

/// Returns the package-level name of an array type.
pub fn array_type_name(ty: &HwType) -> String {
    match ty {
        HwType::Array { element, length } => {
            format!("array_{}_{}", scalar_tag(element), length)
        }
        other => scalar_tag(other),
    }
}

fn scalar_tag(ty: &HwType) -> String {
    match ty {
        HwType::Boolean => "bool".to_string(),
        HwType::Signed(w) => format!("i{w}"),
        HwType::Unsigned(w) => format!("u{w}"),
        HwType::Array { .. } => array_type_name(ty),
    }
}

fn compact_port(port: &PortKind, parameters: &[ComponentPort]) -> String {
    match port {
        PortKind::Started => "start".to_string(),
        PortKind::Finished => "done".to_string(),
        PortKind::Parameter(name) => {
            let index = parameters
                .iter()
                .position(|p| &p.name == name)
                .unwrap_or(parameters.len());
            format!("p{index}")
        }
        PortKind::Return => "ret".to_string(),
    }
}

/// Identifier factory shared by every part of one VHDL file.
pub struct Names<'a> {
    mode: GenerationMode,
    components: BTreeMap<&'a str, (usize, &'a ArchitectureComponent)>,
}

impl<'a> Names<'a> {
    /// Indexes components by their position in canonical order.
    pub fn new(mode: GenerationMode, components: &'a [ArchitectureComponent]) -> Self {
        let components = components
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.as_str(), (i, c)))
            .collect();
        Self { mode, components }
    }

    /// Returns true in verbose mode.
    pub fn verbose(&self) -> bool {
        self.mode == GenerationMode::Verbose
    }

    fn tag(&self, member: &str) -> String {
        match self.components.get(member) {
            Some((index, _)) => format!("c{index}"),
            None => format!(
                "x_{}",
                member
                    .chars()
                    .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                    .collect::<String>()
            ),
        }
    }

    fn parameters(&self, member: &str) -> &'a [ComponentPort] {
        self.components
            .get(member)
            .map(|(_, c)| c.parameters.as_slice())
            .unwrap_or(&[])
    }

    /// A port of one physical instance of `member`.
    pub fn instance_signal(&self, member: &str, instance: u32, port: &PortKind) -> String {
        if self.verbose() {
            extended(&format!("{member}.{instance}.{port}"))
        } else {
            format!(
                "{}_{instance}_{}",
                self.tag(member),
                compact_port(port, self.parameters(member))
            )
        }
    }

    /// A port of one caller-side invocation slot for `target`.
    pub fn slot_signal(
        &self,
        target: &str,
        caller: &str,
        caller_instance: u32,
        slot: u32,
        port: &PortKind,
    ) -> String {
        if self.verbose() {
            extended(&format!(
                "{target}.Invocation.{caller}.{caller_instance}.{slot}.{port}"
            ))
        } else {
            let caller_tag = if self.components.contains_key(caller) {
                self.tag(caller)
            } else {
                "ext".to_string()
            };
            format!(
                "{}_from_{caller_tag}_{caller_instance}_{slot}_{}",
                self.tag(target),
                compact_port(port, self.parameters(target))
            )
        }
    }

    /// A top-level entity port belonging to one entry point.
    pub fn entry_port(&self, member: &str, member_id: u32, port: &PortKind) -> String {
        if self.verbose() {
            extended(&format!("{member}.{port}"))
        } else {
            format!("m{member_id}_{}", compact_port(port, self.parameters(member)))
        }
    }

    /// A state literal.
    pub fn state(&self, id: StateId) -> String {
        if self.verbose() {
            format!("State_{}", id.as_raw())
        } else {
            format!("s{}", id.as_raw())
        }
    }

    /// A process variable, given its position among the declarations.
    pub fn variable(&self, name: &str, position: usize) -> String {
        if self.verbose() {
            extended(name)
        } else {
            format!("v{position}")
        }
    }

    /// The label of the process implementing one instance.
    pub fn process_label(&self, member: &str, instance: u32) -> String {
        format!("{}_{instance}", self.tag(member))
    }

    /// The label of the process implementing a proxy.
    pub fn proxy_label(&self, target: &str) -> String {
        format!("{}_proxy", self.tag(target))
    }
}
