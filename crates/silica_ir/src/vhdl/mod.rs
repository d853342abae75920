//! VHDL writer.
//!
//! Produces one file holding a `Silica_Types` package with every array type
//! in use, and the `Silica_Hardware` top entity. The architecture contains
//! the member-id dispatch process, one process per component instance and
//! one per invocation proxy. Output depends only on the manifest, the
//! device and the generation mode.

mod names;
mod process;
mod render;

pub use names::{array_type_name, extended};
pub use render::{literal, vhdl_type};

use crate::component::ComponentPort;
use crate::hw::{HwType, PortKind};
use crate::manifest::TransformedManifest;
use crate::proxy::{InvocationProxy, ProxyKind, EXTERNAL_CALLER};
use names::Names;
use render::default_value;
use silica_config::GenerationMode;
use silica_timing::DeviceManifest;
use std::collections::BTreeSet;

/// Name of the generated top entity.
pub const TOP_ENTITY: &str = "Silica_Hardware";

/// Name of the generated type package.
pub const TYPES_PACKAGE: &str = "Silica_Types";

/// Indented line buffer.
#[derive(Debug, Default)]
pub struct Emitter {
    out: String,
    depth: usize,
}

impl Emitter {
    /// Appends one line at the current depth.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.out.push_str("  ");
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    /// Appends an empty line.
    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// Appends a comment, one `--` line per text line.
    pub fn comment(&mut self, text: &str) {
        for part in text.lines() {
            self.line(format!("-- {part}"));
        }
    }

    /// Increases the depth.
    pub fn indent(&mut self) {
        self.depth += 1;
    }

    /// Decreases the depth.
    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Returns the text written so far.
    pub fn finish(self) -> String {
        self.out
    }
}

/// Renders `manifest` as VHDL.
pub fn write_vhdl(
    manifest: &TransformedManifest,
    device: &DeviceManifest,
    identity: &str,
    mode: GenerationMode,
) -> String {
    let names = Names::new(mode, &manifest.components);
    let mut out = Emitter::default();

    if names.verbose() {
        out.comment(&format!("Generated by silica for {} at {}", device.name, device.clock));
        out.comment(&format!("Transformation identity: {identity}"));
        out.blank();
    }
    write_package(&mut out, manifest);
    out.blank();
    write_entity(&mut out, &names, manifest);
    out.blank();
    write_architecture(&mut out, &names, manifest);
    out.finish()
}

fn libraries(out: &mut Emitter) {
    out.line("library ieee;");
    out.line("use ieee.std_logic_1164.all;");
    out.line("use ieee.numeric_std.all;");
}

fn collect_array(ty: &HwType, arrays: &mut BTreeSet<HwType>) {
    if let HwType::Array { element, .. } = ty {
        collect_array(element, arrays);
        arrays.insert(ty.clone());
    }
}

fn write_package(out: &mut Emitter, manifest: &TransformedManifest) {
    let mut arrays = BTreeSet::new();
    for component in &manifest.components {
        for port in &component.parameters {
            collect_array(&port.ty, &mut arrays);
        }
        if let Some(ty) = &component.return_type {
            collect_array(ty, &mut arrays);
        }
        for decl in &component.declarations {
            collect_array(&decl.ty, &mut arrays);
        }
    }

    libraries(out);
    out.blank();
    out.line(format!("package {TYPES_PACKAGE} is"));
    out.indent();
    for ty in &arrays {
        if let HwType::Array { element, length } = ty {
            out.line(format!(
                "type {} is array (0 to {}) of {};",
                array_type_name(ty),
                length.saturating_sub(1),
                vhdl_type(element)
            ));
        }
    }
    out.dedent();
    out.line(format!("end package {TYPES_PACKAGE};"));
}

fn write_entity(out: &mut Emitter, names: &Names<'_>, manifest: &TransformedManifest) {
    libraries(out);
    out.line(format!("use work.{TYPES_PACKAGE}.all;"));
    out.blank();
    out.line(format!("entity {TOP_ENTITY} is"));
    out.indent();
    out.line("port (");
    out.indent();
    let mut ports = vec![
        "Clock : in std_logic".to_string(),
        "Reset : in std_logic".to_string(),
        "MemberId : in natural".to_string(),
        "Started : in std_logic".to_string(),
        "Finished : out std_logic".to_string(),
    ];
    for entry in &manifest.entry_points {
        let Some(component) = manifest.component(&entry.full_name) else {
            continue;
        };
        for param in &component.parameters {
            ports.push(format!(
                "{} : in {}",
                names.entry_port(
                    &entry.full_name,
                    entry.member_id,
                    &PortKind::Parameter(param.name.clone())
                ),
                vhdl_type(&param.ty)
            ));
        }
        if let Some(ty) = &component.return_type {
            ports.push(format!(
                "{} : out {}",
                names.entry_port(&entry.full_name, entry.member_id, &PortKind::Return),
                vhdl_type(ty)
            ));
        }
    }
    let last = ports.len().saturating_sub(1);
    for (i, port) in ports.iter().enumerate() {
        if i == last {
            out.line(port);
        } else {
            out.line(format!("{port};"));
        }
    }
    out.dedent();
    out.line(");");
    out.dedent();
    out.line(format!("end entity {TOP_ENTITY};"));
}

fn interface_signals(
    ports: &[ComponentPort],
    return_type: Option<&HwType>,
    mut name: impl FnMut(&PortKind) -> String,
) -> Vec<String> {
    let mut signals = vec![
        format!("signal {} : boolean := false;", name(&PortKind::Started)),
        format!("signal {} : boolean := false;", name(&PortKind::Finished)),
    ];
    for port in ports {
        signals.push(format!(
            "signal {} : {} := {};",
            name(&PortKind::Parameter(port.name.clone())),
            vhdl_type(&port.ty),
            default_value(&port.ty)
        ));
    }
    if let Some(ty) = return_type {
        signals.push(format!(
            "signal {} : {} := {};",
            name(&PortKind::Return),
            vhdl_type(ty),
            default_value(ty)
        ));
    }
    signals
}

fn write_architecture(out: &mut Emitter, names: &Names<'_>, manifest: &TransformedManifest) {
    out.line(format!("architecture Behavioral of {TOP_ENTITY} is"));
    out.indent();
    for component in &manifest.components {
        if names.verbose() {
            out.comment(&format!("{} instances", component.name));
        }
        for instance in 0..component.instance_count {
            for signal in interface_signals(
                &component.parameters,
                component.return_type.as_ref(),
                |port| names.instance_signal(&component.name, instance, port),
            ) {
                out.line(signal);
            }
        }
    }
    for proxy in &manifest.proxies {
        if names.verbose() {
            out.comment(&format!("{} invocation slots", proxy.target));
        }
        for slot in &proxy.slots {
            for signal in interface_signals(&proxy.parameters, proxy.return_type.as_ref(), |port| {
                names.slot_signal(
                    &proxy.target,
                    &slot.caller,
                    slot.caller_instance,
                    slot.slot,
                    port,
                )
            }) {
                out.line(signal);
            }
        }
    }
    out.dedent();
    out.line("begin");
    out.indent();

    write_dispatch(out, names, manifest);
    for component in &manifest.components {
        for instance in 0..component.instance_count {
            out.blank();
            process::write_component_process(out, names, component, instance);
        }
    }
    for proxy in &manifest.proxies {
        out.blank();
        match proxy.kind {
            ProxyKind::Direct => write_direct_proxy(out, names, proxy),
            ProxyKind::Dispatcher => write_dispatcher(out, names, proxy),
        }
    }

    out.dedent();
    out.line("end architecture Behavioral;");
}

/// Routes the top-level handshake to the external slot of the selected
/// entry point.
fn write_dispatch(out: &mut Emitter, names: &Names<'_>, manifest: &TransformedManifest) {
    let external = |member: &str, port: &PortKind| {
        names.slot_signal(member, EXTERNAL_CALLER, 0, 0, port)
    };
    if names.verbose() {
        out.comment("Member-id dispatch");
    }
    out.line("dispatch: process (Clock)");
    out.line("begin");
    out.indent();
    out.line("if rising_edge(Clock) then");
    out.indent();
    out.line("if Reset = '1' then");
    out.indent();
    out.line("Finished <= '0';");
    for entry in &manifest.entry_points {
        out.line(format!(
            "{} <= false;",
            external(&entry.full_name, &PortKind::Started)
        ));
    }
    out.dedent();
    out.line("else");
    out.indent();
    out.line("case MemberId is");
    out.indent();
    for entry in &manifest.entry_points {
        let Some(component) = manifest.component(&entry.full_name) else {
            continue;
        };
        let member = entry.full_name.as_str();
        out.line(format!("when {} =>", entry.member_id));
        out.indent();
        if names.verbose() {
            out.comment(member);
        }
        out.line(format!(
            "{} <= Started = '1';",
            external(member, &PortKind::Started)
        ));
        for param in &component.parameters {
            let port = PortKind::Parameter(param.name.clone());
            out.line(format!(
                "{} <= {};",
                external(member, &port),
                names.entry_port(member, entry.member_id, &port)
            ));
        }
        out.line(format!("if {} then", external(member, &PortKind::Finished)));
        out.indent();
        out.line("Finished <= '1';");
        if component.return_type.is_some() {
            out.line(format!(
                "{} <= {};",
                names.entry_port(member, entry.member_id, &PortKind::Return),
                external(member, &PortKind::Return)
            ));
        }
        out.dedent();
        out.line("else");
        out.indent();
        out.line("Finished <= '0';");
        out.dedent();
        out.line("end if;");
        out.dedent();
    }
    out.line("when others =>");
    out.indent();
    out.line("Finished <= '0';");
    out.dedent();
    out.dedent();
    out.line("end case;");
    out.dedent();
    out.line("end if;");
    out.dedent();
    out.line("end if;");
    out.dedent();
    out.line("end process;");
}

fn forwarded_ports(proxy: &InvocationProxy) -> (Vec<PortKind>, Vec<PortKind>) {
    let mut inbound = vec![PortKind::Started];
    inbound.extend(
        proxy
            .parameters
            .iter()
            .map(|p| PortKind::Parameter(p.name.clone())),
    );
    let mut outbound = vec![PortKind::Finished];
    if proxy.return_type.is_some() {
        outbound.push(PortKind::Return);
    }
    (inbound, outbound)
}

fn write_direct_proxy(out: &mut Emitter, names: &Names<'_>, proxy: &InvocationProxy) {
    let Some(slot) = proxy.slots.first() else {
        return;
    };
    let slot_signal = |port: &PortKind| {
        names.slot_signal(
            &proxy.target,
            &slot.caller,
            slot.caller_instance,
            slot.slot,
            port,
        )
    };
    if names.verbose() {
        out.comment(&format!("{} direct connection", proxy.target));
    }
    let (inbound, outbound) = forwarded_ports(proxy);
    for port in &inbound {
        out.line(format!(
            "{} <= {};",
            names.instance_signal(&proxy.target, 0, port),
            slot_signal(port)
        ));
    }
    for port in &outbound {
        out.line(format!(
            "{} <= {};",
            slot_signal(port),
            names.instance_signal(&proxy.target, 0, port)
        ));
    }
}

/// Writes the arbiter that hands free instances to waiting slots.
///
/// A slot holds its instance from the cycle its `Started` is seen until the
/// caller has dropped `Started` and the instance has dropped `Finished`.
/// While draining, the slot's `Finished` mirrors the instance's, so a caller
/// reusing the slot cannot start again before the instance is idle.
fn write_dispatcher(out: &mut Emitter, names: &Names<'_>, proxy: &InvocationProxy) {
    let slots = proxy.slots.len();
    let instances = proxy.instance_count.max(1);
    let (inbound, outbound) = forwarded_ports(proxy);

    if names.verbose() {
        out.comment(&format!(
            "{} dispatcher: {} slots over {} instances",
            proxy.target, slots, instances
        ));
    }
    out.line(format!("{}: process (Clock)", names.proxy_label(&proxy.target)));
    out.indent();
    out.line(format!(
        "type assignment_t is array (0 to {}) of natural range 0 to {};",
        slots.saturating_sub(1),
        instances - 1
    ));
    out.line(format!(
        "type slot_flags_t is array (0 to {}) of boolean;",
        slots.saturating_sub(1)
    ));
    out.line(format!(
        "type instance_flags_t is array (0 to {}) of boolean;",
        instances - 1
    ));
    out.line("variable assigned : assignment_t := (others => 0);");
    out.line("variable active : slot_flags_t := (others => false);");
    out.line("variable busy : instance_flags_t := (others => false);");
    out.dedent();
    out.line("begin");
    out.indent();
    out.line("if rising_edge(Clock) then");
    out.indent();
    out.line("if Reset = '1' then");
    out.indent();
    out.line("active := (others => false);");
    out.line("busy := (others => false);");
    for instance in 0..instances {
        out.line(format!(
            "{} <= false;",
            names.instance_signal(&proxy.target, instance, &PortKind::Started)
        ));
    }
    for slot in &proxy.slots {
        out.line(format!(
            "{} <= false;",
            names.slot_signal(
                &proxy.target,
                &slot.caller,
                slot.caller_instance,
                slot.slot,
                &PortKind::Finished
            )
        ));
    }
    out.dedent();
    out.line("else");
    out.indent();

    for (index, slot) in proxy.slots.iter().enumerate() {
        let slot_signal = |port: &PortKind| {
            names.slot_signal(
                &proxy.target,
                &slot.caller,
                slot.caller_instance,
                slot.slot,
                port,
            )
        };
        let started = slot_signal(&PortKind::Started);
        if names.verbose() {
            out.comment(&format!(
                "slot {index}: {} instance {} slot {}",
                slot.caller, slot.caller_instance, slot.slot
            ));
        }
        out.line(format!("if not active({index}) then"));
        out.indent();
        out.line(format!("{} <= false;", slot_signal(&PortKind::Finished)));
        out.line(format!("if {started} then"));
        out.indent();
        for instance in 0..instances {
            let keyword = if instance == 0 { "if" } else { "elsif" };
            out.line(format!("{keyword} not busy({instance}) then"));
            out.indent();
            out.line(format!("busy({instance}) := true;"));
            out.line(format!("active({index}) := true;"));
            out.line(format!("assigned({index}) := {instance};"));
            for port in &inbound {
                out.line(format!(
                    "{} <= {};",
                    names.instance_signal(&proxy.target, instance, port),
                    slot_signal(port)
                ));
            }
            out.dedent();
        }
        out.line("end if;");
        out.dedent();
        out.line("end if;");
        out.dedent();
        out.line("else");
        out.indent();
        for instance in 0..instances {
            let keyword = if instance == 0 { "if" } else { "elsif" };
            let finished = names.instance_signal(&proxy.target, instance, &PortKind::Finished);
            let instance_started =
                names.instance_signal(&proxy.target, instance, &PortKind::Started);
            out.line(format!("{keyword} assigned({index}) = {instance} then"));
            out.indent();
            out.line(format!("if {started} then"));
            out.indent();
            for port in &outbound {
                out.line(format!(
                    "{} <= {};",
                    slot_signal(port),
                    names.instance_signal(&proxy.target, instance, port)
                ));
            }
            out.dedent();
            out.line("else");
            out.indent();
            // hold the caller in its idle wait until the instance drains
            out.line(format!("{} <= {finished};", slot_signal(&PortKind::Finished)));
            out.line(format!("{instance_started} <= false;"));
            out.line(format!("if not {finished} then"));
            out.indent();
            out.line(format!("busy({instance}) := false;"));
            out.line(format!("active({index}) := false;"));
            out.dedent();
            out.line("end if;");
            out.dedent();
            out.line("end if;");
            out.dedent();
        }
        out.line("end if;");
        out.dedent();
        out.line("end if;");
    }

    out.dedent();
    out.line("end if;");
    out.dedent();
    out.line("end if;");
    out.dedent();
    out.line("end process;");
}
