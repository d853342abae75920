//! Invocation proxies: the wiring between callers and a member's
//! instance pool.

use crate::component::ComponentPort;
use crate::hw::HwType;
use serde::{Deserialize, Serialize};

/// Caller name used for invocations arriving through the top-level
/// member-id dispatch.
pub const EXTERNAL_CALLER: &str = "External";

/// How a proxy connects callers to instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProxyKind {
    /// One caller slot wired straight to one instance.
    Direct,
    /// An arbiter assigning caller slots to free instances.
    Dispatcher,
}

/// One caller-side invocation slot feeding a proxy.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InvocationSlot {
    /// Full name of the calling member, or [`EXTERNAL_CALLER`].
    pub caller: String,
    /// Instance of the calling component.
    pub caller_instance: u32,
    /// Slot index among that caller instance's slots for the target.
    pub slot: u32,
}

/// The build-time arbiter in front of a member's instance pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationProxy {
    /// Full name of the called member.
    pub target: String,
    /// Connection style.
    pub kind: ProxyKind,
    /// Size of the instance pool.
    pub instance_count: u32,
    /// Every caller slot, sorted.
    pub slots: Vec<InvocationSlot>,
    /// Parameters forwarded to the instances.
    pub parameters: Vec<ComponentPort>,
    /// Return value forwarded back, if any.
    pub return_type: Option<HwType>,
}

impl InvocationProxy {
    /// Builds a proxy, sorting the slots and picking the connection style.
    pub fn new(
        target: impl Into<String>,
        instance_count: u32,
        mut slots: Vec<InvocationSlot>,
        parameters: Vec<ComponentPort>,
        return_type: Option<HwType>,
    ) -> Self {
        slots.sort();
        slots.dedup();
        let kind = if slots.len() == 1 && instance_count == 1 {
            ProxyKind::Direct
        } else {
            ProxyKind::Dispatcher
        };
        Self {
            target: target.into(),
            kind,
            instance_count,
            slots,
            parameters,
            return_type,
        }
    }

    /// Returns true if the external dispatch can start this member.
    pub fn is_externally_invoked(&self) -> bool {
        self.slots.iter().any(|s| s.caller == EXTERNAL_CALLER)
    }
}
