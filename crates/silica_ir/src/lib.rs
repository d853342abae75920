//! Hardware model produced by the silica transformer.
//!
//! An [`ArchitectureComponent`] is one member's state machine: ordered
//! [`State`]s with guarded [`Transition`]s, variable [`Declaration`]s and a
//! sequential body per state. Cross-member calls go through
//! [`InvocationProxy`]s. The [`TransformedManifest`] holds every component
//! and proxy in canonical order together with the [`MemberIdTable`], and a
//! [`HardwareDescription`] pairs the manifest with its VHDL rendering.

#![warn(missing_docs)]

pub mod component;
pub mod description;
pub mod hw;
pub mod ids;
pub mod manifest;
pub mod proxy;
pub mod vhdl;

pub use component::{
    ArchitectureComponent, ComponentPort, Declaration, OutgoingInvocation, State, Transition,
};
pub use description::HardwareDescription;
pub use hw::{HwBinaryOp, HwExpr, HwStmt, HwTarget, HwType, HwUnaryOp, PortKind, SignalRef};
pub use ids::StateId;
pub use manifest::{EntryPointInfo, MemberIdEntry, MemberIdTable, ParameterShape, TransformedManifest};
pub use proxy::{InvocationProxy, InvocationSlot, ProxyKind, EXTERNAL_CALLER};
pub use vhdl::write_vhdl;
