//! The transformed manifest and its member-id table.

use crate::component::ArchitectureComponent;
use crate::proxy::InvocationProxy;
use serde::{Deserialize, Serialize};

/// One member-id assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberIdEntry {
    /// The numeric id sent over the wire.
    pub id: u32,
    /// Full member name.
    pub full_name: String,
}

/// Stable numeric ids for entry points, assigned in sorted name order
/// starting at 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberIdTable {
    entries: Vec<MemberIdEntry>,
}

impl MemberIdTable {
    /// Assigns ids to the given names. Duplicates are collapsed.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        names.sort();
        names.dedup();
        let entries = names
            .into_iter()
            .enumerate()
            .map(|(i, full_name)| MemberIdEntry {
                id: i as u32,
                full_name,
            })
            .collect();
        Self { entries }
    }

    /// Returns the id of a member.
    pub fn id_of(&self, full_name: &str) -> Option<u32> {
        self.entries
            .binary_search_by(|e| e.full_name.as_str().cmp(full_name))
            .ok()
            .map(|i| self.entries[i].id)
    }

    /// Returns the member with the given id.
    pub fn name_of(&self, id: u32) -> Option<&str> {
        self.entries.get(id as usize).map(|e| e.full_name.as_str())
    }

    /// Iterates in id order.
    pub fn iter(&self) -> impl Iterator<Item = &MemberIdEntry> {
        self.entries.iter()
    }

    /// Number of ids.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no ids are assigned.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The source-level shape of a parameter or return value, for the runtime
/// interception layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterShape {
    /// Parameter name.
    pub name: String,
    /// Source type, e.g. `i32` or `u8[]`.
    pub ty: String,
}

/// Metadata for one hardware entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPointInfo {
    /// Assigned member id.
    pub member_id: u32,
    /// Full member name.
    pub full_name: String,
    /// Parameters in declaration order.
    pub parameters: Vec<ParameterShape>,
    /// Source return type.
    pub return_type: String,
    /// Declared async.
    pub is_async: bool,
    /// Implements an interface member explicitly.
    pub is_explicit_interface: bool,
}

/// Every component and proxy of one transformation, canonically ordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformedManifest {
    /// Components sorted by member full name.
    pub components: Vec<ArchitectureComponent>,
    /// Proxies sorted by target.
    pub proxies: Vec<InvocationProxy>,
    /// Entry point ids.
    pub member_ids: MemberIdTable,
    /// Entry point metadata sorted by member id.
    pub entry_points: Vec<EntryPointInfo>,
}

impl TransformedManifest {
    /// Returns the component of a member.
    pub fn component(&self, name: &str) -> Option<&ArchitectureComponent> {
        self.components
            .binary_search_by(|c| c.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.components[i])
    }

    /// Returns the proxy in front of a member.
    pub fn proxy(&self, target: &str) -> Option<&InvocationProxy> {
        self.proxies
            .binary_search_by(|p| p.target.as_str().cmp(target))
            .ok()
            .map(|i| &self.proxies[i])
    }

    /// Returns entry point metadata by name.
    pub fn entry_point(&self, full_name: &str) -> Option<&EntryPointInfo> {
        self.entry_points.iter().find(|e| e.full_name == full_name)
    }
}
