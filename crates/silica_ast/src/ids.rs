//! Node identifiers.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(
    /// Identifies one node (type, field, method, statement or expression) of
    /// a [`SyntaxTree`](crate::SyntaxTree).
    ///
    /// Ids are assigned in pre-order starting at 1; `0` means "not yet numbered".
    NodeId
);

impl NodeId {
    /// The id carried by nodes that have not been numbered yet.
    pub const UNASSIGNED: NodeId = NodeId(0);
}
