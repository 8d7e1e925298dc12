use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl $name {
            pub fn get(self) -> $inner {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }
    };
}

id_type!(
    /// Platform conversation (direct or group) that isolates a store partition.
    TenantId(i64)
);
id_type!(
    /// Platform user on whose behalf records are kept.
    OwnerId(i64)
);
id_type!(ContactId(u64));
id_type!(TransactionId(u64));
id_type!(ReminderId(u64));

/// Identifies entities that expose a stable identifier within their partition.
pub trait Identifiable {
    type Id: Copy + Eq;

    fn id(&self) -> Self::Id;
}

/// Records that belong to a single owner inside a tenant partition.
pub trait Owned {
    fn owner(&self) -> OwnerId;

    fn is_owned_by(&self, owner: OwnerId) -> bool {
        self.owner() == owner
    }
}
