use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{ContactId, Identifiable, Owned, OwnerId};

/// Person the owner lends to or borrows from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub id: ContactId,
    pub owner_id: OwnerId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_handle: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Contact {
    pub fn new(
        id: ContactId,
        owner_id: OwnerId,
        name: impl Into<String>,
        phone: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            name: name.into(),
            phone,
            external_handle: None,
            created_at,
        }
    }
}

impl Identifiable for Contact {
    type Id = ContactId;

    fn id(&self) -> ContactId {
        self.id
    }
}

impl Owned for Contact {
    fn owner(&self) -> OwnerId {
        self.owner_id
    }
}
