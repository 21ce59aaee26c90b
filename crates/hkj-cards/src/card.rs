use hkj_core::GeishaId;
use hkj_core::ID;
use serde::Deserialize;
use serde::Serialize;

/// A single favor card. Exactly `charm` copies exist per geisha, so a fresh
/// deck holds 21 cards. Ids are opaque and unique within a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: ID<Card>,
    pub geisha_id: GeishaId,
}

impl Card {
    pub fn new(geisha_id: GeishaId) -> Self {
        Self {
            id: ID::default(),
            geisha_id,
        }
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "g{}#{}", self.geisha_id, self.id)
    }
}
