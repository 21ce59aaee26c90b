use super::state::TokenKind;
use hkj_cards::Card;
use hkj_core::ID;

/// A player-submitted operation against the rule engine.
///
/// The first four spend the matching action token and are only legal on the
/// actor's turn; the two picks resolve an open interaction and are only
/// legal for its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Play {
    Secret { card: ID<Card> },
    TradeOff { cards: Vec<ID<Card>> },
    GiftOffer { cards: Vec<ID<Card>> },
    GiftPick { card: ID<Card> },
    CompetitionOffer { groups: Vec<Vec<ID<Card>>> },
    CompetitionPick { group: usize },
}

impl Play {
    /// The token this play spends, if it is a turn-opening play.
    pub fn token(&self) -> Option<TokenKind> {
        match self {
            Self::Secret { .. } => Some(TokenKind::Secret),
            Self::TradeOff { .. } => Some(TokenKind::TradeOff),
            Self::GiftOffer { .. } => Some(TokenKind::Gift),
            Self::CompetitionOffer { .. } => Some(TokenKind::Competition),
            Self::GiftPick { .. } | Self::CompetitionPick { .. } => None,
        }
    }
    pub fn is_resolve(&self) -> bool {
        matches!(self, Self::GiftPick { .. } | Self::CompetitionPick { .. })
    }
}

impl std::fmt::Display for Play {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Secret { .. } => write!(f, "secret"),
            Self::TradeOff { .. } => write!(f, "trade-off"),
            Self::GiftOffer { .. } => write!(f, "gift offer"),
            Self::GiftPick { .. } => write!(f, "gift pick"),
            Self::CompetitionOffer { .. } => write!(f, "competition offer"),
            Self::CompetitionPick { group } => write!(f, "competition pick {}", group),
        }
    }
}
