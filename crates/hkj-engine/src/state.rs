use hkj_cards::*;
use hkj_core::*;
use serde::Deserialize;
use serde::Serialize;

/// Game phase. Transitions are driven only by the round driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Waiting,
    DecidingOrder,
    Playing,
    Resolution,
    Ended,
}

/// The four per-round action kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenKind {
    Secret,
    TradeOff,
    Gift,
    Competition,
}

impl TokenKind {
    pub const ALL: [TokenKind; TOKEN_COUNT] = [
        TokenKind::Secret,
        TokenKind::TradeOff,
        TokenKind::Gift,
        TokenKind::Competition,
    ];
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Secret => write!(f, "secret"),
            Self::TradeOff => write!(f, "trade-off"),
            Self::Gift => write!(f, "gift"),
            Self::Competition => write!(f, "competition"),
        }
    }
}

/// A one-shot permission to perform one action kind this round.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionToken {
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub used: bool,
}

/// Score snapshot recomputed at every round resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub charm: Charm,
    pub tokens: u8,
}

/// A player slot. Survives connection drops; piles and tokens reset at the
/// start of every round, identity and score carry over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub id: PlayerId,
    pub name: String,
    pub hand: Vec<Card>,
    pub played: Vec<Card>,
    pub secrets: Vec<Card>,
    pub discarded: Vec<Card>,
    pub tokens: Vec<ActionToken>,
    pub score: Score,
}

impl Seat {
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            hand: Vec::new(),
            played: Vec::new(),
            secrets: Vec::new(),
            discarded: Vec::new(),
            tokens: Self::fresh_tokens(),
            score: Score::default(),
        }
    }
    fn fresh_tokens() -> Vec<ActionToken> {
        TokenKind::ALL
            .iter()
            .map(|kind| ActionToken {
                kind: *kind,
                used: false,
            })
            .collect()
    }
    /// Clears all piles and resets the four tokens for a new round.
    pub fn reset_for_round(&mut self) {
        self.hand.clear();
        self.played.clear();
        self.secrets.clear();
        self.discarded.clear();
        self.tokens = Self::fresh_tokens();
    }
    pub fn token_unused(&self, kind: TokenKind) -> bool {
        self.tokens.iter().any(|t| t.kind == kind && !t.used)
    }
    pub fn spend_token(&mut self, kind: TokenKind) {
        if let Some(token) = self.tokens.iter_mut().find(|t| t.kind == kind) {
            token.used = true;
        }
    }
    pub fn has_unused_token(&self) -> bool {
        self.tokens.iter().any(|t| !t.used)
    }
    /// Removes a card from the hand by id, if owned.
    pub fn take_from_hand(&mut self, id: &ID<Card>) -> Option<Card> {
        self.hand
            .iter()
            .position(|c| c.id == *id)
            .map(|i| self.hand.remove(i))
    }
    pub fn owns(&self, id: &ID<Card>) -> bool {
        self.hand.iter().any(|c| c.id == *id)
    }
}

/// An open two-phase interaction. At most one exists per room; while set,
/// only the target seat may submit the matching resolve.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Pending {
    Gift {
        initiator: PlayerId,
        target: PlayerId,
        offered: Vec<Card>,
    },
    Competition {
        initiator: PlayerId,
        target: PlayerId,
        groups: Vec<Vec<Card>>,
    },
}

impl Pending {
    pub fn target(&self) -> &PlayerId {
        match self {
            Self::Gift { target, .. } => target,
            Self::Competition { target, .. } => target,
        }
    }
    pub fn initiator(&self) -> &PlayerId {
        match self {
            Self::Gift { initiator, .. } => initiator,
            Self::Competition { initiator, .. } => initiator,
        }
    }
}

/// Record of the most recent executed action, cleared at turn start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastAction {
    pub player_id: PlayerId,
    pub kind: TokenKind,
}

/// One card leaving the deck for one seat during the opening deal.
/// The ordered list of steps drives the client-side deal animation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealStep {
    pub player_id: PlayerId,
    pub card: Card,
}

/// Canonical game state for one room. Mutated only inside the room's
/// serialized execution context; clients only ever see masked projections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub geishas: Vec<Geisha>,
    pub seats: Vec<Seat>,
    pub draw_pile: Vec<Card>,
    pub discard_pile: Vec<Card>,
    pub removed: Option<Card>,
    pub phase: Phase,
    pub round: Round,
    pub turn: Option<Position>,
    pub pending: Option<Pending>,
    pub last_action: Option<LastAction>,
    pub winner: Option<PlayerId>,
}

impl GameState {
    /// A pre-deal state: catalog built, seats empty-handed, nothing dealt.
    pub fn new(set: GeishaSet, seats: Vec<Seat>) -> Self {
        Self {
            geishas: base_geishas(set),
            seats,
            draw_pile: Vec::new(),
            discard_pile: Vec::new(),
            removed: None,
            phase: Phase::Waiting,
            round: 0,
            turn: None,
            pending: None,
            last_action: None,
            winner: None,
        }
    }
    /// Seat index for a player id.
    pub fn position(&self, player: &PlayerId) -> Option<Position> {
        self.seats.iter().position(|s| s.id == *player)
    }
    pub fn opponent(&self, pos: Position) -> Position {
        (pos + 1) % self.seats.len()
    }
    pub fn seat(&self, pos: Position) -> &Seat {
        &self.seats[pos]
    }
    /// Id of the seat whose turn it is, if any.
    pub fn turn_player(&self) -> Option<&PlayerId> {
        self.turn.map(|pos| &self.seats[pos].id)
    }
    /// Every card currently tracked by the state, across all piles.
    pub fn all_cards(&self) -> impl Iterator<Item = &Card> {
        self.draw_pile
            .iter()
            .chain(self.discard_pile.iter())
            .chain(self.removed.iter())
            .chain(self.seats.iter().flat_map(|s| {
                s.hand
                    .iter()
                    .chain(s.played.iter())
                    .chain(s.secrets.iter())
                    .chain(s.discarded.iter())
            }))
            .chain(self.pending.iter().flat_map(|p| match p {
                Pending::Gift { offered, .. } => offered.iter().collect::<Vec<_>>(),
                Pending::Competition { groups, .. } => groups.iter().flatten().collect(),
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    fn seats() -> Vec<Seat> {
        vec![
            Seat::new("alice".into(), "Alice".into()),
            Seat::new("bob".into(), "Bob".into()),
        ]
    }
    #[test]
    fn fresh_seat_has_four_unused_tokens() {
        let seat = Seat::new("p".into(), "P".into());
        assert_eq!(seat.tokens.len(), TOKEN_COUNT);
        assert!(seat.has_unused_token());
        for kind in TokenKind::ALL {
            assert!(seat.token_unused(kind));
        }
    }
    #[test]
    fn spending_a_token_is_sticky() {
        let mut seat = Seat::new("p".into(), "P".into());
        seat.spend_token(TokenKind::Gift);
        assert!(!seat.token_unused(TokenKind::Gift));
        assert!(seat.token_unused(TokenKind::Secret));
        seat.reset_for_round();
        assert!(seat.token_unused(TokenKind::Gift));
    }
    #[test]
    fn positions_resolve_by_player_id() {
        let state = GameState::new(GeishaSet::Default, seats());
        assert_eq!(state.position(&"alice".to_string()), Some(0));
        assert_eq!(state.position(&"bob".to_string()), Some(1));
        assert_eq!(state.position(&"mallory".to_string()), None);
        assert_eq!(state.opponent(0), 1);
        assert_eq!(state.opponent(1), 0);
    }
    #[test]
    fn token_kind_wire_names() {
        let json = serde_json::to_string(&TokenKind::TradeOff).unwrap();
        assert_eq!(json, "\"trade-off\"");
    }
}
