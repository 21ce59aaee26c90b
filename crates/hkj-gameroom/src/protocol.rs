use hkj_cards::Card;
use hkj_cards::GeishaSet;
use hkj_core::*;
use hkj_engine::*;
use hkj_players::Difficulty;
use serde::Deserialize;
use serde::Serialize;

/// Whether the second seat is a remote human or the scripted opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomMode {
    Online,
    Npc,
}

/// Messages sent from client to server over the duplex channel, framed as
/// `{ "type": ..., "payload": ... }` UTF-8 JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    CreateRoom {
        player_id: PlayerId,
        #[serde(default)]
        player_name: Option<String>,
        mode: RoomMode,
        #[serde(default)]
        ai_difficulty: Option<Difficulty>,
        #[serde(default)]
        geisha_set: Option<GeishaSet>,
    },
    JoinRoom {
        room_id: RoomCode,
        player_id: PlayerId,
        #[serde(default)]
        player_name: Option<String>,
    },
    ConfirmOrder {},
    ReadyConfirm {},
    GameAction {
        player_id: PlayerId,
        action: WireAction,
    },
    RematchRequest {},
    LeaveRoom {},
}

/// The six in-game operations, nested inside GAME_ACTION with their own
/// `{ type, payload }` envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum WireAction {
    PlaySecret { card_id: ID<Card> },
    PlayTradeOff { card_ids: Vec<ID<Card>> },
    InitiateGift { card_ids: Vec<ID<Card>> },
    ResolveGift { chosen_card_id: ID<Card> },
    InitiateCompetition { groups: Vec<Vec<ID<Card>>> },
    ResolveCompetition { chosen_group_index: usize },
}

impl From<WireAction> for Play {
    fn from(action: WireAction) -> Self {
        match action {
            WireAction::PlaySecret { card_id } => Play::Secret { card: card_id },
            WireAction::PlayTradeOff { card_ids } => Play::TradeOff { cards: card_ids },
            WireAction::InitiateGift { card_ids } => Play::GiftOffer { cards: card_ids },
            WireAction::ResolveGift { chosen_card_id } => Play::GiftPick {
                card: chosen_card_id,
            },
            WireAction::InitiateCompetition { groups } => Play::CompetitionOffer { groups },
            WireAction::ResolveCompetition { chosen_group_index } => Play::CompetitionPick {
                group: chosen_group_index,
            },
        }
    }
}

/// A resolved two-phase interaction, for the INTERACTION_RESOLVED frame.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedInteraction {
    pub kind: TokenKind,
    pub initiator_id: PlayerId,
    pub target_id: PlayerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chosen_card_id: Option<ID<Card>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chosen_group_index: Option<usize>,
    pub initiator_cards: Vec<Card>,
    pub target_cards: Vec<Card>,
}

/// Messages sent from server to client. State-bearing frames only accept
/// masked projections, so a broadcast cannot skip sanitization.
#[derive(Debug, Clone, Serialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    RoomCreated {
        room_id: RoomCode,
        player_id: PlayerId,
        mode: RoomMode,
    },
    PlayerJoined {
        player_id: PlayerId,
        player_name: String,
    },
    PlayerLeft {
        player_id: PlayerId,
    },
    GameStateUpdated {
        state: MaskedState,
    },
    GameStarted {
        round: Round,
        first_player_id: PlayerId,
    },
    OrderDecisionStart {},
    OrderDecisionResult {
        order: Vec<PlayerId>,
        first_player_id: PlayerId,
    },
    OrderConfirmationUpdate {
        confirmed: Vec<PlayerId>,
    },
    ReadyCheck {},
    ReadyStatus {
        ready: Vec<PlayerId>,
    },
    DealAnimation {
        round: Round,
        steps: Vec<DealStepView>,
    },
    CardDrawn {
        player_id: PlayerId,
        card: CardView,
        draw_count: usize,
    },
    ActionExecuted {
        player_id: PlayerId,
        action_type: TokenKind,
        card_ids: Vec<ID<Card>>,
        card_count: usize,
    },
    PendingInteraction {
        interaction: Pending,
    },
    InteractionResolved {
        interaction: ResolvedInteraction,
    },
    RoundComplete {
        round: Round,
        resolution: Resolution,
    },
    GameEnded {
        winner_id: PlayerId,
        scores: Vec<Score>,
    },
    RematchRequested {
        player_id: PlayerId,
        agreed: Vec<PlayerId>,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl std::fmt::Display) -> Self {
        Self::Error {
            message: message.to_string(),
        }
    }
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("serialize server message")
    }
}

/// Errors decoding an inbound frame.
#[derive(Debug, Clone)]
pub enum ProtocolError {
    Malformed(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(s) => write!(f, "malformed frame: {}", s),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// The wire codec between raw text frames and typed messages.
pub struct Protocol;

impl Protocol {
    pub fn decode(text: &str) -> Result<ClientMessage, ProtocolError> {
        serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_create_room() {
        let frame = r#"{"type":"CREATE_ROOM","payload":{"playerId":"p1","mode":"npc","aiDifficulty":"hard"}}"#;
        match Protocol::decode(frame).unwrap() {
            ClientMessage::CreateRoom {
                player_id,
                mode,
                ai_difficulty,
                geisha_set,
                ..
            } => {
                assert_eq!(player_id, "p1");
                assert_eq!(mode, RoomMode::Npc);
                assert_eq!(ai_difficulty, Some(Difficulty::Hard));
                assert_eq!(geisha_set, None);
            }
            other => panic!("unexpected message {:?}", other),
        }
    }
    #[test]
    fn decodes_nested_game_action() {
        let id = uuid::Uuid::now_v7();
        let frame = format!(
            r#"{{"type":"GAME_ACTION","payload":{{"playerId":"p1","action":{{"type":"PLAY_SECRET","payload":{{"cardId":"{}"}}}}}}}}"#,
            id
        );
        match Protocol::decode(&frame).unwrap() {
            ClientMessage::GameAction { player_id, action } => {
                assert_eq!(player_id, "p1");
                match Play::from(action) {
                    Play::Secret { card } => assert_eq!(card.inner(), id),
                    other => panic!("unexpected play {:?}", other),
                }
            }
            other => panic!("unexpected message {:?}", other),
        }
    }
    #[test]
    fn decodes_resolve_competition() {
        let frame = r#"{"type":"GAME_ACTION","payload":{"playerId":"p2","action":{"type":"RESOLVE_COMPETITION","payload":{"chosenGroupIndex":1}}}}"#;
        match Protocol::decode(frame).unwrap() {
            ClientMessage::GameAction { action, .. } => {
                assert!(matches!(
                    Play::from(action),
                    Play::CompetitionPick { group: 1 }
                ));
            }
            other => panic!("unexpected message {:?}", other),
        }
    }
    #[test]
    fn rejects_unknown_type() {
        assert!(Protocol::decode(r#"{"type":"SELF_DESTRUCT","payload":{}}"#).is_err());
        assert!(Protocol::decode("not json").is_err());
    }
    #[test]
    fn encodes_with_screaming_type_tags() {
        let json = ServerMessage::ReadyCheck {}.to_json();
        assert!(json.contains(r#""type":"READY_CHECK""#));
        let json = ServerMessage::error("nope").to_json();
        assert!(json.contains(r#""type":"ERROR""#));
        assert!(json.contains(r#""message":"nope""#));
    }
}
