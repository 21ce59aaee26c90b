use super::order::OrderState;
use hkj_cards::GeishaSet;
use hkj_core::*;
use hkj_engine::DealStep;
use hkj_engine::GameState;
use hkj_players::Difficulty;
use serde::Deserialize;
use serde::Serialize;

/// One seat's identity in a snapshot. Connections are never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatMeta {
    pub player_id: PlayerId,
    pub name: String,
    pub machine: bool,
}

/// A room's persistable projection: everything needed to rehydrate on a
/// registry miss except the live connections. The machine seat is
/// reconstituted from its difficulty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub code: RoomCode,
    pub host: PlayerId,
    pub seats: Vec<SeatMeta>,
    pub difficulty: Option<Difficulty>,
    pub geisha_set: GeishaSet,
    pub last_starter: Option<Position>,
    pub order: OrderState,
    pub rematch: Vec<PlayerId>,
    pub deal_sequence: Vec<DealStep>,
    pub game: GameState,
}

impl RoomSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hkj_engine::prepare_round;
    use hkj_engine::Seat;

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut game = GameState::new(
            GeishaSet::Default,
            vec![
                Seat::new("host".into(), "Host".into()),
                Seat::new("npc".into(), "Machine".into()),
            ],
        );
        let deal_sequence = prepare_round(&mut game, 0, 1);
        let snapshot = RoomSnapshot {
            code: "AB12CD".into(),
            host: "host".into(),
            seats: vec![
                SeatMeta {
                    player_id: "host".into(),
                    name: "Host".into(),
                    machine: false,
                },
                SeatMeta {
                    player_id: "npc".into(),
                    name: "Machine".into(),
                    machine: true,
                },
            ],
            difficulty: Some(Difficulty::Hell),
            geisha_set: GeishaSet::Default,
            last_starter: Some(0),
            order: OrderState::default(),
            rematch: Vec::new(),
            deal_sequence,
            game,
        };
        let json = snapshot.to_json().unwrap();
        let back = RoomSnapshot::from_json(&json).unwrap();
        assert_eq!(back.code, snapshot.code);
        assert_eq!(back.difficulty, Some(Difficulty::Hell));
        assert_eq!(back.game.round, 1);
        assert_eq!(back.game.draw_pile.len(), snapshot.game.draw_pile.len());
        assert_eq!(back.deal_sequence.len(), 12);
    }
}
