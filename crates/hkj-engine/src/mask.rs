use super::state::*;
use hkj_cards::Card;
use hkj_cards::Geisha;
use hkj_core::*;
use serde::Serialize;

/// A card as one viewer is allowed to see it. Placeholders keep the pile
/// lengths observable while hiding identity and geisha.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub id: Option<ID<Card>>,
    pub geisha_id: Option<GeishaId>,
}

impl CardView {
    fn open(card: &Card) -> Self {
        Self {
            id: Some(card.id),
            geisha_id: Some(card.geisha_id),
        }
    }
    fn hidden() -> Self {
        Self {
            id: None,
            geisha_id: None,
        }
    }
}

/// One seat as a viewer sees it: the viewer's own piles pass through,
/// an opponent's hand and discards collapse to placeholders and their
/// secrets disappear entirely (not even a count).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    pub player_id: PlayerId,
    pub name: String,
    pub hand: Vec<CardView>,
    pub played_cards: Vec<CardView>,
    pub secret_cards: Vec<CardView>,
    pub discarded_cards: Vec<CardView>,
    pub action_tokens: Vec<ActionToken>,
    pub score: Score,
}

/// An information-safe projection of the full game state for one viewer.
///
/// This type has no public constructor besides [`masked`]; the outbound
/// state frame only accepts a `MaskedState`, so a state broadcast cannot
/// skip sanitization.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskedState {
    phase: Phase,
    round: Round,
    turn: Option<PlayerId>,
    geishas: Vec<Geisha>,
    seats: Vec<SeatView>,
    draw_count: usize,
    pending_interaction: Option<Pending>,
    last_action: Option<LastAction>,
    winner: Option<PlayerId>,
}

/// One deal-animation step as a viewer sees it: cards dealt to the viewer
/// pass through, cards dealt to opponents become placeholders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealStepView {
    pub player_id: PlayerId,
    pub card: CardView,
}

/// Projects the full state into what `viewer` may know. Deterministic for
/// a given (state, viewer): the draw pile and the removed card are
/// stripped to a count, opponent piles keep only their lengths.
pub fn masked(state: &GameState, viewer: &PlayerId) -> MaskedState {
    MaskedState {
        phase: state.phase,
        round: state.round,
        turn: state.turn_player().cloned(),
        geishas: state.geishas.clone(),
        seats: state
            .seats
            .iter()
            .map(|seat| masked_seat(seat, seat.id == *viewer))
            .collect(),
        draw_count: state.draw_pile.len(),
        pending_interaction: state.pending.clone(),
        last_action: state.last_action.clone(),
        winner: state.winner.clone(),
    }
}

fn masked_seat(seat: &Seat, own: bool) -> SeatView {
    let project = |cards: &[Card]| -> Vec<CardView> {
        cards
            .iter()
            .map(|c| if own { CardView::open(c) } else { CardView::hidden() })
            .collect()
    };
    SeatView {
        player_id: seat.id.clone(),
        name: seat.name.clone(),
        hand: project(&seat.hand),
        played_cards: seat.played.iter().map(CardView::open).collect(),
        secret_cards: if own {
            seat.secrets.iter().map(CardView::open).collect()
        } else {
            Vec::new()
        },
        discarded_cards: project(&seat.discarded),
        action_tokens: seat.tokens.clone(),
        score: seat.score,
    }
}

/// Masks every step of the deal sequence for one viewer.
pub fn masked_deal(steps: &[DealStep], viewer: &PlayerId) -> Vec<DealStepView> {
    steps
        .iter()
        .map(|step| DealStepView {
            player_id: step.player_id.clone(),
            card: if step.player_id == *viewer {
                CardView::open(&step.card)
            } else {
                CardView::hidden()
            },
        })
        .collect()
}

/// Masks an executed action's card list for one viewer: hidden plays show
/// their cards only to the actor.
pub fn masked_action_cards(applied: &super::rules::Applied, state: &GameState, viewer: &PlayerId)
    -> Vec<ID<Card>>
{
    if !applied.hidden || state.seats[applied.actor].id == *viewer {
        applied.cards.iter().map(|c| c.id).collect()
    } else {
        Vec::new()
    }
}
