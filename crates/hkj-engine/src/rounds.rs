use super::state::*;
use hkj_cards::*;
use hkj_core::*;
use serde::Serialize;

/// Per-geisha outcome of a round resolution.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeishaTally {
    pub geisha_id: GeishaId,
    pub charm: Charm,
    /// Played-card counts in seat order.
    pub counts: Vec<usize>,
    pub controlled_by: Option<PlayerId>,
}

/// Everything a round resolution decided, for the ROUND_COMPLETE broadcast.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    /// Former secret cards, now face-up, in seat order.
    pub revealed: Vec<Vec<Card>>,
    pub tallies: Vec<GeishaTally>,
    pub scores: Vec<Score>,
    pub winner: Option<PlayerId>,
}

/// Rebuilds the state for a round: fresh deck, reset piles and tokens,
/// six cards dealt alternately starting at `starter`. Geisha control and
/// seat scores carry over untouched.
///
/// Returns the ordered deal steps for the client animation.
pub fn prepare_round(state: &mut GameState, starter: Position, round: Round) -> Vec<DealStep> {
    for seat in state.seats.iter_mut() {
        seat.reset_for_round();
    }
    let mut deck = Deck::build(&state.geishas);
    let mut steps = Vec::with_capacity(N * HAND_SIZE);
    for i in 0..N * HAND_SIZE {
        let pos = if i % 2 == 0 {
            starter
        } else {
            state.opponent(starter)
        };
        let card = deck.draw_pile.pop().expect("deck covers the opening deal");
        steps.push(DealStep {
            player_id: state.seats[pos].id.clone(),
            card: card.clone(),
        });
        state.seats[pos].hand.push(card);
    }
    state.draw_pile = deck.draw_pile;
    state.removed = Some(deck.removed);
    state.discard_pile = Vec::new();
    state.round = round;
    state.phase = Phase::Playing;
    state.turn = Some(starter);
    state.pending = None;
    state.last_action = None;
    state.winner = None;
    if let Err(violation) = validate_round_setup(state) {
        log::error!("[round {}] setup invariant violated: {}", round, violation);
    }
    steps
}

/// Post-deal sanity check. A violation is a server bug, not a player
/// error: the caller logs it and the round continues.
pub fn validate_round_setup(state: &GameState) -> Result<(), String> {
    let cards = state.all_cards().collect::<Vec<_>>();
    if cards.len() != DECK_SIZE {
        return Err(format!("expected {} cards, found {}", DECK_SIZE, cards.len()));
    }
    let ids = cards.iter().map(|c| c.id).collect::<std::collections::HashSet<_>>();
    if ids.len() != DECK_SIZE {
        return Err(format!("duplicate card ids: {} unique of {}", ids.len(), DECK_SIZE));
    }
    for seat in &state.seats {
        if seat.hand.len() != HAND_SIZE {
            return Err(format!("seat {} holds {} cards", seat.id, seat.hand.len()));
        }
    }
    if state.draw_pile.len() != DRAW_PILE_SIZE {
        return Err(format!("draw pile holds {}", state.draw_pile.len()));
    }
    if state.removed.is_none() {
        return Err("no removed card".to_string());
    }
    Ok(())
}

/// Opens the current seat's turn: clears the previous action record and
/// draws one card if the seat still has tokens to spend and the pile has
/// cards left. Returns the drawn card for the CARD_DRAWN broadcast.
pub fn begin_turn(state: &mut GameState) -> Option<Card> {
    state.last_action = None;
    state.phase = Phase::Playing;
    let pos = state.turn?;
    if !state.seats[pos].has_unused_token() {
        return None;
    }
    let card = state.draw_pile.pop()?;
    state.seats[pos].hand.push(card.clone());
    Some(card)
}

/// Moves the turn to the next seat in seating order that still has an
/// unused token. Returns `None` when both seats are exhausted and the
/// round must resolve.
pub fn advance_turn(state: &mut GameState) -> Option<Position> {
    let current = state.turn?;
    let next = state.opponent(current);
    if state.seats[next].has_unused_token() {
        state.turn = Some(next);
        Some(next)
    } else if state.seats[current].has_unused_token() {
        Some(current)
    } else {
        None
    }
}

/// Resolves the round: reveals secrets into the played piles, moves geisha
/// control by strict majority, recomputes both scores, and decides victory.
pub fn resolve_round(state: &mut GameState) -> Resolution {
    state.phase = Phase::Resolution;
    state.pending = None;
    let revealed = state
        .seats
        .iter_mut()
        .map(|seat| {
            let secrets = std::mem::take(&mut seat.secrets);
            seat.played.extend(secrets.iter().cloned());
            secrets
        })
        .collect::<Vec<_>>();
    let tallies = state
        .geishas
        .iter_mut()
        .map(|geisha| {
            let counts = state
                .seats
                .iter()
                .map(|seat| {
                    seat.played
                        .iter()
                        .filter(|c| c.geisha_id == geisha.id)
                        .count()
                })
                .collect::<Vec<_>>();
            // Strict majority moves favor; a tie leaves it where it was.
            let leader = match counts[0].cmp(&counts[1]) {
                std::cmp::Ordering::Greater => Some(0),
                std::cmp::Ordering::Less => Some(1),
                std::cmp::Ordering::Equal => None,
            };
            if let Some(pos) = leader {
                geisha.controlled_by = Some(state.seats[pos].id.clone());
            }
            GeishaTally {
                geisha_id: geisha.id,
                charm: geisha.charm,
                counts,
                controlled_by: geisha.controlled_by.clone(),
            }
        })
        .collect::<Vec<_>>();
    let scores = state
        .seats
        .iter()
        .map(|seat| {
            let mine = state
                .geishas
                .iter()
                .filter(|g| g.controlled_by.as_ref() == Some(&seat.id));
            Score {
                tokens: mine.clone().count() as u8,
                charm: mine.map(|g| g.charm).sum(),
            }
        })
        .collect::<Vec<_>>();
    for (seat, score) in state.seats.iter_mut().zip(scores.iter()) {
        seat.score = *score;
    }
    let winner = decide_winner(state);
    if winner.is_some() {
        state.phase = Phase::Ended;
        state.winner = winner.clone();
    }
    Resolution {
        revealed,
        tallies,
        scores,
        winner,
    }
}

/// Victory check: charm ≥ 11 or controlled geisha ≥ 4. When both seats
/// cross a threshold in the same resolution the higher charm wins, then
/// the higher token count; a full tie continues the game with no winner.
fn decide_winner(state: &GameState) -> Option<PlayerId> {
    let a = &state.seats[0];
    let b = &state.seats[1];
    let hits =
        |s: &Seat| s.score.charm >= CHARM_TO_WIN || s.score.tokens >= TOKENS_TO_WIN;
    match (hits(a), hits(b)) {
        (true, false) => Some(a.id.clone()),
        (false, true) => Some(b.id.clone()),
        (true, true) => match a.score.charm.cmp(&b.score.charm) {
            std::cmp::Ordering::Greater => Some(a.id.clone()),
            std::cmp::Ordering::Less => Some(b.id.clone()),
            std::cmp::Ordering::Equal => match a.score.tokens.cmp(&b.score.tokens) {
                std::cmp::Ordering::Greater => Some(a.id.clone()),
                std::cmp::Ordering::Less => Some(b.id.clone()),
                std::cmp::Ordering::Equal => None,
            },
        },
        (false, false) => None,
    }
}
