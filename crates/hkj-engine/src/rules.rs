use super::actions::Play;
use super::errors::RuleError;
use super::state::*;
use hkj_cards::Card;
use hkj_core::*;

/// What a successful play did to the state, from the driver's perspective.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// A turn-consuming action completed; the turn should advance.
    Advanced,
    /// A two-phase interaction opened; the turn stays with the initiator
    /// until the target resolves.
    Opened,
    /// The target resolved a gift; the turn should advance.
    ResolvedGift {
        initiator: Position,
        target: Position,
        chosen: Card,
        to_initiator: Vec<Card>,
    },
    /// The target resolved a competition; the turn should advance.
    ResolvedCompetition {
        initiator: Position,
        target: Position,
        chosen: usize,
        to_target: Vec<Card>,
        to_initiator: Vec<Card>,
    },
}

/// Report of an applied play, enough for the room to broadcast without
/// re-deriving anything from the state.
#[derive(Debug, Clone)]
pub struct Applied {
    pub actor: Position,
    pub kind: TokenKind,
    /// Cards the actor committed. Masked for opponents when `hidden`.
    pub cards: Vec<Card>,
    pub hidden: bool,
    pub outcome: Outcome,
}

/// Validates and applies one play. Failures leave the state untouched and
/// are reported only to the offending player.
pub fn apply(state: &mut GameState, player: &PlayerId, play: &Play) -> Result<Applied, RuleError> {
    let actor = state.position(player).ok_or(RuleError::UnknownPlayer)?;
    match play {
        Play::Secret { card } => open_turn(state, actor, TokenKind::Secret)
            .and_then(|()| play_secret(state, actor, card)),
        Play::TradeOff { cards } => open_turn(state, actor, TokenKind::TradeOff)
            .and_then(|()| play_trade_off(state, actor, cards)),
        Play::GiftOffer { cards } => open_turn(state, actor, TokenKind::Gift)
            .and_then(|()| initiate_gift(state, actor, cards)),
        Play::CompetitionOffer { groups } => open_turn(state, actor, TokenKind::Competition)
            .and_then(|()| initiate_competition(state, actor, groups)),
        Play::GiftPick { card } => resolve_gift(state, actor, card),
        Play::CompetitionPick { group } => resolve_competition(state, actor, *group),
    }
    .inspect(|applied| {
        state.last_action = Some(LastAction {
            player_id: player.clone(),
            kind: applied.kind,
        });
    })
}

/// Shared preconditions for the four turn-opening actions.
fn open_turn(state: &GameState, actor: Position, kind: TokenKind) -> Result<(), RuleError> {
    if state.phase != Phase::Playing {
        return Err(RuleError::WrongPhase);
    }
    if state.pending.is_some() {
        return Err(RuleError::InteractionInProgress);
    }
    if state.turn != Some(actor) {
        return Err(RuleError::NotYourTurn);
    }
    if !state.seats[actor].token_unused(kind) {
        return Err(RuleError::TokenSpent(kind));
    }
    Ok(())
}

fn distinct(ids: &[ID<Card>]) -> bool {
    ids.iter()
        .all(|id| ids.iter().filter(|other| *other == id).count() == 1)
}

fn play_secret(state: &mut GameState, actor: Position, id: &ID<Card>) -> Result<Applied, RuleError> {
    let seat = &mut state.seats[actor];
    let card = seat.take_from_hand(id).ok_or(RuleError::CardNotOwned)?;
    let report = vec![card.clone()];
    seat.secrets.push(card);
    seat.spend_token(TokenKind::Secret);
    Ok(Applied {
        actor,
        kind: TokenKind::Secret,
        cards: report,
        hidden: true,
        outcome: Outcome::Advanced,
    })
}

fn play_trade_off(
    state: &mut GameState,
    actor: Position,
    ids: &[ID<Card>],
) -> Result<Applied, RuleError> {
    if ids.len() != 2 {
        return Err(RuleError::WrongCardCount {
            expected: 2,
            got: ids.len(),
        });
    }
    if !distinct(ids) {
        return Err(RuleError::DuplicateCards);
    }
    let seat = &mut state.seats[actor];
    // Remove one by one; a failed lookup rolls the taken cards back.
    let mut taken = Vec::with_capacity(2);
    for id in ids {
        match seat.take_from_hand(id) {
            Some(card) => taken.push(card),
            None => {
                seat.hand.append(&mut taken);
                return Err(RuleError::CardNotOwned);
            }
        }
    }
    let report = taken.clone();
    seat.discarded.extend(taken);
    seat.spend_token(TokenKind::TradeOff);
    Ok(Applied {
        actor,
        kind: TokenKind::TradeOff,
        cards: report,
        hidden: true,
        outcome: Outcome::Advanced,
    })
}

fn initiate_gift(
    state: &mut GameState,
    actor: Position,
    ids: &[ID<Card>],
) -> Result<Applied, RuleError> {
    if ids.len() != 3 {
        return Err(RuleError::WrongCardCount {
            expected: 3,
            got: ids.len(),
        });
    }
    if !distinct(ids) {
        return Err(RuleError::DuplicateCards);
    }
    if !ids.iter().all(|id| state.seats[actor].owns(id)) {
        return Err(RuleError::CardNotOwned);
    }
    let offered = ids
        .iter()
        .map(|id| state.seats[actor].take_from_hand(id).expect("owned above"))
        .collect::<Vec<_>>();
    let target = state.opponent(actor);
    state.pending = Some(Pending::Gift {
        initiator: state.seats[actor].id.clone(),
        target: state.seats[target].id.clone(),
        offered: offered.clone(),
    });
    state.seats[actor].spend_token(TokenKind::Gift);
    Ok(Applied {
        actor,
        kind: TokenKind::Gift,
        cards: offered,
        hidden: false,
        outcome: Outcome::Opened,
    })
}

fn initiate_competition(
    state: &mut GameState,
    actor: Position,
    groups: &[Vec<ID<Card>>],
) -> Result<Applied, RuleError> {
    if groups.len() != 2 || groups.iter().any(|g| g.len() != 2) {
        return Err(RuleError::BadGrouping);
    }
    let ids = groups.iter().flatten().cloned().collect::<Vec<_>>();
    if !distinct(&ids) {
        return Err(RuleError::DuplicateCards);
    }
    if !ids.iter().all(|id| state.seats[actor].owns(id)) {
        return Err(RuleError::CardNotOwned);
    }
    let materialized = groups
        .iter()
        .map(|group| {
            group
                .iter()
                .map(|id| state.seats[actor].take_from_hand(id).expect("owned above"))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    let target = state.opponent(actor);
    state.pending = Some(Pending::Competition {
        initiator: state.seats[actor].id.clone(),
        target: state.seats[target].id.clone(),
        groups: materialized.clone(),
    });
    state.seats[actor].spend_token(TokenKind::Competition);
    Ok(Applied {
        actor,
        kind: TokenKind::Competition,
        cards: materialized.into_iter().flatten().collect(),
        hidden: false,
        outcome: Outcome::Opened,
    })
}

fn resolve_gift(
    state: &mut GameState,
    actor: Position,
    chosen: &ID<Card>,
) -> Result<Applied, RuleError> {
    let (initiator, target, offered) = match &state.pending {
        Some(Pending::Gift {
            initiator,
            target,
            offered,
        }) => (initiator.clone(), target.clone(), offered.clone()),
        _ => return Err(RuleError::NoInteraction),
    };
    if state.seats[actor].id != target {
        return Err(RuleError::NotInteractionTarget);
    }
    if !offered.iter().any(|c| c.id == *chosen) {
        return Err(RuleError::NotOffered);
    }
    let initiator = state.position(&initiator).expect("initiator is seated");
    let (kept, returned): (Vec<Card>, Vec<Card>) =
        offered.into_iter().partition(|c| c.id == *chosen);
    let chosen_card = kept.into_iter().next().expect("chosen is offered");
    state.seats[actor].played.push(chosen_card.clone());
    state.seats[initiator].played.extend(returned.iter().cloned());
    state.pending = None;
    Ok(Applied {
        actor,
        kind: TokenKind::Gift,
        cards: Vec::new(),
        hidden: false,
        outcome: Outcome::ResolvedGift {
            initiator,
            target: actor,
            chosen: chosen_card,
            to_initiator: returned,
        },
    })
}

fn resolve_competition(
    state: &mut GameState,
    actor: Position,
    chosen: usize,
) -> Result<Applied, RuleError> {
    let (initiator, target, groups) = match &state.pending {
        Some(Pending::Competition {
            initiator,
            target,
            groups,
        }) => (initiator.clone(), target.clone(), groups.clone()),
        _ => return Err(RuleError::NoInteraction),
    };
    if state.seats[actor].id != target {
        return Err(RuleError::NotInteractionTarget);
    }
    if chosen > 1 {
        return Err(RuleError::BadGroupIndex);
    }
    let initiator = state.position(&initiator).expect("initiator is seated");
    let mut groups = groups;
    let to_initiator = groups.remove(1 - chosen);
    let to_target = groups.remove(0);
    state.seats[actor].played.extend(to_target.iter().cloned());
    state.seats[initiator]
        .played
        .extend(to_initiator.iter().cloned());
    state.pending = None;
    Ok(Applied {
        actor,
        kind: TokenKind::Competition,
        cards: Vec::new(),
        hidden: false,
        outcome: Outcome::ResolvedCompetition {
            initiator,
            target: actor,
            chosen,
            to_target,
            to_initiator,
        },
    })
}
