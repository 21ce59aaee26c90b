use hkj_cards::Card;
use hkj_core::*;
use hkj_engine::GameState;
use std::collections::BTreeMap;

/// One geisha's standing as the machine sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Standing {
    pub mine: usize,
    pub theirs: usize,
    pub charm: Charm,
}

/// Per-geisha standings observed from one side of the table. The machine's
/// own secrets count toward its side (it knows they reveal at round end);
/// the opponent's hidden piles do not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot(BTreeMap<GeishaId, Standing>);

impl Snapshot {
    pub fn observe(state: &GameState, me: Position) -> Self {
        let opp = state.opponent(me);
        let count = |cards: &[Card], geisha: GeishaId| {
            cards.iter().filter(|c| c.geisha_id == geisha).count()
        };
        Self(
            state
                .geishas
                .iter()
                .map(|g| {
                    (
                        g.id,
                        Standing {
                            mine: count(&state.seats[me].played, g.id)
                                + count(&state.seats[me].secrets, g.id),
                            theirs: count(&state.seats[opp].played, g.id),
                            charm: g.charm,
                        },
                    )
                })
                .collect(),
        )
    }

    /// How much playing one more card of `geisha` is worth to this side:
    /// 4× charm when it takes the lead from a tie, 2× charm when it closes
    /// a one-card deficit into a tie, charm otherwise.
    pub fn utility(&self, geisha: GeishaId) -> i32 {
        let standing = match self.0.get(&geisha) {
            Some(standing) => standing,
            None => return 0,
        };
        let charm = standing.charm as i32;
        if standing.mine + 1 > standing.theirs && standing.mine <= standing.theirs {
            4 * charm
        } else if standing.mine + 1 == standing.theirs {
            2 * charm
        } else {
            charm
        }
    }

    /// Net evaluation from this side's perspective: each geisha contributes
    /// 2× charm toward whichever side leads it plus 3 per card of margin,
    /// signed so the opponent's standing counts against ours.
    pub fn evaluate(&self) -> i32 {
        self.0.values().map(Self::margin).sum()
    }
    fn margin(standing: &Standing) -> i32 {
        let charm = standing.charm as i32;
        let diff = standing.mine as i32 - standing.theirs as i32;
        let lead = match standing.mine.cmp(&standing.theirs) {
            std::cmp::Ordering::Greater => 2 * charm,
            std::cmp::Ordering::Less => -2 * charm,
            std::cmp::Ordering::Equal => 0,
        };
        lead + 3 * diff
    }

    /// Copy with extra cards credited to this side.
    pub fn with_mine(&self, cards: &[Card]) -> Self {
        let mut next = self.clone();
        for card in cards {
            if let Some(standing) = next.0.get_mut(&card.geisha_id) {
                standing.mine += 1;
            }
        }
        next
    }
    /// Copy with extra cards credited to the opponent.
    pub fn with_theirs(&self, cards: &[Card]) -> Self {
        let mut next = self.clone();
        for card in cards {
            if let Some(standing) = next.0.get_mut(&card.geisha_id) {
                standing.theirs += 1;
            }
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    fn snapshot(mine: usize, theirs: usize, charm: Charm) -> Snapshot {
        Snapshot(
            std::iter::once((
                1,
                Standing {
                    mine,
                    theirs,
                    charm,
                },
            ))
            .collect(),
        )
    }
    #[test]
    fn taking_the_lead_is_worth_quadruple_charm() {
        assert_eq!(snapshot(0, 0, 3).utility(1), 12);
        assert_eq!(snapshot(2, 2, 5).utility(1), 20);
    }
    #[test]
    fn closing_to_a_tie_is_worth_double_charm() {
        assert_eq!(snapshot(0, 1, 3).utility(1), 6);
        assert_eq!(snapshot(1, 2, 4).utility(1), 8);
    }
    #[test]
    fn hopeless_or_already_leading_is_worth_plain_charm() {
        assert_eq!(snapshot(0, 2, 3).utility(1), 3);
        assert_eq!(snapshot(3, 1, 3).utility(1), 3);
    }
    #[test]
    fn evaluation_is_antisymmetric_in_lead() {
        let ahead = snapshot(2, 0, 4);
        let behind = snapshot(0, 2, 4);
        assert_eq!(ahead.evaluate(), -behind.evaluate());
        assert_eq!(snapshot(1, 1, 4).evaluate(), 0);
    }
    #[test]
    fn crediting_cards_shifts_the_evaluation() {
        let base = snapshot(0, 0, 3);
        let card = Card::new(1);
        assert!(base.with_mine(&[card.clone()]).evaluate() > base.evaluate());
        assert!(base.with_theirs(&[card]).evaluate() < base.evaluate());
    }
}
