use super::card::Card;
use super::geisha::Geisha;
use hkj_core::*;
use rand::seq::SliceRandom;

/// A freshly built draw pile with its face-down removed card.
///
/// Construction creates `charm` cards per geisha, Fisher–Yates shuffles the
/// 21 with the thread rng, and pops the last card as the removal. The
/// removed card never surfaces to any client.
#[derive(Debug, Clone)]
pub struct Deck {
    pub draw_pile: Vec<Card>,
    pub removed: Card,
}

impl Deck {
    pub fn build(geishas: &[Geisha]) -> Self {
        let mut cards = geishas
            .iter()
            .flat_map(|g| (0..g.charm).map(|_| Card::new(g.id)))
            .collect::<Vec<_>>();
        debug_assert_eq!(cards.len(), DECK_SIZE);
        cards.shuffle(&mut rand::rng());
        let removed = cards.pop().expect("fresh deck is non empty");
        Self {
            draw_pile: cards,
            removed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geisha::base_geishas;
    use crate::geisha::GeishaSet;
    use std::collections::HashSet;

    #[test]
    fn deck_holds_twenty_plus_removal() {
        let deck = Deck::build(&base_geishas(GeishaSet::Default));
        assert_eq!(deck.draw_pile.len(), DECK_SIZE - 1);
    }
    #[test]
    fn deck_ids_are_unique() {
        let deck = Deck::build(&base_geishas(GeishaSet::Default));
        let ids = deck
            .draw_pile
            .iter()
            .map(|c| c.id)
            .chain(std::iter::once(deck.removed.id))
            .collect::<HashSet<_>>();
        assert_eq!(ids.len(), DECK_SIZE);
    }
    #[test]
    fn deck_has_charm_many_cards_per_geisha() {
        let geishas = base_geishas(GeishaSet::Default);
        let deck = Deck::build(&geishas);
        for g in &geishas {
            let copies = deck
                .draw_pile
                .iter()
                .chain(std::iter::once(&deck.removed))
                .filter(|c| c.geisha_id == g.id)
                .count();
            assert_eq!(copies, g.charm as usize);
        }
    }
}
