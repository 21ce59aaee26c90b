use hkj_core::*;
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde::Serialize;

/// The order-decision and ready-check sub-protocol that gates the first
/// deal. Both seats confirm the random order, then both confirm readiness.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderState {
    /// Decided seat order, first entry starts. `None` before the reveal.
    pub order: Option<Vec<PlayerId>>,
    pub confirmed: Vec<PlayerId>,
    pub ready_check: bool,
    pub ready: Vec<PlayerId>,
}

impl OrderState {
    /// Picks the first player uniformly at random between the two seats.
    pub fn decide(&mut self, players: [PlayerId; 2]) -> Vec<PlayerId> {
        let mut order = players.to_vec();
        order.shuffle(&mut rand::rng());
        self.order = Some(order.clone());
        order
    }
    pub fn first(&self) -> Option<&PlayerId> {
        self.order.as_ref().and_then(|o| o.first())
    }
    /// Records an order confirmation. Returns false for duplicates and for
    /// confirmations before the reveal.
    pub fn confirm(&mut self, player: &PlayerId) -> bool {
        if self.order.is_none() || self.confirmed.contains(player) {
            return false;
        }
        self.confirmed.push(player.clone());
        true
    }
    pub fn all_confirmed(&self, seats: usize) -> bool {
        self.order.is_some() && self.confirmed.len() == seats
    }
    /// Records a ready confirmation once the ready check is open.
    pub fn make_ready(&mut self, player: &PlayerId) -> bool {
        if !self.ready_check || self.ready.contains(player) {
            return false;
        }
        self.ready.push(player.clone());
        true
    }
    pub fn all_ready(&self, seats: usize) -> bool {
        self.ready_check && self.ready.len() == seats
    }
    /// Back to square one, for rematches.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn players() -> [PlayerId; 2] {
        ["a".to_string(), "b".to_string()]
    }

    #[test]
    fn decide_orders_both_players() {
        let mut order = OrderState::default();
        let decided = order.decide(players());
        assert_eq!(decided.len(), 2);
        assert!(decided.contains(&"a".to_string()));
        assert!(decided.contains(&"b".to_string()));
        assert_eq!(order.first(), decided.first());
    }
    #[test]
    fn confirmations_require_a_decided_order() {
        let mut order = OrderState::default();
        assert!(!order.confirm(&"a".to_string()));
        order.decide(players());
        assert!(order.confirm(&"a".to_string()));
        assert!(!order.confirm(&"a".to_string()));
        assert!(!order.all_confirmed(2));
        assert!(order.confirm(&"b".to_string()));
        assert!(order.all_confirmed(2));
    }
    #[test]
    fn readiness_requires_the_ready_check_phase() {
        let mut order = OrderState::default();
        order.decide(players());
        assert!(!order.make_ready(&"a".to_string()));
        order.ready_check = true;
        assert!(order.make_ready(&"a".to_string()));
        assert!(order.make_ready(&"b".to_string()));
        assert!(order.all_ready(2));
        order.reset();
        assert!(order.order.is_none());
        assert!(!order.ready_check);
    }
}
