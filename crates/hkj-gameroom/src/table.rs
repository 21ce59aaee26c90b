use super::command::ConnectionTx;
use super::protocol::ServerMessage;
use hkj_core::*;

/// One seat's connection bookkeeping. The machine seat never has a
/// connection; human seats lose theirs on disconnect and get a fresh one
/// on reconnect.
#[derive(Debug)]
pub struct SeatLink {
    pub player: PlayerId,
    pub name: String,
    pub machine: bool,
    pub conn: Option<ConnectionTx>,
}

/// Seat and connection management for one room. Separates player lifecycle
/// from game logic.
#[derive(Debug, Default)]
pub struct Table {
    links: Vec<SeatLink>,
}

impl Table {
    /// Adds a seat, attached or not.
    pub fn seat(&mut self, player: PlayerId, name: String, machine: bool, conn: Option<ConnectionTx>) {
        self.links.push(SeatLink {
            player,
            name,
            machine,
            conn,
        });
    }
    pub fn links(&self) -> &[SeatLink] {
        &self.links
    }
    pub fn contains(&self, player: &PlayerId) -> bool {
        self.links.iter().any(|l| l.player == *player)
    }
    pub fn name_of(&self, player: &PlayerId) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.player == *player)
            .map(|l| l.name.as_str())
    }
    pub fn is_machine(&self, player: &PlayerId) -> bool {
        self.links
            .iter()
            .any(|l| l.player == *player && l.machine)
    }
    pub fn seats(&self) -> usize {
        self.links.len()
    }
    /// Human seats currently holding a live connection.
    pub fn humans_attached(&self) -> usize {
        self.links
            .iter()
            .filter(|l| !l.machine && l.conn.is_some())
            .count()
    }
    /// Human seats, attached or not.
    pub fn humans(&self) -> usize {
        self.links.iter().filter(|l| !l.machine).count()
    }
    pub fn attach(&mut self, player: &PlayerId, conn: ConnectionTx) {
        if let Some(link) = self.links.iter_mut().find(|l| l.player == *player) {
            link.conn = Some(conn);
        }
    }
    pub fn detach(&mut self, player: &PlayerId) {
        if let Some(link) = self.links.iter_mut().find(|l| l.player == *player) {
            link.conn = None;
        }
    }
    pub fn remove(&mut self, player: &PlayerId) {
        self.links.retain(|l| l.player != *player);
    }
    /// Sends a frame to one seat. Send failures are logged and otherwise
    /// ignored; the next detach will clean the link up.
    pub fn unicast(&self, player: &PlayerId, message: &ServerMessage) {
        match self
            .links
            .iter()
            .find(|l| l.player == *player)
            .and_then(|l| l.conn.as_ref())
        {
            Some(conn) => {
                if let Err(e) = conn.send(message.to_json()) {
                    log::warn!("[table] unicast to {} failed: {:?}", player, e);
                }
            }
            None => log::debug!("[table] unicast to {}: no connection", player),
        }
    }
    /// Sends the same frame to every attached seat.
    pub fn broadcast(&self, message: &ServerMessage) {
        let json = message.to_json();
        for link in self.links.iter().filter(|l| l.conn.is_some()) {
            if let Err(e) = link.conn.as_ref().expect("filtered").send(json.clone()) {
                log::warn!("[table] broadcast to {} failed: {:?}", link.player, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn attach_detach_cycle() {
        let mut table = Table::default();
        let (tx, _rx) = unbounded_channel();
        table.seat("p1".into(), "One".into(), false, Some(tx));
        table.seat("npc".into(), "Machine".into(), true, None);
        assert_eq!(table.seats(), 2);
        assert_eq!(table.humans(), 1);
        assert_eq!(table.humans_attached(), 1);
        table.detach(&"p1".to_string());
        assert_eq!(table.humans_attached(), 0);
        let (tx, _rx) = unbounded_channel();
        table.attach(&"p1".to_string(), tx);
        assert_eq!(table.humans_attached(), 1);
        assert!(table.is_machine(&"npc".to_string()));
        assert!(!table.is_machine(&"p1".to_string()));
    }
    #[test]
    fn broadcast_reaches_attached_seats_only() {
        let mut table = Table::default();
        let (tx, mut rx) = unbounded_channel();
        table.seat("p1".into(), "One".into(), false, Some(tx));
        table.seat("p2".into(), "Two".into(), false, None);
        table.broadcast(&ServerMessage::ReadyCheck {});
        let frame = rx.try_recv().unwrap();
        assert!(frame.contains("READY_CHECK"));
    }
}
