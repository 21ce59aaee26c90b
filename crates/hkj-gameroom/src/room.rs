use super::command::*;
use super::order::OrderState;
use super::protocol::*;
use super::snapshot::*;
use super::table::Table;
use super::timer::Timers;
use hkj_cards::GeishaSet;
use hkj_core::*;
use hkj_engine::*;
use hkj_players::Difficulty;
use hkj_players::Machine;
use hkj_players::Opponent;
use hkj_store::room_key;
use hkj_store::SnapshotStore;
use std::time::Duration;
use tokio::sync::mpsc::unbounded_channel;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;

/// Handle for routing frames into a running room.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    pub code: RoomCode,
    pub tx: UnboundedSender<Command>,
}

/// Delays the room schedules for itself. Defaults come from the shared
/// constants; tests shrink them.
#[derive(Debug, Clone, Copy)]
pub struct RoomTiming {
    pub grace: Duration,
    pub reveal: Duration,
    pub pause: Duration,
}

impl Default for RoomTiming {
    fn default() -> Self {
        Self {
            grace: ORDER_GRACE,
            reveal: ORDER_REVEAL,
            pause: ROUND_PAUSE,
        }
    }
}

/// Live room coordinator. Owns the canonical [`GameState`] and serializes
/// every mutation through its mailbox; each successful mutation broadcasts
/// per-viewer masked frames before the next command is processed, and
/// persists a best-effort snapshot.
pub struct Room {
    code: RoomCode,
    host: PlayerId,
    mode: RoomMode,
    set: GeishaSet,
    state: GameState,
    table: Table,
    machine: Option<(PlayerId, Machine)>,
    machine_prodded: bool,
    order: OrderState,
    rematch: Vec<PlayerId>,
    deal_sequence: Vec<DealStep>,
    last_starter: Option<Position>,
    timing: RoomTiming,
    timers: Timers,
    store: Option<SnapshotStore>,
}

impl Room {
    /// Opens a room for its creator, seats the machine in NPC mode, and
    /// spawns the actor task. The `done` receiver fires when the room task
    /// exits so the registry can clean up.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        code: RoomCode,
        host: PlayerId,
        host_name: String,
        conn: ConnectionTx,
        mode: RoomMode,
        difficulty: Option<Difficulty>,
        set: GeishaSet,
        store: Option<SnapshotStore>,
        timing: RoomTiming,
    ) -> (RoomHandle, oneshot::Receiver<()>) {
        let (tx, rx) = unbounded_channel();
        let mut table = Table::default();
        table.seat(host.clone(), host_name.clone(), false, Some(conn));
        let mut seats = vec![Seat::new(host.clone(), host_name)];
        let machine = match mode {
            RoomMode::Npc => {
                let difficulty = difficulty.unwrap_or_default();
                let id = format!("npc-{}", code.to_lowercase());
                let name = format!("CPU ({})", difficulty);
                table.seat(id.clone(), name.clone(), true, None);
                seats.push(Seat::new(id.clone(), name));
                Some((id, Machine::new(difficulty)))
            }
            RoomMode::Online => None,
        };
        let mut room = Self {
            code: code.clone(),
            host: host.clone(),
            mode,
            set,
            state: GameState::new(set, seats),
            table,
            machine,
            machine_prodded: false,
            order: OrderState::default(),
            rematch: Vec::new(),
            deal_sequence: Vec::new(),
            last_starter: None,
            timing,
            timers: Timers::new(tx.clone()),
            store,
        };
        room.table.unicast(
            &host,
            &ServerMessage::RoomCreated {
                room_id: code.clone(),
                player_id: host.clone(),
                mode: room.mode,
            },
        );
        room.broadcast_state();
        if room.table.seats() == N {
            room.timers.schedule(room.timing.grace, Tick::OrderStart);
        }
        room.persist();
        let handle = RoomHandle { code, tx };
        let (done_tx, done_rx) = oneshot::channel();
        tokio::spawn(room.run(rx, done_tx));
        (handle, done_rx)
    }

    /// Revives a room from its persisted snapshot. All seats come back
    /// detached; the machine is reconstituted from its difficulty.
    pub fn rehydrate(
        snapshot: RoomSnapshot,
        store: Option<SnapshotStore>,
        timing: RoomTiming,
    ) -> (RoomHandle, oneshot::Receiver<()>) {
        let (tx, rx) = unbounded_channel();
        let mut table = Table::default();
        let mut machine = None;
        for seat in &snapshot.seats {
            table.seat(seat.player_id.clone(), seat.name.clone(), seat.machine, None);
            if seat.machine {
                machine = Some((
                    seat.player_id.clone(),
                    Machine::new(snapshot.difficulty.unwrap_or_default()),
                ));
            }
        }
        let room = Self {
            code: snapshot.code.clone(),
            host: snapshot.host,
            mode: if machine.is_some() {
                RoomMode::Npc
            } else {
                RoomMode::Online
            },
            set: snapshot.geisha_set,
            state: snapshot.game,
            table,
            machine,
            machine_prodded: false,
            order: snapshot.order,
            rematch: snapshot.rematch,
            deal_sequence: snapshot.deal_sequence,
            last_starter: snapshot.last_starter,
            timing,
            timers: Timers::new(tx.clone()),
            store,
        };
        log::info!("[room {}] rehydrated from snapshot", room.code);
        let handle = RoomHandle {
            code: room.code.clone(),
            tx,
        };
        let (done_tx, done_rx) = oneshot::channel();
        tokio::spawn(room.run(rx, done_tx));
        (handle, done_rx)
    }

    async fn run(mut self, mut rx: UnboundedReceiver<Command>, done: oneshot::Sender<()>) {
        log::debug!("[room {}] actor running", self.code);
        while let Some(command) = rx.recv().await {
            self.handle(command).await;
            if self.table.humans_attached() == 0 {
                log::info!("[room {}] no humans attached, closing", self.code);
                break;
            }
        }
        let _ = done.send(());
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Attach { player, name, conn } => self.attach(player, name, conn),
            Command::Detach { player } => {
                log::info!("[room {}] {} disconnected", self.code, player);
                self.table.detach(&player);
            }
            Command::Inbound { player, message } => self.inbound(player, message).await,
            Command::Tick { stamp, tick } => {
                if self.timers.accepts(stamp) {
                    self.tick(tick).await;
                } else {
                    log::debug!("[room {}] dropping stale {:?}", self.code, tick);
                }
            }
        }
    }

    async fn inbound(&mut self, player: PlayerId, message: ClientMessage) {
        match message {
            ClientMessage::ConfirmOrder {} => self.confirm_order(player),
            ClientMessage::ReadyConfirm {} => self.confirm_ready(player),
            ClientMessage::GameAction {
                player_id,
                action,
            } => {
                if player_id != player {
                    self.table.unicast(
                        &player,
                        &ServerMessage::error("action player does not match connection"),
                    );
                    return;
                }
                self.submit(player, Play::from(action)).await;
            }
            ClientMessage::RematchRequest {} => self.request_rematch(player),
            ClientMessage::LeaveRoom {} => self.leave(player),
            ClientMessage::CreateRoom { .. } | ClientMessage::JoinRoom { .. } => {
                self.table
                    .unicast(&player, &ServerMessage::error("already in a room"));
            }
        }
    }

    async fn tick(&mut self, tick: Tick) {
        match tick {
            Tick::OrderStart => self.open_order_decision(),
            Tick::OrderReveal => self.reveal_order(),
            Tick::MachineConfirm => {
                if let Some(id) = self.machine_id() {
                    self.confirm_order(id);
                }
            }
            Tick::MachineReady => {
                if let Some(id) = self.machine_id() {
                    self.confirm_ready(id);
                }
            }
            Tick::MachineMove => self.machine_move().await,
            Tick::MachineRespond => self.machine_respond().await,
            Tick::MachineRematch => {
                if let Some(id) = self.machine_id() {
                    self.request_rematch(id);
                }
            }
            Tick::NextRound => self.next_round(),
        }
    }

    // ------------------------------------------------------------------
    // seating
    // ------------------------------------------------------------------

    fn attach(&mut self, player: PlayerId, name: String, conn: ConnectionTx) {
        if self.table.contains(&player) {
            log::info!("[room {}] {} reconnected", self.code, player);
            self.table.attach(&player, conn);
            self.table.unicast(
                &player,
                &ServerMessage::GameStateUpdated {
                    state: masked(&self.state, &player),
                },
            );
            if let Some(pending) = &self.state.pending {
                self.table.unicast(
                    &player,
                    &ServerMessage::PendingInteraction {
                        interaction: pending.clone(),
                    },
                );
            }
            self.ensure_machine();
            return;
        }
        if self.table.seats() >= N || self.state.phase != Phase::Waiting {
            let message = ServerMessage::error("room is full");
            let _ = conn.send(message.to_json());
            return;
        }
        log::info!("[room {}] {} joined", self.code, player);
        self.table.seat(player.clone(), name.clone(), false, Some(conn));
        self.state.seats.push(Seat::new(player.clone(), name.clone()));
        self.table.broadcast(&ServerMessage::PlayerJoined {
            player_id: player.clone(),
            player_name: name,
        });
        self.broadcast_state();
        if self.table.seats() == N {
            self.cancel_timers();
            self.timers.schedule(self.timing.grace, Tick::OrderStart);
        }
        self.persist();
    }

    fn leave(&mut self, player: PlayerId) {
        log::info!("[room {}] {} left", self.code, player);
        self.table.broadcast(&ServerMessage::PlayerLeft {
            player_id: player.clone(),
        });
        self.table.detach(&player);
        if self.state.phase == Phase::Waiting {
            self.table.remove(&player);
            self.state.seats.retain(|s| s.id != player);
        }
        self.persist();
    }

    // ------------------------------------------------------------------
    // order decision & ready check
    // ------------------------------------------------------------------

    fn open_order_decision(&mut self) {
        if self.state.phase != Phase::Waiting || self.table.seats() != N {
            return;
        }
        self.cancel_timers();
        self.state.phase = Phase::DecidingOrder;
        self.table.broadcast(&ServerMessage::OrderDecisionStart {});
        self.broadcast_state();
        self.timers.schedule(self.timing.reveal, Tick::OrderReveal);
        self.persist();
    }

    fn reveal_order(&mut self) {
        if self.state.phase != Phase::DecidingOrder || self.order.order.is_some() {
            return;
        }
        self.cancel_timers();
        let order = self.order.decide([
            self.state.seats[0].id.clone(),
            self.state.seats[1].id.clone(),
        ]);
        let first = order[0].clone();
        log::info!("[room {}] order decided, {} starts", self.code, first);
        self.table.broadcast(&ServerMessage::OrderDecisionResult {
            order,
            first_player_id: first,
        });
        self.schedule_machine(Tick::MachineConfirm);
        self.persist();
    }

    fn confirm_order(&mut self, player: PlayerId) {
        if !self.order.confirm(&player) {
            log::debug!("[room {}] ignoring order confirm from {}", self.code, player);
            return;
        }
        self.table.broadcast(&ServerMessage::OrderConfirmationUpdate {
            confirmed: self.order.confirmed.clone(),
        });
        if self.order.all_confirmed(self.table.seats()) {
            self.order.ready_check = true;
            self.table.broadcast(&ServerMessage::ReadyCheck {});
            self.schedule_machine(Tick::MachineReady);
        }
        self.persist();
    }

    fn confirm_ready(&mut self, player: PlayerId) {
        if !self.order.make_ready(&player) {
            log::debug!("[room {}] ignoring ready confirm from {}", self.code, player);
            return;
        }
        self.table.broadcast(&ServerMessage::ReadyStatus {
            ready: self.order.ready.clone(),
        });
        if self.order.all_ready(self.table.seats()) {
            self.start_game();
        } else {
            self.persist();
        }
    }

    fn start_game(&mut self) {
        let first = self
            .order
            .first()
            .cloned()
            .expect("readiness implies a decided order");
        let starter = self
            .state
            .position(&first)
            .expect("decided order names seated players");
        self.cancel_timers();
        self.last_starter = Some(starter);
        log::info!("[room {}] game starting, {} first", self.code, first);
        self.table.broadcast(&ServerMessage::GameStarted {
            round: 1,
            first_player_id: first,
        });
        self.start_round(starter, 1);
    }

    // ------------------------------------------------------------------
    // round lifecycle
    // ------------------------------------------------------------------

    fn start_round(&mut self, starter: Position, round: Round) {
        self.cancel_timers();
        self.deal_sequence = prepare_round(&mut self.state, starter, round);
        for link in self.table.links() {
            self.table.unicast(
                &link.player,
                &ServerMessage::DealAnimation {
                    round,
                    steps: masked_deal(&self.deal_sequence, &link.player),
                },
            );
        }
        self.open_turn();
    }

    fn open_turn(&mut self) {
        if let Some(card) = begin_turn(&mut self.state) {
            let drawer = self
                .state
                .turn_player()
                .cloned()
                .expect("a drawn card implies a current seat");
            for link in self.table.links() {
                self.table.unicast(
                    &link.player,
                    &ServerMessage::CardDrawn {
                        player_id: drawer.clone(),
                        card: masked_drawn(&card, &drawer, &link.player),
                        draw_count: self.state.draw_pile.len(),
                    },
                );
            }
        }
        self.broadcast_state();
        self.persist();
        self.ensure_machine();
    }

    fn next_round(&mut self) {
        if self.state.phase != Phase::Resolution {
            return;
        }
        let starter = self
            .last_starter
            .map(|pos| self.state.opponent(pos))
            .unwrap_or(0);
        self.last_starter = Some(starter);
        self.start_round(starter, self.state.round + 1);
    }

    fn finish_round(&mut self) {
        let round = self.state.round;
        let resolution = resolve_round(&mut self.state);
        log::info!(
            "[room {}] round {} resolved, winner: {:?}",
            self.code,
            round,
            resolution.winner
        );
        self.table.broadcast(&ServerMessage::RoundComplete {
            round,
            resolution: resolution.clone(),
        });
        self.broadcast_state();
        match &resolution.winner {
            Some(winner) => {
                self.table.broadcast(&ServerMessage::GameEnded {
                    winner_id: winner.clone(),
                    scores: resolution.scores.clone(),
                });
            }
            None => {
                self.timers.schedule(self.timing.pause, Tick::NextRound);
            }
        }
        self.persist();
    }

    // ------------------------------------------------------------------
    // play
    // ------------------------------------------------------------------

    async fn submit(&mut self, player: PlayerId, play: Play) {
        log::debug!("[room {}] {} plays {}", self.code, player, play);
        let applied = match apply(&mut self.state, &player, &play) {
            Ok(applied) => applied,
            Err(e) => {
                log::debug!("[room {}] rejected {}: {}", self.code, player, e);
                self.table.unicast(&player, &ServerMessage::error(e));
                return;
            }
        };
        self.cancel_timers();
        let actor = self.state.seats[applied.actor].id.clone();
        for link in self.table.links() {
            self.table.unicast(
                &link.player,
                &ServerMessage::ActionExecuted {
                    player_id: actor.clone(),
                    action_type: applied.kind,
                    card_ids: masked_action_cards(&applied, &self.state, &link.player),
                    card_count: applied.cards.len(),
                },
            );
        }
        match applied.outcome {
            Outcome::Opened => {
                let interaction = self
                    .state
                    .pending
                    .clone()
                    .expect("opened outcome leaves an interaction pending");
                self.table
                    .broadcast(&ServerMessage::PendingInteraction { interaction });
                self.broadcast_state();
                self.persist();
                self.ensure_machine();
            }
            Outcome::Advanced => self.after_turn(),
            Outcome::ResolvedGift {
                initiator,
                target,
                chosen,
                to_initiator,
            } => {
                let resolved = ResolvedInteraction {
                    kind: TokenKind::Gift,
                    initiator_id: self.state.seats[initiator].id.clone(),
                    target_id: self.state.seats[target].id.clone(),
                    chosen_card_id: Some(chosen.id),
                    chosen_group_index: None,
                    initiator_cards: to_initiator,
                    target_cards: vec![chosen],
                };
                self.table
                    .broadcast(&ServerMessage::InteractionResolved {
                        interaction: resolved,
                    });
                self.after_turn();
            }
            Outcome::ResolvedCompetition {
                initiator,
                target,
                chosen,
                to_target,
                to_initiator,
            } => {
                let resolved = ResolvedInteraction {
                    kind: TokenKind::Competition,
                    initiator_id: self.state.seats[initiator].id.clone(),
                    target_id: self.state.seats[target].id.clone(),
                    chosen_card_id: None,
                    chosen_group_index: Some(chosen),
                    initiator_cards: to_initiator,
                    target_cards: to_target,
                };
                self.table
                    .broadcast(&ServerMessage::InteractionResolved {
                        interaction: resolved,
                    });
                self.after_turn();
            }
        }
    }

    fn after_turn(&mut self) {
        match advance_turn(&mut self.state) {
            Some(_) => self.open_turn(),
            None => self.finish_round(),
        }
    }

    // ------------------------------------------------------------------
    // rematch
    // ------------------------------------------------------------------

    fn request_rematch(&mut self, player: PlayerId) {
        if self.state.phase != Phase::Ended {
            self.table
                .unicast(&player, &ServerMessage::error("game is not over"));
            return;
        }
        if self.rematch.contains(&player) {
            return;
        }
        self.rematch.push(player.clone());
        self.table.broadcast(&ServerMessage::RematchRequested {
            player_id: player,
            agreed: self.rematch.clone(),
        });
        if self.rematch.len() == self.table.seats() {
            self.restart();
        } else {
            self.schedule_machine(Tick::MachineRematch);
            self.persist();
        }
    }

    fn restart(&mut self) {
        log::info!("[room {}] rematch agreed, resetting", self.code);
        self.cancel_timers();
        self.rematch.clear();
        self.order.reset();
        self.deal_sequence.clear();
        self.last_starter = None;
        let seats = self
            .table
            .links()
            .iter()
            .map(|l| Seat::new(l.player.clone(), l.name.clone()))
            .collect();
        self.state = GameState::new(self.set, seats);
        self.broadcast_state();
        self.timers.schedule(self.timing.grace, Tick::OrderStart);
        self.persist();
    }

    // ------------------------------------------------------------------
    // machine scheduling
    // ------------------------------------------------------------------

    fn machine_id(&self) -> Option<PlayerId> {
        self.machine.as_ref().map(|(id, _)| id.clone())
    }

    fn machine_think(&self) -> Duration {
        self.machine
            .as_ref()
            .map(|(_, m)| m.think())
            .unwrap_or_default()
    }

    /// Schedules a machine tick after its think delay, if a machine seat
    /// exists.
    fn schedule_machine(&self, tick: Tick) {
        if self.machine.is_some() {
            self.timers.schedule(self.machine_think(), tick);
        }
    }

    /// Makes sure the machine has a pending decision scheduled whenever
    /// the state is waiting on it. Idempotent between mutations.
    fn ensure_machine(&mut self) {
        if self.machine_prodded {
            return;
        }
        let Some(id) = self.machine_id() else { return };
        if let Some(pending) = &self.state.pending {
            if *pending.target() == id {
                self.schedule_machine(Tick::MachineRespond);
                self.machine_prodded = true;
            }
            return;
        }
        if self.state.phase == Phase::Playing && self.state.turn_player() == Some(&id) {
            self.schedule_machine(Tick::MachineMove);
            self.machine_prodded = true;
        }
    }

    async fn machine_move(&mut self) {
        self.machine_prodded = false;
        let Some((id, _)) = &self.machine else { return };
        let id = id.clone();
        if self.state.phase != Phase::Playing
            || self.state.pending.is_some()
            || self.state.turn_player() != Some(&id)
        {
            return;
        }
        let me = self.state.position(&id).expect("machine is seated");
        let play = {
            let (_, machine) = self.machine.as_mut().expect("machine checked above");
            machine.act(&self.state, me).await
        };
        self.submit(id, play).await;
    }

    async fn machine_respond(&mut self) {
        self.machine_prodded = false;
        let Some((id, _)) = &self.machine else { return };
        let id = id.clone();
        match &self.state.pending {
            Some(pending) if *pending.target() == id => {}
            _ => return,
        }
        let me = self.state.position(&id).expect("machine is seated");
        let play = {
            let (_, machine) = self.machine.as_mut().expect("machine checked above");
            machine.react(&self.state, me).await
        };
        self.submit(id, play).await;
    }

    // ------------------------------------------------------------------
    // plumbing
    // ------------------------------------------------------------------

    fn cancel_timers(&mut self) {
        self.timers.invalidate();
        self.machine_prodded = false;
    }

    /// One masked frame per attached viewer. The only path that emits
    /// GAME_STATE_UPDATED, and it only accepts the masker's output.
    fn broadcast_state(&self) {
        for link in self.table.links() {
            if link.conn.is_some() {
                self.table.unicast(
                    &link.player,
                    &ServerMessage::GameStateUpdated {
                        state: masked(&self.state, &link.player),
                    },
                );
            }
        }
    }

    fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            code: self.code.clone(),
            host: self.host.clone(),
            seats: self
                .table
                .links()
                .iter()
                .map(|l| SeatMeta {
                    player_id: l.player.clone(),
                    name: l.name.clone(),
                    machine: l.machine,
                })
                .collect(),
            difficulty: self.machine.as_ref().map(|(_, m)| m.difficulty()),
            geisha_set: self.set,
            last_starter: self.last_starter,
            order: self.order.clone(),
            rematch: self.rematch.clone(),
            deal_sequence: self.deal_sequence.clone(),
            game: self.state.clone(),
        }
    }

    /// Fire-and-forget snapshot save. Failures log and never fail the
    /// mutation that triggered them.
    fn persist(&self) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let snapshot = self.snapshot();
        let key = room_key(&self.code);
        tokio::spawn(async move {
            match snapshot.to_json() {
                Ok(json) => {
                    if let Err(e) = store.put(&key, json).await {
                        log::warn!("[store] save {} failed: {}", key, e);
                    }
                }
                Err(e) => log::warn!("[store] encode {} failed: {}", key, e),
            }
        });
    }
}

/// A drawn card is visible to its drawer only.
fn masked_drawn(card: &hkj_cards::Card, drawer: &PlayerId, viewer: &PlayerId) -> CardView {
    let steps = [DealStep {
        player_id: drawer.clone(),
        card: card.clone(),
    }];
    masked_deal(&steps, viewer)
        .pop()
        .expect("one step in, one view out")
        .card
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tokio::sync::mpsc::unbounded_channel;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn fast() -> RoomTiming {
        RoomTiming {
            grace: Duration::from_millis(5),
            reveal: Duration::from_millis(5),
            pause: Duration::from_millis(5),
        }
    }

    async fn frame(rx: &mut UnboundedReceiver<String>) -> Value {
        let text = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("frame before timeout")
            .expect("connection open");
        serde_json::from_str(&text).expect("frames are json")
    }
    /// Skips frames until one of the wanted type arrives.
    async fn frame_of(rx: &mut UnboundedReceiver<String>, wanted: &str) -> Value {
        loop {
            let value = frame(rx).await;
            if value["type"] == wanted {
                return value;
            }
        }
    }
    fn inbound(handle: &RoomHandle, player: &str, message: ClientMessage) {
        handle
            .tx
            .send(Command::Inbound {
                player: player.to_string(),
                message,
            })
            .expect("room alive");
    }

    #[tokio::test(start_paused = true)]
    async fn npc_room_reaches_game_start_after_confirmations() {
        let (tx, mut rx) = unbounded_channel();
        let (handle, _done) = Room::create(
            "TEST01".into(),
            "human".into(),
            "Human".into(),
            tx,
            RoomMode::Npc,
            Some(hkj_players::Difficulty::Hell),
            GeishaSet::Default,
            None,
            fast(),
        );
        assert_eq!(frame(&mut rx).await["type"], "ROOM_CREATED");
        frame_of(&mut rx, "ORDER_DECISION_START").await;
        let result = frame_of(&mut rx, "ORDER_DECISION_RESULT").await;
        let order = result["payload"]["order"].as_array().unwrap();
        assert_eq!(order.len(), 2);
        inbound(&handle, "human", ClientMessage::ConfirmOrder {});
        frame_of(&mut rx, "READY_CHECK").await;
        inbound(&handle, "human", ClientMessage::ReadyConfirm {});
        let started = frame_of(&mut rx, "GAME_STARTED").await;
        assert_eq!(started["payload"]["round"], 1);
        let deal = frame_of(&mut rx, "DEAL_ANIMATION").await;
        assert_eq!(deal["payload"]["steps"].as_array().unwrap().len(), 12);
        // the machine keeps the game moving even if it starts
        let state = frame_of(&mut rx, "GAME_STATE_UPDATED").await;
        assert_eq!(state["payload"]["state"]["round"], 1);
    }

    #[tokio::test(start_paused = true)]
    async fn online_room_runs_gift_two_phase_over_the_wire() {
        let (tx_a, mut rx_a) = unbounded_channel();
        let (handle, _done) = Room::create(
            "TEST02".into(),
            "alice".into(),
            "Alice".into(),
            tx_a,
            RoomMode::Online,
            None,
            GeishaSet::Default,
            None,
            fast(),
        );
        let (tx_b, mut rx_b) = unbounded_channel();
        handle
            .tx
            .send(Command::Attach {
                player: "bob".into(),
                name: "Bob".into(),
                conn: tx_b,
            })
            .unwrap();
        frame_of(&mut rx_a, "PLAYER_JOINED").await;
        let result = frame_of(&mut rx_a, "ORDER_DECISION_RESULT").await;
        let first = result["payload"]["firstPlayerId"].as_str().unwrap().to_string();
        inbound(&handle, "alice", ClientMessage::ConfirmOrder {});
        inbound(&handle, "bob", ClientMessage::ConfirmOrder {});
        frame_of(&mut rx_a, "READY_CHECK").await;
        inbound(&handle, "alice", ClientMessage::ReadyConfirm {});
        inbound(&handle, "bob", ClientMessage::ReadyConfirm {});
        frame_of(&mut rx_a, "GAME_STARTED").await;

        let (second, mut rx_first, mut rx_second) = if first == "alice" {
            ("bob".to_string(), rx_a, rx_b)
        } else {
            ("alice".to_string(), rx_b, rx_a)
        };
        // the starter reads its own hand from the first in-play state frame
        let state = loop {
            let value = frame_of(&mut rx_first, "GAME_STATE_UPDATED").await;
            if value["payload"]["state"]["phase"] == "playing" {
                break value;
            }
        };
        let seats = state["payload"]["state"]["seats"].as_array().unwrap();
        let mine = seats
            .iter()
            .find(|s| s["playerId"] == first.as_str())
            .expect("own seat present");
        let cards = mine["hand"]
            .as_array()
            .unwrap()
            .iter()
            .take(3)
            .map(|c| c["id"].as_str().unwrap().to_string())
            .collect::<Vec<_>>();
        assert_eq!(cards.len(), 3);
        let offer = WireAction::InitiateGift {
            card_ids: cards
                .iter()
                .map(|id| ID::from(uuid::Uuid::parse_str(id).unwrap()))
                .collect(),
        };
        inbound(
            &handle,
            &first,
            ClientMessage::GameAction {
                player_id: first.clone(),
                action: offer,
            },
        );
        let pending = frame_of(&mut rx_second, "PENDING_INTERACTION").await;
        let offered = pending["payload"]["interaction"]["offered"]
            .as_array()
            .unwrap();
        assert_eq!(offered.len(), 3);

        // a second action from the initiator is rejected while pending
        let state = frame_of(&mut rx_first, "GAME_STATE_UPDATED").await;
        let hand_card = state["payload"]["state"]["seats"]
            .as_array()
            .unwrap()
            .iter()
            .find(|s| s["playerId"] == first.as_str())
            .unwrap()["hand"][0]["id"]
            .as_str()
            .unwrap()
            .to_string();
        inbound(
            &handle,
            &first,
            ClientMessage::GameAction {
                player_id: first.clone(),
                action: WireAction::PlaySecret {
                    card_id: ID::from(uuid::Uuid::parse_str(&hand_card).unwrap()),
                },
            },
        );
        let error = frame_of(&mut rx_first, "ERROR").await;
        assert!(error["payload"]["message"]
            .as_str()
            .unwrap()
            .contains("pending interaction"));

        // the target resolves; cards land on both sides of the table
        let chosen = offered[1]["id"].as_str().unwrap().to_string();
        inbound(
            &handle,
            &second,
            ClientMessage::GameAction {
                player_id: second.clone(),
                action: WireAction::ResolveGift {
                    chosen_card_id: ID::from(uuid::Uuid::parse_str(&chosen).unwrap()),
                },
            },
        );
        let resolved = frame_of(&mut rx_second, "INTERACTION_RESOLVED").await;
        assert_eq!(
            resolved["payload"]["interaction"]["chosenCardId"]
                .as_str()
                .unwrap(),
            chosen
        );
        let state = frame_of(&mut rx_second, "GAME_STATE_UPDATED").await;
        let seats = state["payload"]["state"]["seats"].as_array().unwrap();
        let target_played = seats
            .iter()
            .find(|s| s["playerId"] == second.as_str())
            .unwrap()["playedCards"]
            .as_array()
            .unwrap();
        let initiator_played = seats
            .iter()
            .find(|s| s["playerId"] == first.as_str())
            .unwrap()["playedCards"]
            .as_array()
            .unwrap();
        assert_eq!(target_played.len(), 1);
        assert_eq!(initiator_played.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_reattaches_and_resends_masked_state() {
        let (tx_a, mut rx_a) = unbounded_channel();
        let (handle, _done) = Room::create(
            "TEST03".into(),
            "alice".into(),
            "Alice".into(),
            tx_a,
            RoomMode::Online,
            None,
            GeishaSet::Default,
            None,
            fast(),
        );
        let (tx_b, _rx_b) = unbounded_channel();
        handle
            .tx
            .send(Command::Attach {
                player: "bob".into(),
                name: "Bob".into(),
                conn: tx_b,
            })
            .unwrap();
        frame_of(&mut rx_a, "ORDER_DECISION_START").await;
        // alice drops and comes back with a fresh connection
        handle
            .tx
            .send(Command::Detach {
                player: "alice".into(),
            })
            .unwrap();
        let (tx_a2, mut rx_a2) = unbounded_channel();
        handle
            .tx
            .send(Command::Attach {
                player: "alice".into(),
                name: "Alice".into(),
                conn: tx_a2,
            })
            .unwrap();
        let state = frame_of(&mut rx_a2, "GAME_STATE_UPDATED").await;
        assert_eq!(
            state["payload"]["state"]["seats"].as_array().unwrap().len(),
            2
        );
    }

    #[tokio::test(start_paused = true)]
    async fn third_player_is_rejected() {
        let (tx_a, _rx_a) = unbounded_channel();
        let (handle, _done) = Room::create(
            "TEST04".into(),
            "alice".into(),
            "Alice".into(),
            tx_a,
            RoomMode::Online,
            None,
            GeishaSet::Default,
            None,
            fast(),
        );
        let (tx_b, _rx_b) = unbounded_channel();
        handle
            .tx
            .send(Command::Attach {
                player: "bob".into(),
                name: "Bob".into(),
                conn: tx_b,
            })
            .unwrap();
        let (tx_c, mut rx_c) = unbounded_channel();
        handle
            .tx
            .send(Command::Attach {
                player: "carol".into(),
                name: "Carol".into(),
                conn: tx_c,
            })
            .unwrap();
        let error = frame_of(&mut rx_c, "ERROR").await;
        assert!(error["payload"]["message"].as_str().unwrap().contains("full"));
    }
}
