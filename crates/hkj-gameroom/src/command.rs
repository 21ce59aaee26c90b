use super::protocol::ClientMessage;
use hkj_core::PlayerId;
use tokio::sync::mpsc::UnboundedSender;

/// Outbound half of one client connection. The bridge task drains the
/// paired receiver into the socket; the room never awaits a network write.
pub type ConnectionTx = UnboundedSender<String>;

/// Everything that can enter a room's mailbox. Processed strictly in
/// arrival order by the owning task.
#[derive(Debug)]
pub enum Command {
    /// A connection binds (or re-binds) to a seat.
    Attach {
        player: PlayerId,
        name: String,
        conn: ConnectionTx,
    },
    /// A connection dropped. Cancels nothing; the seat survives.
    Detach { player: PlayerId },
    /// A decoded frame from a bound connection.
    Inbound {
        player: PlayerId,
        message: ClientMessage,
    },
    /// A scheduled timer fired. Stale stamps are dropped on receipt.
    Tick { stamp: u64, tick: Tick },
}

/// The scheduled callbacks a room arranges for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Grace period after the second seat arrived; open the order decision.
    OrderStart,
    /// Suspense elapsed; pick and reveal the random first player.
    OrderReveal,
    /// The machine confirms the order result.
    MachineConfirm,
    /// The machine confirms the ready check.
    MachineReady,
    /// The machine takes its turn.
    MachineMove,
    /// The machine answers the pending interaction.
    MachineRespond,
    /// The machine agrees to a rematch.
    MachineRematch,
    /// Round pause elapsed; deal the next round.
    NextRound,
}
