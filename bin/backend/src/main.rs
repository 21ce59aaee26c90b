//! Hanamikoji game server binary.
//!
//! Serves /health and the /ws game channel on PORT (default 3001).

#[tokio::main]
async fn main() {
    hkj_core::log();
    hkj_core::trap_interrupt();
    hkj_server::run().await.expect("server runs until interrupt");
}
