//! Ticking task behind `startTimer`.

use tokio::time::{self, Instant};
use tracing::{debug, info};

use crate::{
    dto::ws::ServerMessage,
    state::{
        SharedState,
        round::{CountdownHandle, TickOutcome},
        session::GameSession,
    },
};

/// Spawn the countdown for `generation` and bind it to the round.
///
/// The caller must hold the session lock (`session` is the guarded value), so
/// the task cannot tick before its handle is installed.
pub fn spawn_countdown(state: &SharedState, session: &mut GameSession, generation: u64) {
    let period = state.config().tick_interval();
    let task_state = state.clone();

    let task = tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        loop {
            ticker.tick().await;

            let mut session = task_state.session().lock().await;
            match session.round_mut().tick(generation) {
                TickOutcome::Stale => {
                    debug!(generation, "countdown superseded");
                    break;
                }
                TickOutcome::Remaining(seconds) => {
                    task_state
                        .gateway()
                        .broadcast(ServerMessage::TimerUpdate(seconds));
                }
                TickOutcome::Expired => {
                    task_state.gateway().broadcast(ServerMessage::TimerUpdate(0));
                    task_state.gateway().broadcast(ServerMessage::TimerEnded);
                    info!(generation, "countdown expired");
                    break;
                }
            }
        }
    });

    session
        .round_mut()
        .install_countdown(CountdownHandle::new(generation, task.abort_handle()));
}
