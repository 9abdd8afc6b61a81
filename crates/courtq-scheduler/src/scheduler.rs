//! Assignment loop: decides when cycles run.
//!
//! The loop is idle until [`start`](AssignmentLoop::start)ed. While running
//! it runs a cycle:
//! - once on start,
//! - on every periodic tick,
//! - whenever a [`TriggerHandle`] fires.
//!
//! Cycles never overlap. Triggers that arrive during a cycle collapse into
//! a single follow-up cycle. [`stop`](AssignmentLoop::stop) cancels the
//! timer, waits for an in-flight cycle to finish, and returns to idle; the
//! loop can be started again afterwards.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use courtq_core::config::{MAX_INTERVAL_SECS, MIN_INTERVAL_SECS};

use crate::engine::AssignmentEngine;
use crate::error::{SchedulerError, SchedulerResult};
use crate::trigger::{Trigger, TriggerHandle, channel};

/// Shortest periodic interval the loop accepts.
pub const MIN_INTERVAL: Duration = Duration::from_secs(MIN_INTERVAL_SECS);
/// Longest periodic interval the loop accepts.
pub const MAX_INTERVAL: Duration = Duration::from_secs(MAX_INTERVAL_SECS);

/// Whether the loop is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
}

/// Background task bookkeeping while running.
struct RunningLoop {
    shutdown_tx: watch::Sender<bool>,
    /// Hands the trigger receiver back when the task exits.
    handle: JoinHandle<mpsc::Receiver<Trigger>>,
}

/// Drives [`AssignmentEngine`] cycles from ticks and triggers.
pub struct AssignmentLoop {
    engine: Arc<AssignmentEngine>,
    interval: Duration,
    triggers: TriggerHandle,
    /// Receiver kept here while idle.
    parked: Option<mpsc::Receiver<Trigger>>,
    running: Option<RunningLoop>,
}

impl AssignmentLoop {
    /// Create an idle loop. `interval` is the periodic safety-net period,
    /// clamped to between one second and one day.
    pub fn new(engine: Arc<AssignmentEngine>, interval: Duration) -> Self {
        let clamped = interval.clamp(MIN_INTERVAL, MAX_INTERVAL);
        if clamped != interval {
            warn!(
                requested_secs = interval.as_secs(),
                interval_secs = clamped.as_secs(),
                "cycle interval out of range, clamped"
            );
        }
        let interval = clamped;
        let (triggers, rx) = channel();
        Self {
            engine,
            interval,
            triggers,
            parked: Some(rx),
            running: None,
        }
    }

    /// A handle for firing triggers. Triggers fired while idle are held
    /// (coalesced) until the next start.
    pub fn handle(&self) -> TriggerHandle {
        self.triggers.clone()
    }

    pub fn engine(&self) -> &Arc<AssignmentEngine> {
        &self.engine
    }

    pub fn state(&self) -> LoopState {
        if self.running.is_some() {
            LoopState::Running
        } else {
            LoopState::Idle
        }
    }

    /// Arm the periodic timer and start processing triggers.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> SchedulerResult<()> {
        if self.running.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }
        let rx = match self.parked.take() {
            Some(rx) => rx,
            None => {
                // The previous task died and took the receiver with it.
                let (triggers, rx) = channel();
                self.triggers = triggers;
                warn!("trigger channel rebuilt; earlier handles are disconnected");
                rx
            }
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let engine = self.engine.clone();
        let interval = self.interval;
        let handle = tokio::spawn(async move { run_loop(engine, interval, rx, shutdown_rx).await });

        self.running = Some(RunningLoop {
            shutdown_tx,
            handle,
        });
        self.triggers.fire(Trigger::Startup);

        info!(interval_secs = self.interval.as_secs(), "assignment loop started");
        Ok(())
    }

    /// Cancel the timer and return to idle once any in-flight cycle is done.
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        let Some(running) = self.running.take() else {
            return Err(SchedulerError::NotRunning);
        };
        let _ = running.shutdown_tx.send(true);

        match running.handle.await {
            Ok(rx) => {
                self.parked = Some(rx);
                info!("assignment loop stopped");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "assignment loop task failed");
                Err(SchedulerError::LoopTask(e.to_string()))
            }
        }
    }
}

impl Drop for AssignmentLoop {
    /// Signals the task to finish; it exits after any in-flight cycle.
    fn drop(&mut self) {
        if let Some(running) = &self.running {
            let _ = running.shutdown_tx.send(true);
        }
    }
}

/// The loop body. Returns the trigger receiver on shutdown.
async fn run_loop(
    engine: Arc<AssignmentEngine>,
    period: Duration,
    mut rx: mpsc::Receiver<Trigger>,
    mut shutdown: watch::Receiver<bool>,
) -> mpsc::Receiver<Trigger> {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let trigger = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            Some(trigger) = rx.recv() => trigger,
            _ = ticker.tick() => Trigger::Tick,
        };

        // Store failures are logged and reported by the engine; the next
        // tick or trigger simply tries again.
        if let Err(e) = engine.run_cycle(trigger).await {
            debug!(?trigger, error = %e, "cycle ended with error");
        }
        // Any cycle counts as the periodic one: a tick that fell due
        // meanwhile must not add a second follow-up.
        ticker.reset();
    }

    debug!("assignment loop task exiting");
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Mutex, OnceLock};

    use courtq_state::{CourtType, Qualification, RosterStore};

    use crate::notify::{CycleReport, LogNotifier};

    const PERIOD: Duration = Duration::from_secs(30);

    fn new_loop() -> AssignmentLoop {
        let store = RosterStore::open_in_memory().unwrap();
        let engine = Arc::new(AssignmentEngine::new(store, Arc::new(LogNotifier)));
        AssignmentLoop::new(engine, PERIOD)
    }

    fn counting_loop() -> (AssignmentLoop, Arc<Mutex<Vec<Trigger>>>) {
        counting_loop_with(PERIOD)
    }

    fn counting_loop_with(period: Duration) -> (AssignmentLoop, Arc<Mutex<Vec<Trigger>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let store = RosterStore::open_in_memory().unwrap();
        let engine = Arc::new(AssignmentEngine::new(
            store,
            Arc::new(move |r: &CycleReport| sink.lock().unwrap().push(r.trigger)),
        ));
        (AssignmentLoop::new(engine, period), seen)
    }

    #[tokio::test(start_paused = true)]
    async fn starts_idle_and_toggles() {
        let mut lp = new_loop();
        assert_eq!(lp.state(), LoopState::Idle);
        assert!(matches!(lp.stop().await, Err(SchedulerError::NotRunning)));

        lp.start().unwrap();
        assert_eq!(lp.state(), LoopState::Running);
        assert!(matches!(lp.start(), Err(SchedulerError::AlreadyRunning)));

        lp.stop().await.unwrap();
        assert_eq!(lp.state(), LoopState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn start_runs_an_initial_cycle() {
        let (mut lp, seen) = counting_loop();
        lp.start().unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        lp.stop().await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![Trigger::Startup]);
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_tick_places_players_without_events() {
        let mut lp = new_loop();
        let store = lp.engine().store().clone();
        store.add_court("C", CourtType::Advanced).unwrap();
        lp.start().unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        // Written behind the loop's back: only the tick can notice.
        let p = store.add_player("Quiet", Qualification::Advanced).unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(store.get_player(p.id).unwrap().unwrap().court_id.is_none());

        tokio::time::sleep(PERIOD).await;
        assert!(store.get_player(p.id).unwrap().unwrap().court_id.is_some());
        lp.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn triggers_fired_while_idle_collapse_into_one_cycle() {
        let (mut lp, seen) = counting_loop();
        let handle = lp.handle();
        assert!(handle.on_player_added(1));
        assert!(!handle.on_player_activated(2));
        assert!(!handle.on_court_cleared(3));

        lp.start().unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        lp.stop().await.unwrap();

        // The startup request folded into the pending one.
        assert_eq!(*seen.lock().unwrap(), vec![Trigger::PlayerAdded(1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn triggers_during_a_cycle_cause_exactly_one_rerun() {
        let seen = Arc::new(AtomicUsize::new(0));
        let handle_slot: Arc<OnceLock<TriggerHandle>> = Arc::new(OnceLock::new());

        let counter = seen.clone();
        let slot = handle_slot.clone();
        let notifier = move |_: &CycleReport| {
            // First cycle: a burst of events lands while it is in flight.
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                if let Some(h) = slot.get() {
                    for id in 0..5 {
                        h.on_player_added(id);
                    }
                }
            }
        };
        let store = RosterStore::open_in_memory().unwrap();
        let engine = Arc::new(AssignmentEngine::new(store, Arc::new(notifier)));
        let mut lp = AssignmentLoop::new(engine, PERIOD);
        let _ = handle_slot.set(lp.handle());

        lp.start().unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        lp.stop().await.unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_the_timer_and_restart_resumes() {
        let mut lp = new_loop();
        let store = lp.engine().store().clone();
        store.add_court("C", CourtType::Training).unwrap();

        lp.start().unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        lp.stop().await.unwrap();

        let p = store.add_player("Late", Qualification::Intermediate).unwrap();
        tokio::time::sleep(PERIOD * 4).await;
        assert!(store.get_player(p.id).unwrap().unwrap().court_id.is_none());

        lp.start().unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(store.get_player(p.id).unwrap().unwrap().court_id.is_some());
        lp.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn handles_outlive_restarts() {
        let (mut lp, seen) = counting_loop();
        let handle = lp.handle();

        lp.start().unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        lp.stop().await.unwrap();
        lp.start().unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(handle.on_court_type_changed(9));
        tokio::time::sleep(Duration::from_secs(1)).await;
        lp.stop().await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.last(), Some(&Trigger::CourtTypeChanged(9)));
    }

    // Real time: the first cycle blocks its thread past a tick deadline.
    #[tokio::test]
    async fn overdue_tick_and_event_share_one_rerun() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handle_slot: Arc<OnceLock<TriggerHandle>> = Arc::new(OnceLock::new());

        let sink = seen.clone();
        let slot = handle_slot.clone();
        let notifier = move |r: &CycleReport| {
            let first = {
                let mut seen = sink.lock().unwrap();
                seen.push(r.trigger);
                seen.len() == 1
            };
            if first {
                std::thread::sleep(Duration::from_millis(1300));
                if let Some(h) = slot.get() {
                    h.on_player_added(1);
                }
            }
        };
        let store = RosterStore::open_in_memory().unwrap();
        let engine = Arc::new(AssignmentEngine::new(store, Arc::new(notifier)));
        let mut lp = AssignmentLoop::new(engine, Duration::from_secs(1));
        let _ = handle_slot.set(lp.handle());

        lp.start().unwrap();
        // Startup ends at ~1.3s, the rerun follows at once and the next
        // tick is due one period after that.
        tokio::time::sleep(Duration::from_millis(1800)).await;
        lp.stop().await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Trigger::Startup, Trigger::PlayerAdded(1)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_range_interval_is_clamped() {
        let (mut lp, seen) = counting_loop_with(Duration::from_secs(u64::MAX));
        assert_eq!(lp.interval, MAX_INTERVAL);
        lp.start().unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        lp.stop().await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![Trigger::Startup]);

        let (lp, _) = counting_loop_with(Duration::ZERO);
        assert_eq!(lp.interval, MIN_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_a_running_loop_ends_its_task() {
        let (mut lp, seen) = counting_loop();
        let handle = lp.handle();
        lp.start().unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(lp);

        tokio::time::sleep(PERIOD * 3).await;
        assert_eq!(*seen.lock().unwrap(), vec![Trigger::Startup]);
        // The task is gone and took the receiver with it.
        assert!(!handle.request_cycle());
    }
}
