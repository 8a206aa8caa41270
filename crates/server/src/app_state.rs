use std::sync::{Arc, Mutex};

use control::{CalculationFlag, CommandSignal, Orchestrator, RobotStatus};
use shared::protocol::{ControlEvent, StateSnapshot};
use tokio::sync::{broadcast, watch};

#[derive(Clone)]
pub(crate) struct AppState {
    /// Single writer. Only locked on blocking workers.
    pub(crate) orchestrator: Arc<Mutex<Orchestrator>>,
    pub(crate) snapshots: watch::Sender<StateSnapshot>,
    pub(crate) signals: Arc<CommandSignal>,
    pub(crate) robot: RobotStatus,
    pub(crate) calculating: CalculationFlag,
    pub(crate) events: broadcast::Sender<ControlEvent>,
}

impl AppState {
    pub(crate) fn new(orchestrator: Orchestrator, event_capacity: usize) -> Self {
        let signals = Arc::clone(orchestrator.signals());
        let robot = orchestrator.robot_status().clone();
        let calculating = orchestrator.calculating();
        let (snapshots, _) = watch::channel(orchestrator.snapshot());
        let (events, _) = broadcast::channel(event_capacity);
        Self {
            orchestrator: Arc::new(Mutex::new(orchestrator)),
            snapshots,
            signals,
            robot,
            calculating,
            events,
        }
    }

    /// Last committed snapshot with live robot telemetry and `calculating`.
    pub(crate) fn current_snapshot(&self) -> StateSnapshot {
        let mut snapshot = self.snapshots.borrow().clone();
        snapshot.robot = self.robot.view();
        snapshot.calculating = self.calculating.is_set();
        snapshot
    }

    pub(crate) fn publish(&self, snapshot: StateSnapshot) {
        self.snapshots.send_replace(snapshot.clone());
        let _ = self.events.send(ControlEvent::StateUpdated {
            snapshot: Box::new(snapshot),
        });
    }
}
