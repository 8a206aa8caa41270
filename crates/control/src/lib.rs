//! Command validation and mission orchestration for the mower control plane.
//!
//! One [`Orchestrator`] owns the map catalog, task catalog, mow configuration
//! and schedule. Command envelopes go through [`Orchestrator::dispatch`]; the
//! execution layer watches the shared [`CommandSignal`], and presentation
//! reads [`Orchestrator::snapshot`].

use std::sync::Arc;

use route_planner::RouteBuilder;
use shared::{
    domain::{MapEntry, TaskEntry},
    mow::MowConfig,
    protocol::{ApiState, LastCommand},
};

pub mod calculation;
pub mod catalog;
mod dispatch;
pub mod fields;
pub mod robot;
pub mod schedule;
pub mod signal;
mod snapshot;

pub use calculation::{CalculationFlag, CalculationGuard};
pub use catalog::{LoadedMap, MapCatalog, Route, TaskCatalog};
pub use robot::RobotStatus;
pub use schedule::{ScheduleConfig, ScheduleWindow};
pub use signal::CommandSignal;

pub struct Orchestrator {
    maps: MapCatalog,
    tasks: TaskCatalog,
    mow: MowConfig,
    schedule: ScheduleConfig,
    robot: RobotStatus,
    signals: Arc<CommandSignal>,
    route_builder: Arc<dyn RouteBuilder>,
    api_state: ApiState,
    last_command: Option<LastCommand>,
}

impl Orchestrator {
    pub fn new(route_builder: Arc<dyn RouteBuilder>) -> Self {
        Self {
            maps: MapCatalog::default(),
            tasks: TaskCatalog::default(),
            mow: MowConfig::default(),
            schedule: ScheduleConfig::default(),
            robot: RobotStatus::default(),
            signals: CommandSignal::shared(),
            route_builder,
            api_state: ApiState::Boot,
            last_command: None,
        }
    }

    /// Reads telemetry from `robot` instead of a private status.
    pub fn with_robot_status(mut self, robot: RobotStatus) -> Self {
        self.robot = robot;
        self
    }

    /// Raises flags on `signals`, shared with the execution layer.
    pub fn with_signals(mut self, signals: Arc<CommandSignal>) -> Self {
        self.signals = signals;
        self
    }

    /// Ingestion path for saved maps. Not reachable from commands.
    pub fn save_map(&mut self, entry: MapEntry) {
        self.maps.save(entry);
    }

    /// Ingestion path for saved tasks. Not reachable from commands.
    pub fn save_task(&mut self, entry: TaskEntry) {
        self.tasks.save(entry);
    }

    pub fn set_schedule(&mut self, schedule: ScheduleConfig) {
        self.schedule = schedule;
    }

    pub fn mark_ready(&mut self) {
        self.api_state = ApiState::Ready;
    }

    pub fn maps(&self) -> &MapCatalog {
        &self.maps
    }

    pub fn tasks(&self) -> &TaskCatalog {
        &self.tasks
    }

    pub fn mow_config(&self) -> &MowConfig {
        &self.mow
    }

    pub fn schedule(&self) -> &ScheduleConfig {
        &self.schedule
    }

    pub fn robot_status(&self) -> &RobotStatus {
        &self.robot
    }

    pub fn signals(&self) -> &Arc<CommandSignal> {
        &self.signals
    }

    pub fn calculating(&self) -> CalculationFlag {
        self.maps.calculating().clone()
    }
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
