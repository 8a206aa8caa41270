use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use chrono::Utc;
use route_planner::{geometry, PlannedRoute, RouteBuilder, RouteError};
use serde_json::Value;
use shared::{
    domain::{AllowList, MapCommand, MowTarget, ObjectKind, RobotCommand, SignalFlag, TaskCommand},
    error::{Rejection, RejectionKind},
    mow::MowConfig,
    protocol::{DispatchReport, LastCommand},
};
use tracing::{debug, info, warn};

use crate::{catalog::Route, fields, CalculationGuard, Orchestrator};

type ObjectHandler = fn(&mut Orchestrator, &Value, &mut DispatchReport);

/// Envelope keys in precedence order: the first key present wins.
const OBJECT_HANDLERS: [(ObjectKind, ObjectHandler); 4] = [
    (ObjectKind::Tasks, Orchestrator::check_tasks_command),
    (ObjectKind::Maps, Orchestrator::check_maps_command),
    (ObjectKind::Robot, Orchestrator::check_robot_command),
    (ObjectKind::MowParameters, Orchestrator::check_mow_parameters),
];

impl Orchestrator {
    /// Validates one command envelope and applies whatever part of it is valid.
    ///
    /// Never fails: everything that is rejected is logged and listed in the
    /// returned report, and prior state is kept.
    pub fn dispatch(&mut self, envelope: &Value) -> DispatchReport {
        let mut report = DispatchReport::default();

        let found = envelope.as_object().and_then(|envelope| {
            OBJECT_HANDLERS.iter().find_map(|(object, handler)| {
                envelope
                    .get(object.as_str())
                    .map(|body| (*object, *handler, body))
            })
        });
        let Some((object, handler, body)) = found else {
            info!("No valid object in api message found. Aborting");
            report.reject(
                Rejection::new(RejectionKind::MalformedEnvelope, "no valid object in api message")
                    .allowing(ObjectKind::allowed()),
            );
            return report;
        };

        report.object = Some(object);
        self.last_command = Some(LastCommand {
            object,
            command: None,
            value: None,
            received_at: Utc::now(),
        });
        handler(self, body, &mut report);
        report
    }

    fn note_command(&mut self, command: &str) {
        if let Some(last) = self.last_command.as_mut() {
            last.command = Some(command.to_string());
        }
    }

    fn note_value(&mut self, value: &str) {
        if let Some(last) = self.last_command.as_mut() {
            last.value = Some(value.to_string());
        }
    }

    fn check_tasks_command(&mut self, body: &Value, report: &mut DispatchReport) {
        let Some(command) = validated_command::<TaskCommand>(ObjectKind::Tasks, body, report) else {
            return;
        };
        self.note_command(command.as_str());

        let allowed = self.tasks.available_for(self.maps.loaded_name());
        let Some(name) = value_in(ObjectKind::Tasks, body, allowed, report) else {
            return;
        };
        let Some(entry) = self
            .maps
            .loaded_name()
            .and_then(|map_name| self.tasks.find(map_name, name))
            .cloned()
        else {
            return;
        };
        self.note_value(name);

        match command {
            TaskCommand::Select => {
                self.tasks.select(&entry);
                info!(task = name, "Task selected");
                report.record(format!("tasks/select {name}"));
            }
            TaskCommand::Load => {
                self.tasks.load(&entry);
                info!(task = name, "Task loaded");
                report.record(format!("tasks/load {name}"));
                if self.plan_selected_tasks(report) {
                    self.raise(SignalFlag::MapChanged, report);
                }
            }
        }
    }

    fn check_maps_command(&mut self, body: &Value, report: &mut DispatchReport) {
        let Some(command) = validated_command::<MapCommand>(ObjectKind::Maps, body, report) else {
            return;
        };
        self.note_command(command.as_str());

        let Some(name) = value_in(ObjectKind::Maps, body, self.maps.names(), report) else {
            return;
        };
        self.note_value(name);

        match command {
            // Accepted by the allow-list but has no action yet.
            MapCommand::Select => info!(map = name, "Map select has no action. Nothing changed"),
            MapCommand::Load => self.load_map(name, report),
        }
    }

    fn load_map(&mut self, name: &str, report: &mut DispatchReport) {
        let Some(entry) = self.maps.find(name).cloned() else {
            return;
        };
        self.maps.load(&entry);
        self.tasks.reset();
        self.schedule.reset();
        self.mow = MowConfig::default();
        info!(map = name, "Map loaded, tasks, schedule and mow parameters reset");
        report.record(format!("maps/load {name}"));
        self.raise(SignalFlag::MapChanged, report);
    }

    fn check_robot_command(&mut self, body: &Value, report: &mut DispatchReport) {
        let Some(command) = validated_command::<RobotCommand>(ObjectKind::Robot, body, report) else {
            return;
        };
        self.note_command(command.as_str());

        let Some(value) = body.get("value") else {
            info!(command = %command, "No value in api message found. Aborting");
            let rejection = Rejection::new(RejectionKind::InvalidValue, "no value in api message")
                .on(ObjectKind::Robot);
            report.reject(match command {
                RobotCommand::Mow => rejection.allowing(MowTarget::allowed()),
                RobotCommand::Stop | RobotCommand::Dock => rejection,
            });
            return;
        };

        match command {
            RobotCommand::Stop => {
                self.note_value_of(value);
                self.raise(SignalFlag::Stop, report);
            }
            RobotCommand::Dock => {
                self.note_value_of(value);
                self.raise(SignalFlag::Dock, report);
            }
            RobotCommand::Mow => {
                let Some(target) = value.as_str().and_then(MowTarget::parse) else {
                    info!(allowed = ?MowTarget::ALLOWED, "No valid value in api message found. Aborting");
                    report.reject(
                        Rejection::new(RejectionKind::InvalidValue, "no valid value in api message")
                            .on(ObjectKind::Robot)
                            .allowing(MowTarget::allowed()),
                    );
                    return;
                };
                self.note_value(target.as_str());
                self.perform_mow(target, report);
            }
        }
    }

    fn note_value_of(&mut self, value: &Value) {
        match value {
            Value::String(value) => self.note_value(value),
            other => self.note_value(&other.to_string()),
        }
    }

    fn perform_mow(&mut self, target: MowTarget, report: &mut DispatchReport) {
        match target {
            MowTarget::Resume => self.raise(SignalFlag::Resume, report),
            MowTarget::Task => {
                if self.tasks.current().is_empty() {
                    info!("No selected tasks found");
                    report.reject(
                        Rejection::new(RejectionKind::NoSelection, "no selected tasks")
                            .on(ObjectKind::Robot),
                    );
                    return;
                }
                if self.plan_selected_tasks(report) {
                    self.raise(SignalFlag::Mow, report);
                }
            }
            MowTarget::All => {
                if self.plan_whole_perimeter(report) {
                    self.raise(SignalFlag::Mow, report);
                }
            }
            // Partial-area mowing is reserved; accepted and ignored.
            MowTarget::Selection => info!("Mowing a selection is not available. Nothing changed"),
        }
    }

    fn check_mow_parameters(&mut self, body: &Value, report: &mut DispatchReport) {
        let Some(fields) = body.as_object() else {
            info!("Mow parameters are not a mapping. Aborting");
            report.reject(
                Rejection::new(RejectionKind::MalformedEnvelope, "mow parameters must be a mapping")
                    .on(ObjectKind::MowParameters),
            );
            return;
        };
        fields::apply_mow_parameters(&mut self.mow, fields, report);
    }

    /// Routes the active sub-task selection. Returns whether a new route was committed.
    fn plan_selected_tasks(&mut self, report: &mut DispatchReport) -> bool {
        let Some(_calculating) = self.claim_calculation(report) else {
            return false;
        };
        self.maps.current_mut().task_progress = 0;
        let subtasks = self.tasks.current().to_vec();
        let start = self.robot.position();

        let Some(planned) =
            self.run_route_builder(report, |builder| builder.plan_subtasks(&subtasks, start))
        else {
            return false;
        };

        let total_tasks = self.tasks.selected_names().len();
        let map = self.maps.current_mut();
        map.total_tasks = u32::try_from(total_tasks).unwrap_or(u32::MAX);
        map.area_to_mow = planned.area_estimate.round();
        map.route_preview = Some(Route::preview(planned.waypoints));
        map.promote_preview();
        report.record(format!("route with {total_tasks} task(s) committed"));
        true
    }

    /// Routes the full perimeter of the loaded map. Returns whether a new route was committed.
    fn plan_whole_perimeter(&mut self, report: &mut DispatchReport) -> bool {
        let Some(_calculating) = self.claim_calculation(report) else {
            return false;
        };
        let map = self.maps.current_mut();
        map.selected_area = map.perimeter.clone();
        map.task_progress = 0;
        map.total_tasks = 1;
        let selected = map.selected_area.clone();
        let config = self.mow.clone();
        let start = self.robot.position();

        let Some(planned) =
            self.run_route_builder(report, |builder| builder.plan_area(&selected, &config, start))
        else {
            return false;
        };

        let map = self.maps.current_mut();
        map.area_to_mow = geometry::area(&map.selected_area).round();
        map.route_preview = Some(Route::preview(planned.waypoints));
        map.promote_preview();
        report.record(format!("route over {} m² committed", map.area_to_mow));
        true
    }

    /// Raises `calculating` until the returned guard drops. Must be claimed
    /// before any route bookkeeping is written.
    fn claim_calculation(&self, report: &mut DispatchReport) -> Option<CalculationGuard> {
        let guard = self.maps.calculating().try_begin();
        if guard.is_none() {
            warn!("Route computation already in progress. Aborting");
            report.reject(Rejection::new(
                RejectionKind::Busy,
                "route computation already in progress",
            ));
        }
        guard
    }

    /// Runs the route builder, turning a panic into a route error.
    fn run_route_builder<F>(&self, report: &mut DispatchReport, plan: F) -> Option<PlannedRoute>
    where
        F: FnOnce(&dyn RouteBuilder) -> Result<PlannedRoute, RouteError>,
    {
        let builder = Arc::clone(&self.route_builder);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| plan(builder.as_ref())))
            .unwrap_or_else(|payload| Err(RouteError::Planner(panic_message(payload.as_ref()))));

        match outcome {
            Ok(planned) => {
                debug!(waypoints = planned.waypoints.len(), "Route computed");
                Some(planned)
            }
            Err(err) => {
                warn!(%err, "Route computation failed");
                report.reject(Rejection::new(
                    RejectionKind::RouteFailed,
                    format!("route computation failed: {err}"),
                ));
                None
            }
        }
    }

    fn raise(&self, flag: SignalFlag, report: &mut DispatchReport) {
        if !self.signals.raise(flag) {
            debug!(%flag, "Command signal was already raised");
        }
        info!(%flag, "Command signal raised");
        report.raised(flag);
    }
}

fn validated_command<C: AllowList>(
    object: ObjectKind,
    body: &Value,
    report: &mut DispatchReport,
) -> Option<C> {
    let Some(raw) = body.get("command") else {
        info!(%object, "No command in api message found. Aborting");
        report.reject(
            Rejection::new(RejectionKind::InvalidCommand, "no command in api message")
                .on(object)
                .allowing(C::allowed()),
        );
        return None;
    };
    let command = raw.as_str().and_then(C::parse);
    if command.is_none() {
        info!(%object, allowed = ?C::ALLOWED, "No valid command in api message found. Aborting");
        report.reject(
            Rejection::new(RejectionKind::InvalidCommand, "no valid command in api message")
                .on(object)
                .allowing(C::allowed()),
        );
    }
    command
}

/// The message's `value`, if it names one of `allowed`.
fn value_in<'a>(
    object: ObjectKind,
    body: &'a Value,
    allowed: Vec<String>,
    report: &mut DispatchReport,
) -> Option<&'a str> {
    let value = body
        .get("value")
        .and_then(Value::as_str)
        .filter(|value| allowed.iter().any(|name| name == value));
    if value.is_none() {
        info!(%object, ?allowed, "No valid value in api message found. Aborting");
        report.reject(
            Rejection::new(RejectionKind::InvalidValue, "no valid value in api message")
                .on(object)
                .allowing(allowed),
        );
    }
    value
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "route builder panicked".to_string()
    }
}
