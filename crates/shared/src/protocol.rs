use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{MowPattern, ObjectKind, Point, SignalFlag},
    error::{ApiError, Rejection},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApiState {
    #[default]
    Boot,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotView {
    pub status: String,
    pub battery: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapsView {
    pub loaded: Option<String>,
    pub available: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TasksView {
    pub selected: Vec<String>,
    pub loaded: Vec<String>,
    pub available: Vec<String>,
}

/// Mow parameters under their wire names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MowParametersView {
    pub pattern: MowPattern,
    pub width: f64,
    pub angle: u16,
    pub distancetoborder: u8,
    pub mowarea: bool,
    pub mowborder: u8,
    pub mowexclusion: bool,
    pub mowborderccw: bool,
}

/// The last envelope the dispatcher identified, with whatever it accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastCommand {
    pub object: ObjectKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub api: ApiState,
    pub robot: RobotView,
    pub maps: MapsView,
    pub tasks: TasksView,
    #[serde(rename = "mow parameters")]
    pub mow_parameters: MowParametersView,
    pub calculating: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_command: Option<LastCommand>,
}

/// Each domain view rendered to its own JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonPayloads {
    pub robot: String,
    pub maps: String,
    pub tasks: String,
    pub mow_parameters: String,
}

impl StateSnapshot {
    pub fn to_json_payloads(&self) -> serde_json::Result<JsonPayloads> {
        Ok(JsonPayloads {
            robot: serde_json::to_string(&self.robot)?,
            maps: serde_json::to_string(&self.maps)?,
            tasks: serde_json::to_string(&self.tasks)?,
            mow_parameters: serde_json::to_string(&self.mow_parameters)?,
        })
    }
}

/// What one dispatch did: accepted changes, raised flags, and rejections.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DispatchReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<ObjectKind>,
    #[serde(default)]
    pub applied: Vec<String>,
    #[serde(default)]
    pub signals: Vec<SignalFlag>,
    #[serde(default)]
    pub rejections: Vec<Rejection>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.rejections.is_empty()
    }

    pub fn record(&mut self, change: impl Into<String>) {
        self.applied.push(change.into());
    }

    pub fn reject(&mut self, rejection: Rejection) {
        self.rejections.push(rejection);
    }

    pub fn raised(&mut self, flag: SignalFlag) {
        if !self.signals.contains(&flag) {
            self.signals.push(flag);
        }
    }
}

/// Telemetry written by the robot feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotTelemetry {
    pub status: String,
    pub battery: f64,
    #[serde(default)]
    pub position: Point,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SignalsTaken {
    pub flags: Vec<SignalFlag>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ControlEvent {
    StateUpdated { snapshot: Box<StateSnapshot> },
    SignalsRaised { flags: Vec<SignalFlag> },
    CommandRejected { rejections: Vec<Rejection> },
    Error(ApiError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::RejectionKind, mow::MowConfig};

    fn snapshot() -> StateSnapshot {
        StateSnapshot {
            api: ApiState::Ready,
            robot: RobotView {
                status: "docked".into(),
                battery: 87.5,
            },
            maps: MapsView {
                loaded: Some("garden".into()),
                available: vec!["garden".into(), "yard".into()],
            },
            tasks: TasksView::default(),
            mow_parameters: MowParametersView::from(&MowConfig::default()),
            calculating: false,
            last_command: None,
        }
    }

    #[test]
    fn mow_parameters_use_wire_field_names() {
        let value = serde_json::to_value(&snapshot()).expect("json");
        let params = &value["mow parameters"];
        for key in [
            "pattern",
            "width",
            "angle",
            "distancetoborder",
            "mowarea",
            "mowborder",
            "mowexclusion",
            "mowborderccw",
        ] {
            assert!(params.get(key).is_some(), "missing {key}");
        }
        assert_eq!(params["pattern"], "lines");
    }

    #[test]
    fn json_payloads_render_each_view() {
        let payloads = snapshot().to_json_payloads().expect("payloads");
        assert_eq!(payloads.robot, r#"{"status":"docked","battery":87.5}"#);
        assert_eq!(payloads.maps, r#"{"loaded":"garden","available":["garden","yard"]}"#);
        assert_eq!(payloads.tasks, r#"{"selected":[],"loaded":[],"available":[]}"#);
    }

    #[test]
    fn report_deduplicates_signals() {
        let mut report = DispatchReport::default();
        report.raised(SignalFlag::Mow);
        report.raised(SignalFlag::Mow);
        report.reject(Rejection::new(RejectionKind::InvalidField, "width"));
        assert_eq!(report.signals, vec![SignalFlag::Mow]);
        assert!(!report.is_clean());
    }

    #[test]
    fn control_events_are_tagged() {
        let event = ControlEvent::SignalsRaised {
            flags: vec![SignalFlag::Dock],
        };
        let value = serde_json::to_value(&event).expect("json");
        assert_eq!(value["type"], "signals_raised");
        assert_eq!(value["payload"]["flags"][0], "dock");
    }
}
