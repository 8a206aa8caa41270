use std::sync::{Arc, PoisonError, RwLock};

use shared::{
    domain::Point,
    protocol::{RobotTelemetry, RobotView},
};

const UNKNOWN_STATUS: &str = "unknown";

/// Last-known robot telemetry. Written by the telemetry feed, read by the core.
#[derive(Debug, Clone)]
pub struct RobotStatus {
    inner: Arc<RwLock<RobotTelemetry>>,
}

impl Default for RobotStatus {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(RobotTelemetry {
                status: UNKNOWN_STATUS.to_string(),
                battery: 0.0,
                position: Point::default(),
            })),
        }
    }
}

impl RobotStatus {
    /// Battery state of charge is clamped to `[0, 100]`.
    pub fn update(&self, mut telemetry: RobotTelemetry) {
        telemetry.battery = if telemetry.battery.is_finite() {
            telemetry.battery.clamp(0.0, 100.0)
        } else {
            0.0
        };
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = telemetry;
    }

    pub fn current(&self) -> RobotTelemetry {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn position(&self) -> Point {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .position
    }

    pub fn view(&self) -> RobotView {
        let telemetry = self.current();
        RobotView {
            status: telemetry.status,
            battery: telemetry.battery,
        }
    }
}
