//! Field-set validation for `mow parameters` messages.
//!
//! Unlike the command/value objects, each field here stands alone: a field
//! that fails coercion or its range check is reported and skipped while the
//! remaining fields still commit.

use serde_json::{Map, Value};
use shared::{
    domain::{AllowList, MowPattern, ObjectKind},
    error::{Rejection, RejectionKind},
    mow::MowConfig,
    protocol::DispatchReport,
};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    #[error("expected {expected}, got {found}")]
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
    #[error("{0:?} is not a number")]
    NotNumeric(String),
    #[error("{0} is not a finite number")]
    NotFinite(f64),
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// JSON numbers and numeric strings.
pub fn coerce_float(value: &Value) -> Result<f64, CoercionError> {
    match value {
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| CoercionError::NotNumeric(number.to_string())),
        Value::String(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| CoercionError::NotNumeric(raw.clone())),
        other => Err(CoercionError::WrongType {
            expected: "number",
            found: type_name(other),
        }),
    }
}

/// JSON integers, JSON floats (truncated), and strings holding an integer.
pub fn coerce_int(value: &Value) -> Result<i64, CoercionError> {
    match value {
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                return Ok(int);
            }
            let float = number
                .as_f64()
                .ok_or_else(|| CoercionError::NotNumeric(number.to_string()))?;
            truncated(float)
        }
        Value::String(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| CoercionError::NotNumeric(raw.clone())),
        other => Err(CoercionError::WrongType {
            expected: "integer",
            found: type_name(other),
        }),
    }
}

/// Fractions truncate toward zero; the range check runs on the result.
fn truncated(float: f64) -> Result<i64, CoercionError> {
    if !float.is_finite() {
        return Err(CoercionError::NotFinite(float));
    }
    // Saturates outside the i64 range, which no field accepts anyway.
    Ok(float.trunc() as i64)
}

/// JSON booleans only; strings such as `"no"` are not guessed at.
pub fn coerce_bool(value: &Value) -> Result<bool, CoercionError> {
    value.as_bool().ok_or(CoercionError::WrongType {
        expected: "boolean",
        found: type_name(value),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MowField {
    Pattern,
    Width,
    Angle,
    DistanceToBorder,
    MowArea,
    BorderPasses,
    MowExclusion,
    MowBorderCcw,
}

impl MowField {
    /// Processing order for a message.
    pub const ALL: [MowField; 8] = [
        MowField::Pattern,
        MowField::Width,
        MowField::Angle,
        MowField::DistanceToBorder,
        MowField::MowArea,
        MowField::BorderPasses,
        MowField::MowExclusion,
        MowField::MowBorderCcw,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            MowField::Pattern => "pattern",
            MowField::Width => "width",
            MowField::Angle => "angle",
            MowField::DistanceToBorder => "distancetoborder",
            MowField::MowArea => "mowarea",
            MowField::BorderPasses => "mowborder",
            MowField::MowExclusion => "mowexclusion",
            MowField::MowBorderCcw => "mowborderccw",
        }
    }

    /// Coerces `raw` and writes it into `config`. Returns the committed value.
    fn apply(self, config: &mut MowConfig, raw: &Value) -> Result<String, Rejection> {
        let field = self.wire_name();
        let invalid = |message: String| {
            Rejection::new(RejectionKind::InvalidField, message)
                .on(ObjectKind::MowParameters)
                .for_field(field)
        };
        let coerced = |err: CoercionError| {
            debug!(field, %err, "mow parameter coercion failed");
            invalid(format!("{field} value is invalid: {err}"))
        };

        match self {
            MowField::Pattern => {
                let pattern = raw.as_str().and_then(MowPattern::parse).ok_or_else(|| {
                    invalid(format!("no valid value for {field} found")).allowing(MowPattern::allowed())
                })?;
                config.set_pattern(pattern);
                Ok(pattern.to_string())
            }
            MowField::Width => {
                let width = coerce_float(raw).map_err(coerced)?;
                config.set_width(width).map_err(|err| invalid(err.to_string()))?;
                Ok(width.to_string())
            }
            MowField::Angle => {
                let angle = coerce_int(raw).map_err(coerced)?;
                config.set_angle(angle).map_err(|err| invalid(err.to_string()))?;
                Ok(angle.to_string())
            }
            MowField::DistanceToBorder => {
                let distance = coerce_int(raw).map_err(coerced)?;
                config
                    .set_distance_to_border(distance)
                    .map_err(|err| invalid(err.to_string()))?;
                Ok(distance.to_string())
            }
            MowField::BorderPasses => {
                let passes = coerce_int(raw).map_err(coerced)?;
                config
                    .set_border_passes(passes)
                    .map_err(|err| invalid(err.to_string()))?;
                Ok(passes.to_string())
            }
            MowField::MowArea => {
                let flag = coerce_bool(raw).map_err(coerced)?;
                config.set_mow_area(flag);
                Ok(flag.to_string())
            }
            MowField::MowExclusion => {
                let flag = coerce_bool(raw).map_err(coerced)?;
                config.set_mow_exclusion(flag);
                Ok(flag.to_string())
            }
            MowField::MowBorderCcw => {
                let flag = coerce_bool(raw).map_err(coerced)?;
                config.set_mow_border_ccw(flag);
                Ok(flag.to_string())
            }
        }
    }
}

/// Validates and commits every recognised field of `fields` independently.
/// Fields absent from the message keep their prior value.
pub fn apply_mow_parameters(
    config: &mut MowConfig,
    fields: &Map<String, Value>,
    report: &mut DispatchReport,
) {
    for field in MowField::ALL {
        let Some(raw) = fields.get(field.wire_name()) else {
            continue;
        };
        match field.apply(config, raw) {
            Ok(committed) => {
                info!(field = field.wire_name(), value = %committed, "mow parameter changed");
                report.record(format!("{}={committed}", field.wire_name()));
            }
            Err(rejection) => {
                info!(field = field.wire_name(), reason = %rejection.message, "mow parameter rejected");
                report.reject(rejection);
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/fields_tests.rs"]
mod tests;
