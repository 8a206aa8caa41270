use shared::{
    domain::{Point, Polygon, SubTask},
    mow::MowConfig,
};
use thiserror::Error;
use tracing::debug;

pub mod geometry;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlannedRoute {
    pub waypoints: Vec<Point>,
    pub area_estimate: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    #[error("perimeter is empty")]
    EmptyPerimeter,
    #[error("polygon with {points} points does not enclose an area")]
    DegeneratePolygon { points: usize },
    #[error("no sub-tasks to plan")]
    NoSubtasks,
    #[error("sub-task {position} of task {task} is not plannable: {source}")]
    Subtask {
        task: String,
        position: u32,
        #[source]
        source: Box<RouteError>,
    },
    #[error("route builder failed: {0}")]
    Planner(String),
}

/// Turns mow geometry into a drivable route.
///
/// Implementations are pure: the same geometry, configuration and start
/// point always yield the same route. They may be slow.
pub trait RouteBuilder: Send + Sync {
    fn plan_area(
        &self,
        perimeter: &Polygon,
        config: &MowConfig,
        start: Point,
    ) -> Result<PlannedRoute, RouteError>;

    /// Plans the sub-tasks in order, each with its own parameters.
    fn plan_subtasks(&self, subtasks: &[SubTask], start: Point)
        -> Result<PlannedRoute, RouteError>;
}

/// Drives border passes around each area.
///
/// Stands in for a coverage planner: it produces only the border rounds
/// (`mowborder` passes in the configured winding), starting from the robot.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundaryRouteBuilder;

impl BoundaryRouteBuilder {
    fn border_passes(perimeter: &Polygon, config: &MowConfig) -> Result<Vec<Point>, RouteError> {
        if perimeter.is_empty() {
            return Err(RouteError::EmptyPerimeter);
        }
        if geometry::area(perimeter) <= f64::EPSILON {
            return Err(RouteError::DegeneratePolygon {
                points: perimeter.len(),
            });
        }
        let ring = geometry::ring(perimeter, config.mow_border_ccw());
        let passes = usize::from(config.border_passes());
        let mut waypoints = Vec::with_capacity(ring.len() * passes);
        for _ in 0..passes {
            waypoints.extend_from_slice(&ring);
        }
        Ok(waypoints)
    }
}

impl RouteBuilder for BoundaryRouteBuilder {
    fn plan_area(
        &self,
        perimeter: &Polygon,
        config: &MowConfig,
        start: Point,
    ) -> Result<PlannedRoute, RouteError> {
        let mut waypoints = vec![start];
        waypoints.extend(Self::border_passes(perimeter, config)?);
        debug!(waypoints = waypoints.len(), pattern = %config.pattern(), "planned area route");
        Ok(PlannedRoute {
            waypoints,
            area_estimate: geometry::area(perimeter),
        })
    }

    fn plan_subtasks(
        &self,
        subtasks: &[SubTask],
        start: Point,
    ) -> Result<PlannedRoute, RouteError> {
        if subtasks.is_empty() {
            return Err(RouteError::NoSubtasks);
        }
        let mut route = PlannedRoute {
            waypoints: vec![start],
            area_estimate: 0.0,
        };
        for subtask in subtasks {
            let passes = Self::border_passes(&subtask.area, &subtask.parameters).map_err(|source| {
                RouteError::Subtask {
                    task: subtask.name.clone(),
                    position: subtask.position,
                    source: Box::new(source),
                }
            })?;
            route.waypoints.extend(passes);
            route.area_estimate += geometry::area(&subtask.area);
        }
        debug!(
            subtasks = subtasks.len(),
            waypoints = route.waypoints.len(),
            "planned sub-task route"
        );
        Ok(route)
    }
}
