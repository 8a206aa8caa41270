use shared::domain::{MapEntry, MotionKind, Point, Polygon, SubTask, TaskEntry};

use crate::calculation::CalculationFlag;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Route {
    pub waypoints: Vec<Point>,
    pub kind: MotionKind,
}

impl Route {
    pub fn preview(waypoints: Vec<Point>) -> Self {
        Self {
            waypoints,
            kind: MotionKind::Preview,
        }
    }
}

/// The map currently loaded for mowing and its route state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadedMap {
    pub name: Option<String>,
    pub perimeter: Polygon,
    pub selected_area: Polygon,
    pub route: Option<Route>,
    pub route_preview: Option<Route>,
    pub area_to_mow: f64,
    pub task_progress: u32,
    pub total_tasks: u32,
}

impl LoadedMap {
    fn from_entry(entry: &MapEntry) -> Self {
        Self {
            name: Some(entry.name.clone()),
            perimeter: entry.perimeter.clone(),
            selected_area: entry.perimeter.clone(),
            ..Self::default()
        }
    }

    /// Commits the preview as the route to drive.
    pub fn promote_preview(&mut self) {
        if let Some(preview) = &self.route_preview {
            self.route = Some(Route {
                waypoints: preview.waypoints.clone(),
                kind: MotionKind::Way,
            });
        }
    }
}

#[derive(Debug, Default)]
pub struct MapCatalog {
    saved: Vec<MapEntry>,
    current: LoadedMap,
    calculating: CalculationFlag,
}

impl MapCatalog {
    /// Stores a map, replacing any saved map with the same name.
    pub fn save(&mut self, entry: MapEntry) {
        match self.saved.iter_mut().find(|saved| saved.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.saved.push(entry),
        }
    }

    pub fn find(&self, name: &str) -> Option<&MapEntry> {
        self.saved.iter().find(|entry| entry.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.saved.iter().map(|entry| entry.name.clone()).collect()
    }

    pub fn current(&self) -> &LoadedMap {
        &self.current
    }

    pub(crate) fn current_mut(&mut self) -> &mut LoadedMap {
        &mut self.current
    }

    pub fn loaded_name(&self) -> Option<&str> {
        self.current.name.as_deref()
    }

    /// Replaces the loaded map with a fresh one built from `entry`.
    pub(crate) fn load(&mut self, entry: &MapEntry) {
        self.current = LoadedMap::from_entry(entry);
    }

    pub fn calculating(&self) -> &CalculationFlag {
        &self.calculating
    }
}

#[derive(Debug, Default)]
pub struct TaskCatalog {
    saved: Vec<TaskEntry>,
    current: Vec<SubTask>,
    loaded: Vec<String>,
}

impl TaskCatalog {
    /// Stores a task, replacing a saved task with the same name on the same map.
    pub fn save(&mut self, entry: TaskEntry) {
        match self
            .saved
            .iter_mut()
            .find(|saved| saved.name == entry.name && saved.map_name == entry.map_name)
        {
            Some(existing) => *existing = entry,
            None => self.saved.push(entry),
        }
    }

    /// Task names saved for `map_name`, first occurrence order, no duplicates.
    pub fn available_for(&self, map_name: Option<&str>) -> Vec<String> {
        let Some(map_name) = map_name else {
            return Vec::new();
        };
        let mut names: Vec<String> = Vec::new();
        for entry in self.saved.iter().filter(|entry| entry.map_name == map_name) {
            if !names.contains(&entry.name) {
                names.push(entry.name.clone());
            }
        }
        names
    }

    pub fn find(&self, map_name: &str, name: &str) -> Option<&TaskEntry> {
        self.saved
            .iter()
            .find(|entry| entry.map_name == map_name && entry.name == name)
    }

    pub fn current(&self) -> &[SubTask] {
        &self.current
    }

    pub fn loaded(&self) -> &[String] {
        &self.loaded
    }

    /// Distinct task names in the active selection, in selection order.
    pub fn selected_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for subtask in &self.current {
            if !names.contains(&subtask.name) {
                names.push(subtask.name.clone());
            }
        }
        names
    }

    pub(crate) fn select(&mut self, entry: &TaskEntry) {
        self.current = entry.ordered_subtasks();
    }

    pub(crate) fn load(&mut self, entry: &TaskEntry) {
        self.select(entry);
        self.loaded = vec![entry.name.clone()];
    }

    pub(crate) fn reset(&mut self) {
        self.current.clear();
        self.loaded.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::mow::MowConfig;

    fn task(name: &str, map_name: &str, positions: &[u32]) -> TaskEntry {
        TaskEntry {
            name: name.into(),
            map_name: map_name.into(),
            subtasks: positions
                .iter()
                .map(|position| SubTask {
                    name: String::new(),
                    position: *position,
                    area: Polygon::default(),
                    parameters: MowConfig::default(),
                })
                .collect(),
        }
    }

    #[test]
    fn saving_a_map_twice_replaces_it() {
        let mut maps = MapCatalog::default();
        maps.save(MapEntry {
            name: "garden".into(),
            perimeter: Polygon::default(),
        });
        maps.save(MapEntry {
            name: "garden".into(),
            perimeter: Polygon::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]),
        });
        assert_eq!(maps.names(), vec!["garden".to_string()]);
        assert_eq!(maps.find("garden").map(|entry| entry.perimeter.len()), Some(3));
    }

    #[test]
    fn loading_a_map_starts_from_a_clean_slate() {
        let mut maps = MapCatalog::default();
        maps.current_mut().task_progress = 4;
        maps.current_mut().route = Some(Route::default());
        let entry = MapEntry {
            name: "yard".into(),
            perimeter: Polygon::from(vec![(0.0, 0.0), (2.0, 0.0), (2.0, 2.0)]),
        };
        maps.load(&entry);
        let current = maps.current();
        assert_eq!(current.name.as_deref(), Some("yard"));
        assert_eq!(current.selected_area, entry.perimeter);
        assert_eq!(current.task_progress, 0);
        assert!(current.route.is_none());
    }

    #[test]
    fn available_tasks_are_scoped_to_the_map() {
        let mut tasks = TaskCatalog::default();
        tasks.save(task("row1", "garden", &[0]));
        tasks.save(task("row2", "garden", &[0]));
        tasks.save(task("row1", "yard", &[0]));
        assert_eq!(tasks.available_for(Some("garden")), vec!["row1", "row2"]);
        assert_eq!(tasks.available_for(Some("yard")), vec!["row1"]);
        assert!(tasks.available_for(None).is_empty());
        assert!(tasks.find("yard", "row2").is_none());
    }

    #[test]
    fn load_selects_and_confirms_then_reset_clears() {
        let mut tasks = TaskCatalog::default();
        let entry = task("front", "garden", &[1, 0]);
        tasks.load(&entry);
        assert_eq!(tasks.current().len(), 2);
        assert_eq!(tasks.current()[0].position, 0);
        assert_eq!(tasks.selected_names(), vec!["front"]);
        assert_eq!(tasks.loaded(), ["front".to_string()]);
        tasks.reset();
        assert!(tasks.current().is_empty());
        assert!(tasks.loaded().is_empty());
    }

    #[test]
    fn promote_preview_tags_route_as_way() {
        let mut map = LoadedMap {
            route_preview: Some(Route::preview(vec![Point::new(1.0, 1.0)])),
            ..LoadedMap::default()
        };
        map.promote_preview();
        let route = map.route.expect("route");
        assert_eq!(route.kind, MotionKind::Way);
        assert_eq!(route.waypoints, vec![Point::new(1.0, 1.0)]);
    }
}
