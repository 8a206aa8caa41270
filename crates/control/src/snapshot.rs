use shared::protocol::{MapsView, MowParametersView, StateSnapshot, TasksView};

use crate::Orchestrator;

impl Orchestrator {
    /// Read-only projection of the current state for presentation.
    ///
    /// Route state is only ever replaced after a computation finishes, so a
    /// snapshot taken mid-computation shows the last committed route.
    pub fn snapshot(&self) -> StateSnapshot {
        let loaded_map = self.maps.loaded_name();
        StateSnapshot {
            api: self.api_state,
            robot: self.robot.view(),
            maps: MapsView {
                loaded: loaded_map.map(str::to_string),
                available: self.maps.names(),
            },
            tasks: TasksView {
                selected: self.tasks.selected_names(),
                loaded: self.tasks.loaded().to_vec(),
                available: self.tasks.available_for(loaded_map),
            },
            mow_parameters: MowParametersView::from(&self.mow),
            calculating: self.maps.calculating().is_set(),
            last_command: self.last_command.clone(),
        }
    }
}
