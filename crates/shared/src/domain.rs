use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mow::MowConfig;

/// A closed set of wire words accepted for one position of a command message.
pub trait AllowList: Sized + Copy + 'static {
    const ALLOWED: &'static [&'static str];

    fn parse(raw: &str) -> Option<Self>;

    fn as_str(self) -> &'static str;

    fn allowed() -> Vec<String> {
        Self::ALLOWED.iter().map(|word| (*word).to_string()).collect()
    }
}

macro_rules! allow_list_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl AllowList for $name {
            const ALLOWED: &'static [&'static str] = &[$($wire),+];

            fn parse(raw: &str) -> Option<Self> {
                match raw {
                    $($wire => Some(Self::$variant),)+
                    _ => None,
                }
            }

            fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

allow_list_enum!(
    /// Top-level object keys of a command envelope.
    ObjectKind {
        Tasks => "tasks",
        Maps => "maps",
        Robot => "robot",
        MowParameters => "mow parameters",
    }
);

allow_list_enum!(TaskCommand {
    Select => "select",
    Load => "load",
});

allow_list_enum!(MapCommand {
    Select => "select",
    Load => "load",
});

allow_list_enum!(RobotCommand {
    Mow => "mow",
    Stop => "stop",
    Dock => "dock",
});

allow_list_enum!(
    /// What a `robot`/`mow` command should cover.
    MowTarget {
        Resume => "resume",
        Task => "task",
        All => "all",
        Selection => "selection",
    }
);

allow_list_enum!(MowPattern {
    Lines => "lines",
    Squares => "squares",
    Rings => "rings",
});

allow_list_enum!(
    /// Edge flags consumed by the execution layer.
    SignalFlag {
        Mow => "mow",
        Stop => "stop",
        Dock => "dock",
        Resume => "resume",
        MapChanged => "map_changed",
    }
);

impl SignalFlag {
    pub const ALL: [SignalFlag; 5] = [
        SignalFlag::Mow,
        SignalFlag::Stop,
        SignalFlag::Dock,
        SignalFlag::Resume,
        SignalFlag::MapChanged,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionKind {
    #[default]
    Preview,
    Way,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Ring of vertices; the closing edge back to the first vertex is implicit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon(pub Vec<Point>);

impl Polygon {
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<(f64, f64)>> for Polygon {
    fn from(points: Vec<(f64, f64)>) -> Self {
        Self(points.into_iter().map(|(x, y)| Point::new(x, y)).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEntry {
    pub name: String,
    pub perimeter: Polygon,
}

/// One ordered unit of a task. `name` is the name of the task it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTask {
    #[serde(default)]
    pub name: String,
    pub position: u32,
    pub area: Polygon,
    #[serde(default)]
    pub parameters: MowConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEntry {
    pub name: String,
    #[serde(rename = "map name")]
    pub map_name: String,
    pub subtasks: Vec<SubTask>,
}

impl TaskEntry {
    /// Sub-tasks sorted by position, each stamped with this task's name.
    pub fn ordered_subtasks(&self) -> Vec<SubTask> {
        let mut subtasks = self.subtasks.clone();
        subtasks.sort_by_key(|subtask| subtask.position);
        for subtask in &mut subtasks {
            subtask.name.clone_from(&self.name);
        }
        subtasks
    }
}
