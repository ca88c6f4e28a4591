// # Runway State Store
//
// In-memory map of runway code → current activity state.
//
// ## Ownership
//
// The store has a single owner, the `StateWatcher`, which is the only code
// that mutates it. External readers never touch the map: they receive
// `RunwayStatus` copies through the watcher's status channel, so there is no
// lock between the watcher and anything that reports status.
//
// ## Lifecycle
//
// Created once from the `ResourceRegistry` with every runway inactive, and
// lives for the lifetime of the watcher.

use crate::resource::ResourceRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Which way a runway is used while active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Neutral default, also used while inactive
    #[default]
    Takeoff,
    Landing,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Takeoff => f.write_str("takeoff"),
            Direction::Landing => f.write_str("landing"),
        }
    }
}

/// Current state of one runway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunwayState {
    pub code: String,
    pub active: bool,
    /// Only meaningful while `active` is true
    pub direction: Direction,
}

impl RunwayState {
    /// Inactive state with the neutral direction
    pub fn inactive(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            active: false,
            direction: Direction::default(),
        }
    }

    /// Direction if active, `None` otherwise
    pub fn active_direction(&self) -> Option<Direction> {
        self.active.then_some(self.direction)
    }
}

/// Read-only view of one runway for status reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunwayStatus {
    pub code: String,
    pub name: String,
    pub active: bool,
    pub direction: Option<Direction>,
}

/// Map of runway code → state, owned by the watcher
#[derive(Debug, Clone)]
pub struct StateStore {
    states: HashMap<String, RunwayState>,
}

impl StateStore {
    /// One inactive entry per registered runway
    pub fn initialize(registry: &ResourceRegistry) -> Self {
        let states = registry
            .iter()
            .map(|resource| (resource.code.clone(), RunwayState::inactive(&resource.code)))
            .collect();

        Self { states }
    }

    pub fn get(&self, code: &str) -> Option<&RunwayState> {
        self.states.get(code)
    }

    pub fn is_active(&self, code: &str) -> bool {
        self.states.get(code).is_some_and(|state| state.active)
    }

    /// Replace the state of an already-known runway
    ///
    /// Unknown codes are ignored; the key set is fixed at initialization.
    pub(crate) fn set(&mut self, state: RunwayState) {
        if let Some(slot) = self.states.get_mut(&state.code) {
            *slot = state;
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Copy the current state out, in registry order
    pub fn statuses(&self, registry: &ResourceRegistry) -> Vec<RunwayStatus> {
        registry
            .iter()
            .map(|resource| {
                let state = self.states.get(&resource.code);
                RunwayStatus {
                    code: resource.code.clone(),
                    name: resource.name.clone(),
                    active: state.is_some_and(|s| s.active),
                    direction: state.and_then(RunwayState::active_direction),
                }
            })
            .collect()
    }
}

/// Render statuses as an aligned table
///
/// ```text
/// Polderbaan (18R)   ACTIVE    Landing
/// Kaagbaan (06)      INACTIVE
/// ```
pub fn render_status_table(statuses: &[RunwayStatus]) -> String {
    let labels: Vec<String> = statuses
        .iter()
        .map(|s| format!("{} ({})", s.name, s.code))
        .collect();
    let width = labels.iter().map(String::len).max().unwrap_or(0);

    let mut out = String::new();
    for (label, status) in labels.iter().zip(statuses) {
        let line = match status.direction {
            Some(Direction::Landing) if status.active => {
                format!("{:<width$}   {:<8}  Landing", label, "ACTIVE")
            }
            Some(Direction::Takeoff) if status.active => {
                format!("{:<width$}   {:<8}  Takeoff", label, "ACTIVE")
            }
            _ => format!("{:<width$}   INACTIVE", label),
        };
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
