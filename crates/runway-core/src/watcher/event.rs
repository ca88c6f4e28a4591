//! Change events emitted by the watcher

use crate::resource::Resource;
use crate::state::Direction;
use serde::{Deserialize, Serialize};

/// A detected transition in a runway's active state
///
/// Created by the watcher the moment a diff is found and handed to the
/// dispatcher by value; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub code: String,
    pub name: String,
    pub previous_active: bool,
    pub new_active: bool,
    /// Direction after the transition; neutral when `new_active` is false
    pub direction: Direction,
}

impl ChangeEvent {
    pub fn new(
        resource: &Resource,
        previous_active: bool,
        new_active: bool,
        direction: Direction,
    ) -> Self {
        Self {
            code: resource.code.clone(),
            name: resource.name.clone(),
            previous_active,
            new_active,
            direction,
        }
    }

    /// Runway became active
    pub fn activated(resource: &Resource, direction: Direction) -> Self {
        Self::new(resource, false, true, direction)
    }

    /// Runway became inactive
    pub fn deactivated(resource: &Resource) -> Self {
        Self::new(resource, true, false, Direction::default())
    }

    /// `"Polderbaan (18R)"`
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.code)
    }
}
