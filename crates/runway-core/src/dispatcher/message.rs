//! Human-readable notification text

use crate::watcher::ChangeEvent;

/// Render the notification sent to subscribers for one change event
///
/// - `"Polderbaan (18R) is now active for landing"`
/// - `"Polderbaan (18R) is no longer active"`
pub fn render_message(event: &ChangeEvent) -> String {
    if event.new_active {
        format!("{} is now active for {}", event.label(), event.direction)
    } else {
        format!("{} is no longer active", event.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Resource;
    use crate::state::Direction;

    #[test]
    fn test_render_messages() {
        let polderbaan = Resource::new("18R", "Polderbaan");

        assert_eq!(
            render_message(&ChangeEvent::activated(&polderbaan, Direction::Landing)),
            "Polderbaan (18R) is now active for landing"
        );
        assert_eq!(
            render_message(&ChangeEvent::activated(&polderbaan, Direction::Takeoff)),
            "Polderbaan (18R) is now active for takeoff"
        );
        assert_eq!(
            render_message(&ChangeEvent::deactivated(&polderbaan)),
            "Polderbaan (18R) is no longer active"
        );
    }
}
