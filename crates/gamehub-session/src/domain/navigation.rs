//! Navigation safety while unsaved progress exists.
//!
//! Both guards share one predicate: a session is guarded while it is
//! `Playing` with a score above zero.

use super::state::SessionState;

/// Message placed on a prevented unload.
pub const UNSAVED_PROGRESS_MESSAGE: &str =
    "You have unsaved progress. Are you sure you want to leave?";

/// Whether leaving now would lose an unsaved score.
#[must_use]
pub fn guards_navigation(state: SessionState, score: u32) -> bool {
    state == SessionState::Playing && score > 0
}

/// A page unload about to happen, as the host delivers it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnloadEvent {
    default_prevented: bool,
    return_value: String,
}

impl UnloadEvent {
    /// A pending unload nobody has objected to yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the host to confirm before leaving.
    pub fn prevent_default(&mut self, message: &str) {
        self.default_prevented = true;
        message.clone_into(&mut self.return_value);
    }

    /// Whether a guard objected.
    #[must_use]
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// The confirmation text, empty when not prevented.
    #[must_use]
    pub fn return_value(&self) -> &str {
        &self.return_value
    }
}

/// Outcome of a back-navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackNavigation {
    /// Let the navigation proceed.
    Allow,
    /// Navigation was cancelled; the host must re-push `restore_route` and
    /// the exit prompt is shown instead.
    Intercepted {
        /// The route to put back on the history stack.
        restore_route: String,
    },
}

/// Evaluates unload and back-navigation attempts against a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct NavigationGuard;

impl NavigationGuard {
    /// Prevents `event` when progress would be lost. Returns whether it did.
    pub fn on_before_unload(state: SessionState, score: u32, event: &mut UnloadEvent) -> bool {
        if !guards_navigation(state, score) {
            return false;
        }
        event.prevent_default(UNSAVED_PROGRESS_MESSAGE);
        true
    }

    /// Decides a back-navigation away from `current_route`.
    #[must_use]
    pub fn on_back_navigation(state: SessionState, score: u32, current_route: &str) -> BackNavigation {
        if guards_navigation(state, score) {
            BackNavigation::Intercepted {
                restore_route: current_route.to_owned(),
            }
        } else {
            BackNavigation::Allow
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_requires_playing_and_positive_score() {
        assert!(guards_navigation(SessionState::Playing, 1));
        assert!(!guards_navigation(SessionState::Playing, 0));
        assert!(!guards_navigation(SessionState::ExitRequested, 5));
        assert!(!guards_navigation(SessionState::Saving, 5));
        assert!(!guards_navigation(SessionState::Terminated, 5));
        assert!(!guards_navigation(SessionState::Idle, 0));
    }

    #[test]
    fn test_unload_prevented_with_unsaved_score() {
        let mut event = UnloadEvent::new();

        let prevented = NavigationGuard::on_before_unload(SessionState::Playing, 5, &mut event);

        assert!(prevented);
        assert!(event.is_default_prevented());
        assert_eq!(event.return_value(), UNSAVED_PROGRESS_MESSAGE);
    }

    #[test]
    fn test_unload_not_prevented_at_zero_score() {
        let mut event = UnloadEvent::new();

        let prevented = NavigationGuard::on_before_unload(SessionState::Playing, 0, &mut event);

        assert!(!prevented);
        assert!(!event.is_default_prevented());
        assert_eq!(event.return_value(), "");
    }

    #[test]
    fn test_back_navigation_intercepted_restores_route() {
        let decision = NavigationGuard::on_back_navigation(SessionState::Playing, 3, "/play/g1");

        assert_eq!(
            decision,
            BackNavigation::Intercepted {
                restore_route: "/play/g1".into()
            }
        );
    }

    #[test]
    fn test_back_navigation_allowed_once_exit_requested() {
        let decision =
            NavigationGuard::on_back_navigation(SessionState::ExitRequested, 3, "/play/g1");

        assert_eq!(decision, BackNavigation::Allow);
    }
}
