/// Lifecycle states of the ephemeral instance.
///
/// Transitions are strictly forward:
/// `Uninitialized -> Initialized -> Running -> Stopped`, with `Destroyed`
/// reachable only from `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterState {
    Uninitialized,
    Initialized,
    Running,
    Stopped,
    Destroyed,
}

impl ClusterState {
    /// Whether `next` is a legal transition out of the current state.
    pub fn can_transition_to(
        self,
        next: ClusterState,
    ) -> bool {
        use ClusterState::*;

        matches!(
            (self, next),
            (Uninitialized, Initialized) | (Initialized, Running) | (Running, Stopped) | (Stopped, Destroyed)
        )
    }
}
