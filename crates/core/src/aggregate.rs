//! Aggregate traits for the locally-held working copies of backend records.

/// Aggregate root marker + minimal interface.
///
/// The backend owns every aggregate; the client only ever holds a working copy
/// while editing. The trait stays small so modules decide how they model state
/// transitions without pulling in IO.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the aggregate identifier.
    fn id(&self) -> Self::Id;

    /// Number of confirmed transitions applied to this working copy.
    fn version(&self) -> u64;
}

/// Aggregate execution semantics (pure, deterministic).
///
/// - **Decision logic**: `handle(&self, cmd)` returns events or rejects.
/// - **State mutation**: `apply(&mut self, event)` evolves state.
///
/// `handle` is the client-side precondition gate consulted before any remote
/// call is issued; `apply` records a transition once the backend confirmed it.
pub trait Aggregate: AggregateRoot {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    /// Evolve in-memory state from a single event.
    fn apply(&mut self, event: &Self::Event);

    /// Decide which events a command produces given the current state.
    ///
    /// This must not mutate state.
    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;
}
