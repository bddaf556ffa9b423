//! Caller identity used for audit stamping.

use crate::model::hive_section::ActorId;

/// Supplies the identity of the caller performing the current operation.
pub trait ActorContext {
    fn current_actor_id(&self) -> ActorId;
}

impl<T: ActorContext + ?Sized> ActorContext for &T {
    fn current_actor_id(&self) -> ActorId {
        (**self).current_actor_id()
    }
}

/// Actor context that always reports the same identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedActor(pub ActorId);

impl ActorContext for FixedActor {
    fn current_actor_id(&self) -> ActorId {
        self.0
    }
}
