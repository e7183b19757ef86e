//! Observer tracking capability

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec3;

/// Source of the current observer position. Returns `None` until an
/// observer exists.
pub trait ObserverProvider {
    fn observer_position(&self) -> Option<Vec3>;
}

impl<F> ObserverProvider for F
where
    F: Fn() -> Option<Vec3>,
{
    fn observer_position(&self) -> Option<Vec3> {
        self()
    }
}

/// Observer slot shared between whoever moves the observer and the clients
/// that read it. Single-threaded.
#[derive(Debug, Clone, Default)]
pub struct SharedObserver {
    position: Rc<Cell<Option<Vec3>>>,
}

impl SharedObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(position: Vec3) -> Self {
        let observer = Self::new();
        observer.set(position);
        observer
    }

    pub fn set(&self, position: Vec3) {
        self.position.set(Some(position));
    }

    pub fn clear(&self) {
        self.position.set(None);
    }
}

impl ObserverProvider for SharedObserver {
    fn observer_position(&self) -> Option<Vec3> {
        self.position.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_observer_clones_see_updates() {
        let observer = SharedObserver::new();
        let reader = observer.clone();
        assert_eq!(reader.observer_position(), None);

        observer.set(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(reader.observer_position(), Some(Vec3::new(1.0, 2.0, 3.0)));

        observer.clear();
        assert_eq!(reader.observer_position(), None);
    }

    #[test]
    fn test_closure_provider() {
        let provider = || Some(Vec3::ZERO);
        assert_eq!(provider.observer_position(), Some(Vec3::ZERO));
    }
}
