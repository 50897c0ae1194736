use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use blitz_engine::MatchConfig;
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;

use crate::{HubError, Room, RoomCode};

/// A room behind its own exclusive lock.
pub type SharedRoom = Arc<tokio::sync::Mutex<Room>>;

/// Live rooms keyed by code.
///
/// The registry lock only guards the code map and is never held across an
/// `.await`; match state is guarded per room, so unrelated rooms never wait
/// on each other.
#[derive(Debug)]
pub struct SessionRegistry {
    config: MatchConfig,
    inner: Mutex<RegistryInner>,
}

#[derive(Debug)]
struct RegistryInner {
    rooms: HashMap<RoomCode, SharedRoom>,
    rng: Pcg32,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(config: MatchConfig) -> Self {
        Self::with_rng(config, Pcg32::from_rng(&mut rand::rng()))
    }

    /// Creates a registry whose room codes and match seeds are reproducible.
    #[must_use]
    pub fn with_seed(config: MatchConfig, seed: u64) -> Self {
        Self::with_rng(config, Pcg32::seed_from_u64(seed))
    }

    fn with_rng(config: MatchConfig, rng: Pcg32) -> Self {
        Self {
            config,
            inner: Mutex::new(RegistryInner {
                rooms: HashMap::new(),
                rng,
            }),
        }
    }

    #[must_use]
    pub const fn config(&self) -> MatchConfig {
        self.config
    }

    fn lock(&self) -> Result<MutexGuard<'_, RegistryInner>, HubError> {
        self.inner.lock().map_err(|_| HubError::LockPoisoned)
    }

    /// Registers a new empty room under a fresh code.
    ///
    /// Codes are drawn until one is not in use by a live room.
    pub fn create(&self) -> Result<(RoomCode, SharedRoom), HubError> {
        let mut inner = self.lock()?;
        let code = loop {
            let code = RoomCode::random(&mut inner.rng);
            if !inner.rooms.contains_key(&code) {
                break code;
            }
            tracing::debug!(room = %code, "room code collision");
        };
        let seed = inner.rng.random();
        let opponent_rng = Pcg32::from_rng(&mut inner.rng);
        let room = Arc::new(tokio::sync::Mutex::new(Room::new(
            code.clone(),
            self.config,
            seed,
            opponent_rng,
        )));
        inner.rooms.insert(code.clone(), Arc::clone(&room));
        tracing::info!(room = %code, rooms = inner.rooms.len(), "room created");
        Ok((code, room))
    }

    pub fn get(&self, code: &RoomCode) -> Result<Option<SharedRoom>, HubError> {
        Ok(self.lock()?.rooms.get(code).cloned())
    }

    /// Evicts a room. Returns `false` if it was already gone.
    pub fn remove(&self, code: &RoomCode) -> Result<bool, HubError> {
        let mut inner = self.lock()?;
        let removed = inner.rooms.remove(code).is_some();
        if removed {
            tracing::info!(room = %code, rooms = inner.rooms.len(), "room removed");
        }
        Ok(removed)
    }

    /// Number of live rooms.
    pub fn len(&self) -> Result<usize, HubError> {
        Ok(self.lock()?.rooms.len())
    }

    pub fn is_empty(&self) -> Result<bool, HubError> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_create_get_remove() {
        let registry = SessionRegistry::with_seed(MatchConfig::default(), 1);
        let (code, room) = registry.create().unwrap();
        assert_eq!(registry.len().unwrap(), 1);

        let found = registry.get(&code).unwrap().unwrap();
        assert!(Arc::ptr_eq(&room, &found));

        assert!(registry.remove(&code).unwrap());
        assert!(!registry.remove(&code).unwrap());
        assert!(registry.get(&code).unwrap().is_none());
        assert!(registry.is_empty().unwrap());
    }

    #[test]
    fn test_codes_are_unique_among_live_rooms() {
        let registry = SessionRegistry::with_seed(MatchConfig::default(), 2);
        let codes: HashSet<_> = (0..500).map(|_| registry.create().unwrap().0).collect();
        assert_eq!(codes.len(), 500);
        assert_eq!(registry.len().unwrap(), 500);
    }

    #[test]
    fn test_seeded_registries_agree() {
        let a = SessionRegistry::with_seed(MatchConfig::default(), 3);
        let b = SessionRegistry::with_seed(MatchConfig::default(), 3);
        for _ in 0..5 {
            assert_eq!(a.create().unwrap().0, b.create().unwrap().0);
        }
    }

    #[test]
    fn test_rooms_use_registry_config() {
        let config = MatchConfig::new(2, 2, 1).unwrap();
        let registry = SessionRegistry::with_seed(config, 4);
        let (_, room) = registry.create().unwrap();
        let room = room.try_lock().unwrap();
        assert_eq!(room.engine().state().max_bases(), 1);
        assert_eq!(room.engine().state().grid().len(), 4);
    }
}
