use std::{
    future::Future,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::sync::OnceCell;

use crate::{CarrierError, CarrierResult, auth::Credential, errors::Cause};

/// A credential handed out by [`CredentialCache::get_or_refresh`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedCredential {
    pub credential: Credential,
    /// Slot the credential was stored in; pass back to
    /// [`CredentialCache::invalidate_generation`] when upstream rejects it.
    pub generation: u64,
    /// True when the credential came from a refresh that was still running
    /// when this call arrived, whether this call ran it or waited on it.
    pub fresh: bool,
}

/// Failed refreshes keep only their message so every waiter can see it.
type RefreshOutcome = Result<Credential, String>;

struct Flight {
    generation: u64,
    outcome: OnceCell<RefreshOutcome>,
}

impl Flight {
    fn new(generation: u64) -> Self {
        Self {
            generation,
            outcome: OnceCell::new(),
        }
    }
}

/// Holds at most one bearer credential and coalesces concurrent refreshes.
///
/// The current slot ("flight") is swapped out on invalidation or after a
/// failed refresh, so a reader sees either a complete credential or nothing.
/// The lock guarding the slot pointer is never held across an await.
pub struct CredentialCache {
    current: Mutex<Arc<Flight>>,
    next_generation: AtomicU64,
}

impl Default for CredentialCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialCache {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(Arc::new(Flight::new(0))),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Returns the cached credential, or runs `refresh` once on behalf of every
    /// caller waiting on the same empty slot.
    ///
    /// A failed refresh is reported as [`CarrierError::Auth`] to all of those
    /// callers and leaves the cache empty.
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> CarrierResult<CachedCredential>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CarrierResult<Credential>>,
    {
        let flight = self.current_flight();
        let pending = !flight.outcome.initialized();
        let mut minted = false;
        let mut own_failure: Option<CarrierError> = None;

        let outcome = {
            let minted = &mut minted;
            let own_failure = &mut own_failure;
            flight
                .outcome
                .get_or_init(|| async move {
                    *minted = true;
                    match refresh().await {
                        Ok(credential) => Ok(credential),
                        Err(err) => {
                            let err = err.into_auth();
                            let message = err.message().to_owned();
                            *own_failure = Some(err);
                            Err(message)
                        }
                    }
                })
                .await
        };

        match outcome {
            Ok(credential) => {
                if minted {
                    log::debug!("stored credential generation {}", flight.generation);
                }
                Ok(CachedCredential {
                    credential: credential.clone(),
                    generation: flight.generation,
                    fresh: minted || pending,
                })
            }
            Err(message) => {
                self.retire(&flight);
                Err(own_failure.unwrap_or_else(|| {
                    CarrierError::auth(message.clone(), Cause::SharedRefresh(message.clone()))
                }))
            }
        }
    }

    /// Drops the cached credential.
    ///
    /// A refresh still in flight is kept: a later [`Self::get_or_refresh`]
    /// joins it instead of running its own `refresh`. Otherwise the next call
    /// always refreshes.
    pub fn invalidate(&self) {
        let mut current = self.lock_current();
        if current.outcome.initialized() {
            log::debug!("invalidating credential generation {}", current.generation);
            *current = Arc::new(Flight::new(self.allocate_generation()));
        }
    }

    /// Drops the cached credential only if it still belongs to `generation`.
    /// Returns whether anything was dropped.
    pub fn invalidate_generation(&self, generation: u64) -> bool {
        let mut current = self.lock_current();
        if current.generation != generation || !current.outcome.initialized() {
            return false;
        }

        log::debug!("invalidating credential generation {generation}");
        *current = Arc::new(Flight::new(self.allocate_generation()));
        true
    }

    pub fn is_populated(&self) -> bool {
        matches!(self.lock_current().outcome.get(), Some(Ok(_)))
    }

    /// Failed flights count as empty, even before their refresher retires them.
    fn current_flight(&self) -> Arc<Flight> {
        let mut current = self.lock_current();
        if matches!(current.outcome.get(), Some(Err(_))) {
            *current = Arc::new(Flight::new(self.allocate_generation()));
        }
        Arc::clone(&current)
    }

    fn retire(&self, flight: &Arc<Flight>) {
        let mut current = self.lock_current();
        if Arc::ptr_eq(&current, flight) {
            *current = Arc::new(Flight::new(self.allocate_generation()));
        }
    }

    fn allocate_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::Relaxed)
    }

    fn lock_current(&self) -> MutexGuard<'_, Arc<Flight>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
