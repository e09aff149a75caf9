// ============================================================================
// Access Core - Sync Coordinator
// File: crates/access-core/src/services/sync_coordinator.rs
// ============================================================================
//! Drives one "edit this user's menu access" session.
//!
//! Lifecycle: `Closed -> Loading -> Ready -> Saving -> Ready`, back to
//! `Closed` on `close()`. Each open or close bumps a generation counter;
//! a request that resolves after its generation was superseded is dropped
//! with [`AccessError::StaleSession`] instead of touching the new state.
//! The state lock is never held across an await.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use access_shared::{new_session_id, MenuId, SessionId, UserId};

use crate::domain::{Assignment, MenuCatalog, MenuNode, PermissionDiff, PermissionSet, ToggleOutcome};
use crate::error::AccessError;
use crate::repositories::AccessStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Closed,
    Loading,
    Ready { dirty: bool },
    Saving,
}

/// Read-only view of the open session handed to consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub phase: SessionPhase,
    pub working: BTreeSet<MenuId>,
    pub baseline: BTreeSet<MenuId>,
    pub dirty: bool,
}

impl SessionSnapshot {
    /// Unsaved changes at the time of the snapshot.
    pub fn diff(&self) -> PermissionDiff {
        PermissionDiff {
            granted: self.working.difference(&self.baseline).copied().collect(),
            revoked: self.baseline.difference(&self.working).copied().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Persisted; carries what changed relative to the previous baseline.
    Saved(PermissionDiff),
    /// Nothing to persist.
    Unchanged,
}

struct EditingSession {
    id: SessionId,
    user_id: UserId,
    catalog: Arc<MenuCatalog>,
    permissions: PermissionSet,
    saving: bool,
}

impl EditingSession {
    fn phase(&self) -> SessionPhase {
        if self.saving {
            SessionPhase::Saving
        } else {
            SessionPhase::Ready {
                dirty: self.permissions.is_dirty(),
            }
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            user_id: self.user_id,
            phase: self.phase(),
            working: self.permissions.working().clone(),
            baseline: self.permissions.baseline().clone(),
            dirty: self.permissions.is_dirty(),
        }
    }
}

enum Slot {
    Closed,
    Loading { user_id: UserId },
    Open(EditingSession),
}

struct CoordinatorState {
    generation: u64,
    slot: Slot,
}

impl CoordinatorState {
    fn session(&self) -> Option<&EditingSession> {
        match &self.slot {
            Slot::Open(session) => Some(session),
            _ => None,
        }
    }

    fn session_mut(&mut self) -> Result<&mut EditingSession, AccessError> {
        match &mut self.slot {
            Slot::Open(session) => Ok(session),
            _ => Err(AccessError::SessionClosed),
        }
    }

    /// Invalidates whatever is in flight and empties the slot.
    fn reset(&mut self) -> u64 {
        self.generation += 1;
        self.slot = Slot::Closed;
        self.generation
    }
}

/// Rolls back the in-flight marker of an `open` or `save` whose future is
/// dropped before its request resolves. Disarmed once the request returns.
struct InFlight<'a> {
    state: &'a Mutex<CoordinatorState>,
    generation: u64,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn new(state: &'a Mutex<CoordinatorState>, generation: u64) -> Self {
        Self {
            state,
            generation,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock();
        if state.generation != self.generation {
            return;
        }
        let abandoned_open = match &mut state.slot {
            Slot::Open(session) => {
                debug!(session_id = %session.id, "Save abandoned, session editable again");
                session.saving = false;
                false
            }
            Slot::Loading { user_id } => {
                debug!(user_id = *user_id, "Open abandoned, session closed");
                true
            }
            Slot::Closed => false,
        };
        if abandoned_open {
            state.slot = Slot::Closed;
        }
    }
}

pub struct SyncCoordinator<S: AccessStore> {
    store: Arc<S>,
    catalog_cache: Mutex<Option<Arc<MenuCatalog>>>,
    state: Mutex<CoordinatorState>,
}

impl<S: AccessStore> SyncCoordinator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            catalog_cache: Mutex::new(None),
            state: Mutex::new(CoordinatorState {
                generation: 0,
                slot: Slot::Closed,
            }),
        }
    }

    /// Opens a fresh session for `user_id`, replacing any open one.
    pub async fn open(&self, user_id: UserId) -> Result<SessionSnapshot, AccessError> {
        let generation = {
            let mut state = self.state.lock();
            if let Some(previous) = state.session() {
                info!(session_id = %previous.id, user_id = previous.user_id, "Replacing open editing session");
            }
            let generation = state.reset();
            state.slot = Slot::Loading { user_id };
            generation
        };
        info!(user_id, generation, "Opening menu access session");

        let mut in_flight = InFlight::new(&self.state, generation);
        let loaded = self.load(user_id).await;
        in_flight.disarm();

        let mut state = self.state.lock();
        if state.generation != generation {
            debug!(user_id, generation, "Discarding late session load");
            return Err(AccessError::StaleSession);
        }

        let (catalog, assignment) = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(user_id, error = %e, "Failed to open menu access session");
                state.slot = Slot::Closed;
                return Err(e);
            }
        };

        let baseline = assignment.id_set();
        let audit = catalog.audit(&baseline);
        if !audit.is_clean() {
            warn!(
                user_id,
                unknown = ?audit.unknown,
                orphaned = ?audit.orphaned,
                "Fetched assignment is inconsistent with the catalog"
            );
        }

        let mut permissions = PermissionSet::new();
        permissions.load_baseline(baseline);
        let session = EditingSession {
            id: new_session_id(),
            user_id,
            catalog,
            permissions,
            saving: false,
        };
        let snapshot = session.snapshot();
        info!(
            session_id = %session.id,
            user_id,
            granted = snapshot.baseline.len(),
            "Menu access session ready"
        );
        state.slot = Slot::Open(session);
        Ok(snapshot)
    }

    async fn load(&self, user_id: UserId) -> Result<(Arc<MenuCatalog>, Assignment), AccessError> {
        let cached = self.catalog_cache.lock().clone();
        if let Some(catalog) = cached {
            let assignment = self.store.fetch_assignment(user_id).await?;
            return Ok((catalog, assignment));
        }

        let (nodes, assignment) = tokio::try_join!(
            self.store.fetch_catalog(),
            self.store.fetch_assignment(user_id)
        )?;
        let catalog = Arc::new(MenuCatalog::build(nodes)?);
        debug!(menus = catalog.len(), "Menu catalog cached");
        *self.catalog_cache.lock() = Some(catalog.clone());
        Ok((catalog, assignment))
    }

    /// Persists the working set. A clean session is a no-op; a second save
    /// while one is outstanding is rejected.
    pub async fn save(&self) -> Result<SaveOutcome, AccessError> {
        let (generation, session_id, user_id, payload) = {
            let mut state = self.state.lock();
            let generation = state.generation;
            let session = state.session_mut()?;
            if session.saving {
                return Err(AccessError::SaveInProgress);
            }
            if !session.permissions.is_dirty() {
                debug!(session_id = %session.id, "Nothing to save");
                return Ok(SaveOutcome::Unchanged);
            }
            session.saving = true;
            let payload = Assignment::from_ids(session.permissions.working().iter().copied());
            (generation, session.id, session.user_id, payload)
        };
        info!(%session_id, user_id, granted = payload.menu_ids.len(), "Saving menu access");

        let mut in_flight = InFlight::new(&self.state, generation);
        let result = self.store.persist_assignment(user_id, &payload).await;
        in_flight.disarm();

        let mut state = self.state.lock();
        if state.generation != generation {
            debug!(%session_id, "Discarding late save result");
            return Err(AccessError::StaleSession);
        }
        if let Err(AccessError::Unauthorized) = result {
            warn!(%session_id, user_id, "Save unauthorized, closing editing session");
            state.reset();
            return Err(AccessError::Unauthorized);
        }

        let session = state.session_mut()?;
        session.saving = false;
        match result {
            Ok(echoed) => {
                if let Some(persisted) = echoed {
                    if persisted.id_set() != *session.permissions.working() {
                        warn!(
                            %session_id,
                            persisted = ?persisted.menu_ids,
                            "Remote store echoed a different menu set"
                        );
                    }
                }
                let diff = session.permissions.diff();
                session.permissions.commit();
                info!(
                    %session_id,
                    granted = ?diff.granted,
                    revoked = ?diff.revoked,
                    "Menu access saved"
                );
                Ok(SaveOutcome::Saved(diff))
            }
            Err(e) => {
                warn!(%session_id, error = %e, "Saving menu access failed");
                Err(e)
            }
        }
    }

    fn edit<T>(
        &self,
        op: impl FnOnce(&mut EditingSession) -> Result<T, AccessError>,
    ) -> Result<T, AccessError> {
        let mut state = self.state.lock();
        let session = state.session_mut()?;
        if session.saving {
            return Err(AccessError::SaveInProgress);
        }
        op(session)
    }

    pub fn toggle(&self, id: MenuId) -> Result<ToggleOutcome, AccessError> {
        self.edit(|session| {
            let outcome = session.permissions.toggle(&session.catalog, id)?;
            debug!(session_id = %session.id, menu_id = id, ?outcome, "Menu toggled");
            Ok(outcome)
        })
    }

    pub fn select_all(&self) -> Result<(), AccessError> {
        self.edit(|session| {
            session.permissions.select_all(&session.catalog);
            Ok(())
        })
    }

    pub fn deselect_all(&self) -> Result<(), AccessError> {
        self.edit(|session| {
            session.permissions.deselect_all();
            Ok(())
        })
    }

    /// Throws away unsaved edits. No network call.
    pub fn cancel(&self) -> Result<(), AccessError> {
        self.edit(|session| {
            session.permissions.reset_to_baseline();
            Ok(())
        })
    }

    pub fn close(&self) {
        let mut state = self.state.lock();
        if let Some(session) = state.session() {
            info!(session_id = %session.id, user_id = session.user_id, "Closing menu access session");
        }
        state.reset();
    }

    pub fn phase(&self) -> SessionPhase {
        let state = self.state.lock();
        match &state.slot {
            Slot::Closed => SessionPhase::Closed,
            Slot::Loading { .. } => SessionPhase::Loading,
            Slot::Open(session) => session.phase(),
        }
    }

    /// User whose session is open or loading.
    pub fn user_id(&self) -> Option<UserId> {
        let state = self.state.lock();
        match &state.slot {
            Slot::Closed => None,
            Slot::Loading { user_id } => Some(*user_id),
            Slot::Open(session) => Some(session.user_id),
        }
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.state.lock().session().map(EditingSession::snapshot)
    }

    pub fn catalog(&self) -> Option<Arc<MenuCatalog>> {
        self.state.lock().session().map(|s| s.catalog.clone())
    }

    /// Navigation tree of the current working set.
    pub fn visible_tree(&self) -> Result<Vec<MenuNode>, AccessError> {
        let state = self.state.lock();
        let session = state.session().ok_or(AccessError::SessionClosed)?;
        Ok(session.catalog.visible_tree(session.permissions.working()))
    }

    /// Next `open` refetches the catalog.
    pub fn invalidate_catalog(&self) {
        self.catalog_cache.lock().take();
    }
}
