use std::rc::Rc;

use navigator_core::{JobId, ShortlistSet};
use navigator_logging::{nav_debug, nav_warn};

use crate::error::NavigatorError;
use crate::host::HostSurface;
use crate::store::{KeyValueStore, PersistentStore};
use crate::sync::NativeSync;

/// The shortlist set together with its persistence: every mutation is written
/// before the call returns.
#[derive(Debug)]
pub struct ShortlistState<S> {
    set: ShortlistSet,
    store: Rc<PersistentStore<S>>,
}

impl<S: KeyValueStore> ShortlistState<S> {
    pub fn load(store: Rc<PersistentStore<S>>) -> Self {
        let set = store.load_shortlist();
        nav_debug!("Loaded {} shortlisted jobs", set.len());
        Self { set, store }
    }

    pub fn set(&self) -> &ShortlistSet {
        &self.set
    }

    pub fn is_shortlisted(&self, job: &JobId) -> bool {
        self.set.contains(job)
    }

    /// Flips membership locally and returns the new state.
    pub fn toggle_local(&mut self, job: &JobId) -> bool {
        let shortlisted = self.set.toggle(job);
        nav_debug!("Shortlist toggle {} -> {}", job, shortlisted);
        self.persist();
        shortlisted
    }

    /// Sets membership to a confirmed value; persists only when it changed.
    pub fn apply(&mut self, job: &JobId, shortlisted: bool) -> bool {
        let changed = self.set.set(job, shortlisted);
        if changed {
            self.persist();
        }
        changed
    }

    /// Flips membership through the host's own shortlist folder. Local state
    /// changes only after the host side confirmed; returns the new state.
    pub async fn toggle_with_host_sync<H: HostSurface + ?Sized>(
        &mut self,
        sync: &mut NativeSync<'_, H>,
        job: &JobId,
    ) -> Result<bool, NavigatorError> {
        let shortlisted = !self.is_shortlisted(job);
        sync.run(job, shortlisted).await?;
        self.apply(job, shortlisted);
        Ok(shortlisted)
    }

    pub fn clear_all(&mut self) {
        let count = self.set.len();
        self.set.clear();
        nav_debug!("Cleared {} shortlisted jobs", count);
        self.persist();
    }

    /// Adds or removes every id, then persists once.
    pub fn bulk_set(&mut self, jobs: &[JobId], shortlisted: bool) -> usize {
        let mut changed = 0;
        for job in jobs {
            if self.set.set(job, shortlisted) {
                changed += 1;
            }
        }
        nav_debug!(
            "Bulk {} of {} jobs ({} changed)",
            if shortlisted { "add" } else { "remove" },
            jobs.len(),
            changed
        );
        self.persist();
        changed
    }

    fn persist(&self) {
        // In-memory state stays authoritative for the session when storage fails.
        if let Err(err) = self.store.save_shortlist(&self.set) {
            nav_warn!("Failed to persist shortlist: {}", err);
        }
    }
}
