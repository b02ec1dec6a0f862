use std::collections::BTreeSet;

use crate::JobId;

/// The local mirror of the host's shortlist folder.
///
/// Membership is boolean; iteration is in numeric id order so the persisted
/// form is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShortlistSet {
    jobs: BTreeSet<JobId>,
}

impl ShortlistSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, job: &JobId) -> bool {
        self.jobs.contains(job)
    }

    /// Sets membership; returns whether anything changed.
    pub fn set(&mut self, job: &JobId, shortlisted: bool) -> bool {
        if shortlisted {
            self.jobs.insert(job.clone())
        } else {
            self.jobs.remove(job)
        }
    }

    /// Flips membership and returns the new state.
    pub fn toggle(&mut self, job: &JobId) -> bool {
        let shortlisted = !self.contains(job);
        self.set(job, shortlisted);
        shortlisted
    }

    pub fn clear(&mut self) {
        self.jobs.clear();
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobId> {
        self.jobs.iter()
    }

    pub fn to_vec(&self) -> Vec<JobId> {
        self.jobs.iter().cloned().collect()
    }
}

impl FromIterator<JobId> for ShortlistSet {
    fn from_iter<I: IntoIterator<Item = JobId>>(iter: I) -> Self {
        Self {
            jobs: iter.into_iter().collect(),
        }
    }
}
