use crate::bridge::model::{JobRecord, JobStatus};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

/// Keyed storage for job records shared by the HTTP routes and job threads.
pub trait JobStore: Send + Sync {
    fn get(&self, job_id: &Uuid) -> Option<JobRecord>;
    fn put(&self, record: JobRecord);
    fn delete(&self, job_id: &Uuid) -> Option<JobRecord>;
    fn list(&self) -> Vec<JobRecord>;

    /// Applies `apply` to an existing record; returns `false` if the job is gone.
    fn update(&self, job_id: &Uuid, apply: &mut dyn FnMut(&mut JobRecord)) -> bool {
        match self.get(job_id) {
            Some(mut record) => {
                apply(&mut record);
                self.put(record);
                true
            }
            None => false,
        }
    }

    fn count_with_status(&self, status: JobStatus) -> usize {
        self.list().iter().filter(|r| r.status == status).count()
    }
}

#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<Uuid, JobRecord>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for InMemoryJobStore {
    fn get(&self, job_id: &Uuid) -> Option<JobRecord> {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        jobs.get(job_id).cloned()
    }

    fn put(&self, record: JobRecord) {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        jobs.insert(record.job_id, record);
    }

    fn delete(&self, job_id: &Uuid) -> Option<JobRecord> {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        jobs.remove(job_id)
    }

    fn list(&self) -> Vec<JobRecord> {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        jobs.values().cloned().collect()
    }

    fn update(&self, job_id: &Uuid, apply: &mut dyn FnMut(&mut JobRecord)) -> bool {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        match jobs.get_mut(job_id) {
            Some(record) => {
                apply(record);
                true
            }
            None => false,
        }
    }
}
