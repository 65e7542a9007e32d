//! In-memory job store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{Job, JobError, JobStore, JobSummary, JobUpdate};

type JobCell = Arc<RwLock<Job>>;

/// Job store that lives for the lifetime of the process.
///
/// The map lock is only held to insert or look up a record; each record has
/// its own lock, so a job being updated never blocks reads of other jobs.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<String, JobCell>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, id: &str) -> Result<Option<JobCell>, JobError> {
        let jobs = self.jobs.read().map_err(|_| poisoned())?;
        Ok(jobs.get(id).cloned())
    }

    fn cells(&self) -> Result<Vec<JobCell>, JobError> {
        let jobs = self.jobs.read().map_err(|_| poisoned())?;
        Ok(jobs.values().cloned().collect())
    }
}

fn poisoned() -> JobError {
    JobError::Storage("job store lock poisoned".to_string())
}

impl JobStore for InMemoryJobStore {
    fn create(&self, id: &str) -> Result<Job, JobError> {
        let mut jobs = self.jobs.write().map_err(|_| poisoned())?;
        if jobs.contains_key(id) {
            return Err(JobError::DuplicateId(id.to_string()));
        }

        let job = Job::new(id);
        jobs.insert(id.to_string(), Arc::new(RwLock::new(job.clone())));
        Ok(job)
    }

    fn get(&self, id: &str) -> Result<Option<Job>, JobError> {
        match self.cell(id)? {
            Some(cell) => {
                let job = cell.read().map_err(|_| poisoned())?;
                Ok(Some(job.clone()))
            }
            None => Ok(None),
        }
    }

    fn list(&self) -> Result<Vec<JobSummary>, JobError> {
        let mut summaries = self
            .cells()?
            .iter()
            .map(|cell| cell.read().map(|job| job.summary()).map_err(|_| poisoned()))
            .collect::<Result<Vec<_>, _>>()?;

        summaries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(summaries)
    }

    fn apply(&self, id: &str, update: JobUpdate) -> Result<Job, JobError> {
        let cell = self
            .cell(id)?
            .ok_or_else(|| JobError::NotFound(id.to_string()))?;
        let mut job = cell.write().map_err(|_| poisoned())?;
        job.apply(update)?;
        Ok(job.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobStatus, Stage};
    use std::thread;

    #[test]
    fn test_create_and_get() {
        let store = InMemoryJobStore::new();
        let created = store.create("job-1").unwrap();
        assert_eq!(created.status, JobStatus::Pending);

        let fetched = store.get("job-1").unwrap().unwrap();
        assert_eq!(fetched.id, "job-1");
        assert_eq!(fetched.status, JobStatus::Pending);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let store = InMemoryJobStore::new();
        store.create("dup").unwrap();
        let err = store.create("dup").unwrap_err();
        assert!(matches!(err, JobError::DuplicateId(id) if id == "dup"));
    }

    #[test]
    fn test_get_missing_is_none() {
        let store = InMemoryJobStore::new();
        assert!(store.get("nope").unwrap().is_none());
    }

    #[test]
    fn test_apply_missing_is_not_found() {
        let store = InMemoryJobStore::new();
        let err = store
            .apply("nope", JobUpdate::StageStarted(Stage::Downloading))
            .unwrap_err();
        assert!(matches!(err, JobError::NotFound(_)));
    }

    #[test]
    fn test_apply_updates_record() {
        let store = InMemoryJobStore::new();
        store.create("job-1").unwrap();
        let job = store
            .apply("job-1", JobUpdate::StageStarted(Stage::Downloading))
            .unwrap();
        assert_eq!(job.status, JobStatus::Running);

        let fetched = store.get("job-1").unwrap().unwrap();
        assert_eq!(fetched.progress, 10);
    }

    #[test]
    fn test_list_newest_first() {
        let store = InMemoryJobStore::new();
        store.create("first").unwrap();
        thread::sleep(std::time::Duration::from_millis(5));
        store.create("second").unwrap();
        thread::sleep(std::time::Duration::from_millis(5));
        store.create("third").unwrap();

        let ids: Vec<_> = store.list().unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["third", "second", "first"]);
    }

    #[test]
    fn test_concurrent_writers_on_separate_jobs() {
        let store = Arc::new(InMemoryJobStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let id = format!("job-{}", i);
                    store.create(&id).unwrap();
                    for stage in [Stage::Downloading, Stage::Enhancing, Stage::FetchingStock] {
                        store.apply(&id, JobUpdate::StageStarted(stage)).unwrap();
                        store.list().unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let summaries = store.list().unwrap();
        assert_eq!(summaries.len(), 8);
        assert!(summaries.iter().all(|s| s.progress == 40));
    }
}
