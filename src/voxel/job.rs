//! Minimal job system on top of rayon.
//!
//! A [`Job`] is a unit of work that borrows whatever it reads; a [`JobBatch`]
//! collects independent jobs and [`JobBatch::complete`] runs them on the rayon
//! pool, blocking until every one has finished. Callers finalize the returned
//! outputs afterwards on their own thread, so no job ever observes another
//! job's finalization.

use rayon::prelude::*;

/// A scheduled unit of work producing `T`
pub struct Job<'a, T> {
    run: Box<dyn FnOnce() -> T + Send + 'a>,
}

impl<'a, T> Job<'a, T> {
    pub fn new(f: impl FnOnce() -> T + Send + 'a) -> Self {
        Self { run: Box::new(f) }
    }

    /// Run the job on the calling thread
    pub fn complete(self) -> T {
        (self.run)()
    }
}

impl<T> std::fmt::Debug for Job<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job").finish_non_exhaustive()
    }
}

/// A set of independent jobs completed together
pub struct JobBatch<'a, T> {
    jobs: Vec<Job<'a, T>>,
}

impl<'a, T: Send> JobBatch<'a, T> {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            jobs: Vec::with_capacity(capacity),
        }
    }

    pub fn schedule(&mut self, job: Job<'a, T>) {
        self.jobs.push(job);
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Run every job in parallel and block until all are done.
    /// Outputs are returned in scheduling order.
    pub fn complete(self) -> Vec<T> {
        match self.jobs.len() {
            0 => Vec::new(),
            1 => self.jobs.into_iter().map(Job::complete).collect(),
            _ => self.jobs.into_par_iter().map(Job::complete).collect(),
        }
    }
}

impl<'a, T: Send> Default for JobBatch<'a, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: Send> FromIterator<Job<'a, T>> for JobBatch<'a, T> {
    fn from_iter<It: IntoIterator<Item = Job<'a, T>>>(iter: It) -> Self {
        Self {
            jobs: iter.into_iter().collect(),
        }
    }
}
