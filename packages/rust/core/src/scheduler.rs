//! Batch fetch scheduler: one task at a time, a fixed delay before every live
//! fetch, archive schedules resumable from the cache tree.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use regfetch_client::Registrar;
use regfetch_shared::{DepartmentTask, FetchConfig, RegfetchError, Result};
use regfetch_storage::{ArtifactKind, CacheTree};

use crate::enumerate::{FetchCategory, FetchPlan};

/// Progress sink for a batch run.
pub trait ProgressReporter: Send + Sync {
    /// Called once with the number of steps: one per task plus a final one.
    fn start(&self, total: u64);
    /// Called before each task with its label.
    fn advance(&self, label: &str);
    /// Called once after the last task.
    fn finish(&self);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn start(&self, _total: u64) {}
    fn advance(&self, _label: &str) {}
    fn finish(&self) {}
}

/// What a batch run did.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub fetched: usize,
    /// Archive tasks whose artifact was already cached.
    pub skipped: usize,
    pub written: Vec<PathBuf>,
    pub duration: Duration,
}

/// Drives a [`FetchPlan`] through the registrar into the cache tree.
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    registrar: Registrar,
    cache: CacheTree,
    delay: Duration,
}

impl BatchScheduler {
    pub fn new(registrar: Registrar, cache: CacheTree, delay: Duration) -> Self {
        Self {
            registrar,
            cache,
            delay,
        }
    }

    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        Ok(Self::new(
            Registrar::from_config(config)?,
            CacheTree::new(&config.root_dir),
            config.request_delay,
        ))
    }

    pub fn registrar(&self) -> &Registrar {
        &self.registrar
    }

    /// Run every task in order. The first failure aborts the batch; artifacts
    /// already written stay in place.
    #[instrument(skip_all, fields(tasks = plan.tasks.len()))]
    pub async fn run(
        &self,
        plan: &FetchPlan,
        progress: &dyn ProgressReporter,
    ) -> Result<BatchSummary> {
        let start = Instant::now();
        let mut summary = BatchSummary::default();
        let resumable = matches!(plan.category, FetchCategory::Schedules { archive: true });

        progress.start(plan.tasks.len() as u64 + 1);

        for task in &plan.tasks {
            progress.advance(&task.label());

            let kind = artifact_kind(&plan.category, task)?;
            if resumable && self.cache.contains(&task.department, &kind)? {
                debug!(task = %task.label(), "already cached, skipped");
                summary.skipped += 1;
                continue;
            }

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let body = self.fetch(&plan.category, task).await?;
            let path = self.cache.write_artifact(&task.department, &kind, &body)?;
            summary.fetched += 1;
            summary.written.push(path);
        }

        progress.finish();
        summary.duration = start.elapsed();

        info!(
            fetched = summary.fetched,
            skipped = summary.skipped,
            elapsed_ms = summary.duration.as_millis() as u64,
            "batch complete"
        );
        Ok(summary)
    }

    async fn fetch(&self, category: &FetchCategory, task: &DepartmentTask) -> Result<String> {
        match category {
            FetchCategory::Catalogue => self.registrar.fetch_catalogue(&task.option).await,
            FetchCategory::Prerequisites { term } => {
                self.registrar.fetch_prerequisites(term, &task.option).await
            }
            FetchCategory::Schedules { .. } => {
                let term = schedule_term(task)?;
                self.registrar.fetch_schedule(term, &task.option).await
            }
        }
    }
}

fn artifact_kind(category: &FetchCategory, task: &DepartmentTask) -> Result<ArtifactKind> {
    Ok(match category {
        FetchCategory::Catalogue => ArtifactKind::Catalogue,
        FetchCategory::Prerequisites { .. } => ArtifactKind::Prerequisites,
        FetchCategory::Schedules { .. } => ArtifactKind::Schedule(schedule_term(task)?.clone()),
    })
}

fn schedule_term(task: &DepartmentTask) -> Result<&regfetch_shared::Term> {
    task.term.as_ref().ok_or_else(|| {
        RegfetchError::validation(format!("schedule task `{}` has no term", task.department))
    })
}
