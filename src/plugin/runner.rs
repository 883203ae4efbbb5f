// In: src/plugin/runner.rs

//! The host-side driver for one transaction: fan-out task execution,
//! fan-in report collection, and the exactly-once `cleanup` guarantee.

use crate::config::{ConfigDiff, ConfigSource, TaskReport, TaskSource};
use crate::error::BulkrowError;

use super::{OutputControl, OutputPlugin, TransactionalPageOutput};

/// Produces one task's page stream into its transactional output. The feed
/// only pushes pages; finishing, committing and aborting belong to the
/// runner's control.
pub type TaskFeed<'a> =
    dyn FnMut(usize, &mut dyn TransactionalPageOutput) -> Result<(), BulkrowError> + 'a;

/// What one driven job produced: the plugin's incremental state plus the
/// per-task outcomes (`None` = that task failed and is a candidate for
/// `resume`).
#[derive(Debug)]
pub struct JobOutcome {
    pub config_diff: ConfigDiff,
    pub reports: Vec<Option<TaskReport>>,
}

impl JobOutcome {
    pub fn is_complete(&self) -> bool {
        self.reports.iter().all(Option::is_some)
    }

    pub fn success_reports(&self) -> Vec<TaskReport> {
        self.reports.iter().flatten().cloned().collect()
    }
}

/// Drives one parallel transfer job through a plugin's transaction protocol.
///
/// Task execution is synchronized at the job boundary: `control.run`
/// delivers one outcome per task before `transaction`/`resume` returns.
pub struct TransactionRunner<'p> {
    plugin: &'p dyn OutputPlugin,
    task_count: usize,
}

impl<'p> TransactionRunner<'p> {
    pub fn new(plugin: &'p dyn OutputPlugin, task_count: usize) -> Self {
        Self { plugin, task_count }
    }

    /// Initial entry: resolves `config` through the plugin's `transaction`
    /// and runs every task. `cleanup` runs exactly once before returning,
    /// whether or not every task succeeded.
    pub fn run(
        &self,
        config: &ConfigSource,
        feed: &mut TaskFeed<'_>,
    ) -> Result<JobOutcome, BulkrowError> {
        let fallback = TaskSource::from_config(config);
        let mut control = FanOutControl::new(self.plugin, self.task_count, Vec::new(), feed);
        let result = self.plugin.transaction(config, self.task_count, &mut control);
        self.finish_job(result, control, fallback)
    }

    /// Re-entrant alternative after a partial failure. Indices that already
    /// have a report in `prior_reports` are never re-run, so repeating
    /// `resume` with the same inputs cannot duplicate committed output.
    pub fn resume(
        &self,
        task_source: &TaskSource,
        prior_reports: Vec<Option<TaskReport>>,
        feed: &mut TaskFeed<'_>,
    ) -> Result<JobOutcome, BulkrowError> {
        let mut control =
            FanOutControl::new(self.plugin, self.task_count, prior_reports, feed);
        let result = self.plugin.resume(task_source, self.task_count, &mut control);
        self.finish_job(result, control, task_source.clone())
    }

    fn finish_job(
        &self,
        result: Result<ConfigDiff, BulkrowError>,
        control: FanOutControl<'_, '_, '_>,
        fallback_task_source: TaskSource,
    ) -> Result<JobOutcome, BulkrowError> {
        let FanOutControl {
            reports,
            seen_task_source,
            ..
        } = control;
        let task_source = seen_task_source.unwrap_or(fallback_task_source);

        // Terminal step, exactly once per job, even when the plugin's entry
        // point failed or some tasks never succeeded.
        let successes: Vec<TaskReport> = reports.iter().flatten().cloned().collect();
        self.plugin
            .cleanup(&task_source, self.task_count, &successes)?;

        let config_diff = result?;
        log::debug!(
            "transaction finished: tasks={} succeeded={}",
            self.task_count,
            successes.len()
        );
        Ok(JobOutcome {
            config_diff,
            reports,
        })
    }
}

/// The `OutputControl` handed into the plugin: opens one transactional
/// output per task, feeds it, then commits or aborts. A prior successful
/// report short-circuits its task untouched.
struct FanOutControl<'p, 'f, 'a> {
    plugin: &'p dyn OutputPlugin,
    task_count: usize,
    prior_reports: Vec<Option<TaskReport>>,
    feed: &'f mut TaskFeed<'a>,
    reports: Vec<Option<TaskReport>>,
    seen_task_source: Option<TaskSource>,
}

impl<'p, 'f, 'a> FanOutControl<'p, 'f, 'a> {
    fn new(
        plugin: &'p dyn OutputPlugin,
        task_count: usize,
        prior_reports: Vec<Option<TaskReport>>,
        feed: &'f mut TaskFeed<'a>,
    ) -> Self {
        Self {
            plugin,
            task_count,
            prior_reports,
            feed,
            reports: Vec::new(),
            seen_task_source: None,
        }
    }

    fn run_one(
        &mut self,
        task_source: &TaskSource,
        task_index: usize,
    ) -> Result<TaskReport, BulkrowError> {
        let mut output = self.plugin.open(task_source, task_index)?;
        let produced = (self.feed)(task_index, output.as_mut())
            .and_then(|()| output.finish())
            .and_then(|()| output.commit());
        match produced {
            Ok(report) => Ok(report),
            Err(error) => {
                output.abort();
                Err(error)
            }
        }
    }
}

impl OutputControl for FanOutControl<'_, '_, '_> {
    fn run(
        &mut self,
        task_source: &TaskSource,
    ) -> Result<Vec<Option<TaskReport>>, BulkrowError> {
        self.seen_task_source = Some(task_source.clone());
        let mut reports = Vec::with_capacity(self.task_count);
        for task_index in 0..self.task_count {
            if let Some(prior) = self.prior_reports.get(task_index).cloned().flatten() {
                // Already committed in an earlier attempt; never re-run.
                reports.push(Some(prior));
                continue;
            }
            match self.run_one(task_source, task_index) {
                Ok(report) => reports.push(Some(report)),
                Err(error) => {
                    // One task's failure is isolated; the rest still run.
                    log::warn!("task {} failed: {}", task_index, error);
                    reports.push(None);
                }
            }
        }
        self.reports = reports.clone();
        Ok(reports)
    }
}

//==================================================================================
// Unit Tests
//==================================================================================
