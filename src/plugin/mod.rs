// In: src/plugin/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Output-Plugin Transaction Protocol
// ====================================================================================
//
// `plugin` is the contract the page pipeline executes under: a finite-state
// protocol wrapping one parallel transfer job.
//
//   1. [transaction(config, n, control)]  -> validates/resolves config into a
//         |                                  TaskSource, invokes control.run to
//         |                                  execute all n tasks, returns a
//         |                                  ConfigDiff for the next run
//         |
//   2. [resume(task_source, n, control)]  -> re-entrant alternative after a
//         |                                  partial failure; same outward
//         |                                  contract from already-resolved
//         |                                  state, already-successful tasks
//         |                                  are never re-run
//         |
//   3. [cleanup(task_source, n, reports)] -> terminal step, exactly once per
//                                            job, however many tasks succeeded
//
// `open` is the per-task factory: the returned object is the page consumer
// for that task's output half, with its own commit/abort lifecycle.
//
// Task failure is represented as the absence of a TaskReport at that task's
// index; no error in one task may touch another task's buffers or pages.
//
// ====================================================================================

mod runner;

use crate::config::{ConfigDiff, ConfigSource, TaskReport, TaskSource};
use crate::error::BulkrowError;
use crate::page::PageOutput;

pub use runner::{JobOutcome, TaskFeed, TransactionRunner};

/// A controller of the following tasks, provided by the orchestrating host.
pub trait OutputControl {
    /// Runs every task of the job against `task_source` and reports one
    /// outcome per task index; `None` marks that task as failed.
    fn run(&mut self, task_source: &TaskSource)
        -> Result<Vec<Option<TaskReport>>, BulkrowError>;
}

/// The per-task page consumer with a transactional lifecycle: pages are
/// pushed, the stream is finished, then the task either commits (yielding
/// its report) or aborts (discarding partial output).
pub trait TransactionalPageOutput: PageOutput {
    fn commit(&mut self) -> Result<TaskReport, BulkrowError>;
    fn abort(&mut self);
}

/// The surface one output plugin implements.
///
/// `config` and `task_source` are never mutated by the plugin; the returned
/// `ConfigDiff` and `TaskReport`s are freshly constructed values, not
/// aliases into plugin-internal state.
pub trait OutputPlugin {
    /// Processes the entire output transaction. Normal entry state.
    fn transaction(
        &self,
        config: &ConfigSource,
        task_count: usize,
        control: &mut dyn OutputControl,
    ) -> Result<ConfigDiff, BulkrowError>;

    /// Re-entrant entry after a prior partial failure. Must reproduce the
    /// outward contract of `transaction` from already-resolved state;
    /// re-running with the same TaskSource and the same set of successful
    /// reports must not duplicate already-committed output.
    fn resume(
        &self,
        task_source: &TaskSource,
        task_count: usize,
        control: &mut dyn OutputControl,
    ) -> Result<ConfigDiff, BulkrowError>;

    /// Terminal step: releases anything reserved during `transaction` or
    /// `resume`, regardless of how many tasks succeeded.
    fn cleanup(
        &self,
        task_source: &TaskSource,
        task_count: usize,
        success_reports: &[TaskReport],
    ) -> Result<(), BulkrowError>;

    /// Per-task factory for the task's output half.
    fn open(
        &self,
        task_source: &TaskSource,
        task_index: usize,
    ) -> Result<Box<dyn TransactionalPageOutput>, BulkrowError>;
}
