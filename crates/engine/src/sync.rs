// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The sync engine (§4.C): `RunOnce`, `RunIncremental`, and `CleanOrphans`
//! over a `Driver`/`StrmWriter` pair, plus the pure output-path mapping and
//! `DecideUpdate` pipeline each file goes through.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use strmsync_adapters::{
    BuildStrmInfoParams, Driver, DriverError, ScanOptions, StrmWriter, WriterError,
};
use strmsync_core::{
    decide_update, map_output_path, Clock, DecisionInput, DecisionReason, IncrementalEvent,
    IncrementalOp, Job, RemoteEntry, RunEvent, RunEventOp, RunEventSink, RunEventStatus,
    TaskRunId,
};

use crate::stats::Stats;

#[derive(Debug, Error)]
pub enum SyncErrorKind {
    #[error("sync already running for this engine instance")]
    AlreadyRunning,
    #[error("cancelled")]
    Cancelled,
    #[error("scan failed: {0}")]
    ScanFailed(#[from] DriverError),
}

/// Error returned by a sync run, carrying whatever `Stats` had accumulated
/// before the failure (§4.C Failure semantics: "returns promptly with the
/// accumulated stats and the cancellation error").
#[derive(Debug, Error)]
#[error("{source}")]
pub struct SyncError {
    pub stats: Stats,
    #[source]
    pub source: SyncErrorKind,
}

impl SyncError {
    fn new(stats: Stats, source: SyncErrorKind) -> Self {
        Self { stats, source }
    }
}

/// Drives one job's files between a `Driver` and a `StrmWriter` (§4.C).
/// Stateless between runs except for the single-flight flag; safe to hold
/// behind an `Arc` and call from multiple tasks (calls beyond the first
/// concurrent one are rejected, not queued).
pub struct SyncEngine<C: Clock> {
    driver: Arc<dyn Driver>,
    writer: Arc<StrmWriter>,
    sink: Arc<dyn RunEventSink>,
    clock: C,
    running: AtomicBool,
}

impl<C: Clock> SyncEngine<C> {
    pub fn new(
        driver: Arc<dyn Driver>,
        writer: Arc<StrmWriter>,
        sink: Arc<dyn RunEventSink>,
        clock: C,
    ) -> Self {
        Self {
            driver,
            writer,
            sink,
            clock,
            running: AtomicBool::new(false),
        }
    }

    fn enter_single_flight(&self) -> Result<(), SyncError> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(|_| SyncError::new(Stats::default(), SyncErrorKind::AlreadyRunning))
    }

    fn leave_single_flight(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Full scan + reconcile of `job.source_root` (§4.C).
    pub async fn run_once(
        &self,
        run_id: TaskRunId,
        server_id: &str,
        job: &Job,
        cancel: CancellationToken,
    ) -> Result<Stats, SyncError> {
        self.enter_single_flight()?;
        let result = self.run_once_inner(run_id, server_id, job, cancel).await;
        self.leave_single_flight();
        result
    }

    /// Process a bounded event list (§4.C RunIncremental): deletes first,
    /// then creates/updates through the same per-file pipeline `RunOnce` uses.
    pub async fn run_incremental(
        &self,
        run_id: TaskRunId,
        server_id: &str,
        job: &Job,
        events: Vec<IncrementalEvent>,
        cancel: CancellationToken,
    ) -> Result<Stats, SyncError> {
        self.enter_single_flight()?;
        let result = self
            .run_incremental_inner(run_id, server_id, job, events, cancel)
            .await;
        self.leave_single_flight();
        result
    }

    async fn run_once_inner(
        &self,
        run_id: TaskRunId,
        server_id: &str,
        job: &Job,
        cancel: CancellationToken,
    ) -> Result<Stats, SyncError> {
        let stats = Arc::new(Mutex::new(Stats::started(self.clock.epoch_ms())));
        let index = job
            .options
            .orphan_cleanup
            .then(|| Arc::new(Mutex::new(HashSet::<String>::new())));

        let scan_opts = ScanOptions {
            recursive: job.options.recursive,
            max_depth: if job.options.max_depth == 0 {
                25
            } else {
                job.options.max_depth
            },
        };

        let scan = match self.driver.scan(&job.source_root, scan_opts).await {
            Ok(s) => s,
            Err(e) => {
                let mut stats = stats.lock().clone();
                stats.finish(self.clock.epoch_ms());
                return Err(SyncError::new(stats, SyncErrorKind::ScanFailed(e)));
            }
        };
        let mut entries = scan.entries;
        let mut errors = scan.errors;

        let work_token = cancel.child_token();
        let error_token = work_token.clone();
        let mut scan_error: Option<DriverError> = None;
        let error_drain = tokio::spawn(async move {
            match errors.recv().await {
                Some(e) => {
                    tracing::warn!(error = %e, "scan stream error; cancelling new work");
                    error_token.cancel();
                    Some(e)
                }
                None => None,
            }
        });

        let semaphore = Arc::new(Semaphore::new(job.options.effective_max_concurrency()));
        let mut tasks: JoinSet<()> = JoinSet::new();

        loop {
            tokio::select! {
                biased;
                _ = work_token.cancelled() => break,
                entry = entries.recv() => {
                    let Some(entry) = entry else { break };
                    self.classify_and_spawn(
                        &mut tasks,
                        semaphore.clone(),
                        stats.clone(),
                        index.clone(),
                        run_id.clone(),
                        server_id.to_string(),
                        job,
                        entry,
                        work_token.clone(),
                    );
                }
            }
        }

        while tasks.join_next().await.is_some() {}
        if let Ok(Some(err)) = error_drain.await {
            scan_error = Some(err);
        }

        if let Some(index) = &index {
            let index = index.lock().clone();
            let mut orphan_stats = Stats::default();
            if let Err(e) = self.clean_orphans(&index, &mut orphan_stats).await {
                tracing::warn!(error = %e, "orphan cleanup failed");
            }
            stats.lock().deleted_orphans += orphan_stats.deleted_orphans;
        }

        let mut final_stats = stats.lock().clone();
        final_stats.finish(self.clock.epoch_ms());

        if cancel.is_cancelled() {
            return Err(SyncError::new(final_stats, SyncErrorKind::Cancelled));
        }
        if let Some(err) = scan_error {
            return Err(SyncError::new(final_stats, SyncErrorKind::ScanFailed(err)));
        }
        Ok(final_stats)
    }

    async fn run_incremental_inner(
        &self,
        run_id: TaskRunId,
        server_id: &str,
        job: &Job,
        events: Vec<IncrementalEvent>,
        cancel: CancellationToken,
    ) -> Result<Stats, SyncError> {
        let mut stats = Stats::started(self.clock.epoch_ms());

        let (deletes, upserts): (Vec<_>, Vec<_>) = events
            .into_iter()
            .partition(|e| e.op == IncrementalOp::Delete);

        for event in deletes {
            if cancel.is_cancelled() {
                stats.finish(self.clock.epoch_ms());
                return Err(SyncError::new(stats, SyncErrorKind::Cancelled));
            }
            match relative_output_path(&event.path, &job.target_root) {
                Ok(relative) => {
                    if let Err(e) = self.writer.delete(&relative).await {
                        stats.record_error(&event.path, e.to_string());
                        self.emit(
                            run_id.clone(),
                            RunEventOp::Delete,
                            RunEventStatus::Failed,
                            &event.path,
                            &relative,
                            Some(e.to_string()),
                        );
                        continue;
                    }
                    let _ = self.writer.prune_empty_parents(&relative).await;
                    stats.deleted_orphans += 1;
                    self.emit(
                        run_id.clone(),
                        RunEventOp::Delete,
                        RunEventStatus::Success,
                        &event.path,
                        &relative,
                        None,
                    );
                }
                Err(e) => stats.record_error(&event.path, e.to_string()),
            }
        }

        let stats = Arc::new(Mutex::new(stats));
        let semaphore = Arc::new(Semaphore::new(job.options.effective_max_concurrency()));
        let mut tasks: JoinSet<()> = JoinSet::new();

        for event in upserts {
            if cancel.is_cancelled() {
                break;
            }
            let entry = synth_remote_entry(job, &event);
            self.classify_and_spawn(
                &mut tasks,
                semaphore.clone(),
                stats.clone(),
                None,
                run_id.clone(),
                server_id.to_string(),
                job,
                entry,
                cancel.clone(),
            );
        }
        while tasks.join_next().await.is_some() {}

        let mut final_stats = stats.lock().clone();
        final_stats.finish(self.clock.epoch_ms());
        if cancel.is_cancelled() {
            return Err(SyncError::new(final_stats, SyncErrorKind::Cancelled));
        }
        Ok(final_stats)
    }

    /// Classify one scanned entry (§4.C pipeline step 2) and, if it
    /// survives filtering, spawn a bounded task to process it (step 3).
    #[allow(clippy::too_many_arguments)]
    fn classify_and_spawn(
        &self,
        tasks: &mut JoinSet<()>,
        semaphore: Arc<Semaphore>,
        stats: Arc<Mutex<Stats>>,
        index: Option<Arc<Mutex<HashSet<String>>>>,
        run_id: TaskRunId,
        server_id: String,
        job: &Job,
        entry: RemoteEntry,
        cancel: CancellationToken,
    ) {
        if entry.is_dir {
            stats.lock().total_dirs += 1;
            return;
        }
        stats.lock().total_files += 1;

        let rel = source_relative_path(&entry.path, &job.source_root);
        if job
            .options
            .exclude_dirs
            .iter()
            .any(|d| rel.starts_with(d.trim_matches('/')))
            || !job.options.accepts_extension(&entry.name)
            || (job.options.min_file_size > 0 && entry.size < job.options.min_file_size)
        {
            stats.lock().filtered += 1;
            return;
        }

        let relative_output = match relative_output_path(&rel, &job.target_root) {
            Ok(p) => p,
            Err(e) => {
                stats.lock().record_error(&entry.path, e.to_string());
                return;
            }
        };
        if let Some(index) = &index {
            index.lock().insert(relative_output.clone());
        }

        let driver = self.driver.clone();
        let writer = self.writer.clone();
        let sink = self.sink.clone();
        let epoch_ms = self.clock.epoch_ms();
        let opts = job.options.clone();
        let entry_path = entry.path.clone();

        tasks.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(p) => p,
                Err(_) => return,
            };
            if cancel.is_cancelled() {
                return;
            }
            process_file(
                driver,
                writer,
                sink,
                epoch_ms,
                run_id,
                server_id,
                opts,
                entry,
                entry_path,
                rel,
                relative_output,
                stats,
            )
            .await;
        });
    }

    /// Delete every `.strm` file under `target_root` whose normalised
    /// relative path is absent from `remote_index` (§4.C `CleanOrphans`).
    pub async fn clean_orphans(
        &self,
        remote_index: &HashSet<String>,
        stats: &mut Stats,
    ) -> Result<(), WriterError> {
        let root = self.writer.root().to_path_buf();
        let mut stack = vec![root.clone()];
        while let Some(dir) = stack.pop() {
            let mut read_dir = match tokio::fs::read_dir(&dir).await {
                Ok(rd) => rd,
                Err(_) => continue,
            };
            while let Ok(Some(entry)) = read_dir.next_entry().await {
                let path = entry.path();
                let Ok(meta) = entry.metadata().await else {
                    continue;
                };
                if meta.is_dir() {
                    stack.push(path);
                    continue;
                }
                if path.extension().and_then(|e| e.to_str()) != Some("strm") {
                    continue;
                }
                let relative = path
                    .strip_prefix(&root)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .replace('\\', "/");
                if !remote_index.contains(&relative) {
                    self.writer.delete(&relative).await?;
                    self.writer.prune_empty_parents(&relative).await?;
                    stats.deleted_orphans += 1;
                }
            }
        }
        Ok(())
    }

    fn emit(
        &self,
        run_id: TaskRunId,
        op: RunEventOp,
        status: RunEventStatus,
        source_path: &str,
        target_path: &str,
        error_message: Option<String>,
    ) {
        let event = RunEvent {
            run_id,
            op,
            status,
            source_path: source_path.to_string(),
            target_path: target_path.to_string(),
            error_message,
            timestamp_ms: self.clock.epoch_ms(),
        };
        if self.sink.append(event).is_err() {
            tracing::debug!("run event sink dropped event");
        }
    }
}

/// Process one surviving file through `BuildStrmInfo` → replace rules →
/// `DecideUpdate` → write (§4.C pipeline step 3).
#[allow(clippy::too_many_arguments)]
async fn process_file(
    driver: Arc<dyn Driver>,
    writer: Arc<StrmWriter>,
    sink: Arc<dyn RunEventSink>,
    now_ms: u64,
    run_id: TaskRunId,
    server_id: String,
    opts: strmsync_core::JobOptions,
    entry: RemoteEntry,
    entry_path: String,
    source_relative: String,
    relative_output: String,
    stats: Arc<Mutex<Stats>>,
) {
    let emit = |op: RunEventOp, status: RunEventStatus, error_message: Option<String>| {
        let event = RunEvent {
            run_id: run_id.clone(),
            op,
            status,
            source_path: entry_path.clone(),
            target_path: relative_output.clone(),
            error_message,
            timestamp_ms: now_ms,
        };
        let _ = sink.append(event);
    };

    let strm_info = match driver
        .build_strm_info(BuildStrmInfoParams {
            server_id,
            remote_path: entry_path.clone(),
            remote_meta: Some(entry.clone()),
            strm_mode: opts.strm_mode,
        })
        .await
    {
        Ok(info) => info,
        Err(e) => {
            stats.lock().record_error(&entry_path, e.to_string());
            emit(RunEventOp::Update, RunEventStatus::Failed, Some(e.to_string()));
            return;
        }
    };

    let mut content = strm_info.raw_url;
    if let Some(mapping) = &opts.mount_mapping {
        content = mapping.apply(&content);
    }
    for rule in &opts.strm_replace_rules {
        content = rule.apply(&content);
    }

    if opts.dry_run {
        let mut stats = stats.lock();
        stats.skipped += 1;
        drop(stats);
        emit(RunEventOp::Skip, RunEventStatus::Skipped, None);
        return;
    }

    let full_path = writer.root().join(&relative_output);
    let existing_meta = tokio::fs::metadata(&full_path).await.ok();
    let local_exists = existing_meta.is_some();

    if opts.skip_existing && local_exists {
        let mut stats = stats.lock();
        stats.skipped += 1;
        drop(stats);
        emit(RunEventOp::Skip, RunEventStatus::Skipped, None);
        return;
    }

    let local_mod_time_ms = existing_meta
        .as_ref()
        .and_then(|m| m.modified().ok())
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    let content_equal = if local_exists {
        match writer.read(&relative_output).await {
            Ok(existing) => existing.trim() == content.trim(),
            Err(_) => false,
        }
    } else {
        false
    };

    let remote_mod_time_ms = entry.normalized_mod_time_ms();
    let (should_update, reason) = decide_update(DecisionInput {
        local_exists,
        local_mod_time_ms,
        remote_mod_time_ms,
        content_equal,
        force_update: opts.force_update,
        mod_time_epsilon_secs: opts.effective_mod_time_epsilon_secs(),
    });

    if !should_update {
        let mut stats = stats.lock();
        stats.skipped += 1;
        stats.skipped_unchanged += 1;
        drop(stats);
        emit(RunEventOp::Skip, RunEventStatus::Skipped, None);
        return;
    }

    match writer
        .write(&relative_output, &content, remote_mod_time_ms)
        .await
    {
        Ok(()) => {
            let mut stats = stats.lock();
            stats.processed += 1;
            if reason == DecisionReason::New {
                stats.created += 1;
                drop(stats);
                emit(RunEventOp::Create, RunEventStatus::Success, None);
            } else {
                stats.updated += 1;
                if reason == DecisionReason::ModTime {
                    stats.updated_by_modtime += 1;
                }
                drop(stats);
                emit(RunEventOp::Update, RunEventStatus::Success, None);
            }
        }
        Err(e) => {
            stats.lock().record_error(&source_relative, e.to_string());
            emit(RunEventOp::Update, RunEventStatus::Failed, Some(e.to_string()));
        }
    }
}

/// `entry.path` relative to `source_root`, both lexically normalised to
/// Unix form (§4.C step 2 exclude-dir matching basis).
fn source_relative_path(entry_path: &str, source_root: &str) -> String {
    let entry = strmsync_core::path_map::clean_unix_relative(entry_path);
    let root = strmsync_core::path_map::clean_unix_relative(source_root);
    entry
        .strip_prefix(root.as_str())
        .map(|s| s.trim_start_matches('/').to_string())
        .unwrap_or(entry)
}

/// Compute the `.strm` output path for a source-root-relative path and
/// return it relative to `target_root`, bridging `map_output_path`'s
/// absolute result (and its path-escape check) to the relative strings
/// `StrmWriter` expects (§4.C output-path mapping).
fn relative_output_path(
    source_relative: &str,
    target_root: &str,
) -> Result<String, strmsync_core::PathMapError> {
    let target_root_path = Path::new(target_root);
    let absolute = map_output_path(source_relative, target_root_path)?;
    Ok(absolute
        .strip_prefix(target_root_path)
        .unwrap_or(&absolute)
        .to_string_lossy()
        .replace('\\', "/"))
}

fn synth_remote_entry(job: &Job, event: &IncrementalEvent) -> RemoteEntry {
    let full_path = format!(
        "{}/{}",
        job.source_root.trim_end_matches('/'),
        event.path.trim_start_matches('/')
    );
    let name = event
        .path
        .rsplit('/')
        .next()
        .unwrap_or(&event.path)
        .to_string();
    RemoteEntry {
        path: full_path,
        name,
        size: event.size.unwrap_or(0),
        mod_time_ms: event.mod_time_ms.unwrap_or(0),
        is_dir: false,
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
