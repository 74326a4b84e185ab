//! In-memory fakes of the store traits and a scripted LLM provider.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use tutor_types::chat::{LogEntry, LogTable};
use tutor_types::error::{ArchiveError, SummaryError};
use tutor_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};

use crate::llm::provider::LlmProvider;
use crate::storage::archive_store::{CheckpointStore, SnapshotStore, SummaryStore};
use crate::storage::snapshot::SnapshotRef;

#[derive(Default)]
struct ArchiveState {
    snapshots: BTreeMap<SnapshotRef, Vec<LogEntry>>,
    corrupt: HashSet<SnapshotRef>,
    failing_students: HashSet<String>,
    checkpoint: Option<LogTable>,
    checkpoint_writes: usize,
    summaries: BTreeMap<String, String>,
    summary_writes: usize,
    fail_summaries: bool,
}

/// Archive that keeps snapshots, the checkpoint and summaries in memory.
#[derive(Default)]
pub struct MemoryArchive {
    state: Mutex<ArchiveState>,
}

impl MemoryArchive {
    pub fn snapshots(&self) -> Vec<SnapshotRef> {
        self.state.lock().unwrap().snapshots.keys().cloned().collect()
    }

    pub fn snapshot(&self, snapshot: &SnapshotRef) -> Option<Vec<LogEntry>> {
        self.state.lock().unwrap().snapshots.get(snapshot).cloned()
    }

    pub fn put_snapshot(&self, snapshot: SnapshotRef, entries: Vec<LogEntry>) {
        self.state.lock().unwrap().snapshots.insert(snapshot, entries);
    }

    /// Listed, but unreadable.
    pub fn put_corrupt_snapshot(&self, snapshot: SnapshotRef) {
        let mut state = self.state.lock().unwrap();
        state.snapshots.insert(snapshot.clone(), Vec::new());
        state.corrupt.insert(snapshot);
    }

    pub fn fail_snapshots_for(&self, student_id: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_students
            .insert(student_id.to_string());
    }

    pub fn heal_snapshots(&self) {
        self.state.lock().unwrap().failing_students.clear();
    }

    pub fn checkpoint(&self) -> Option<LogTable> {
        self.state.lock().unwrap().checkpoint.clone()
    }

    pub fn put_checkpoint(&self, table: LogTable) {
        self.state.lock().unwrap().checkpoint = Some(table);
    }

    pub fn checkpoint_writes(&self) -> usize {
        self.state.lock().unwrap().checkpoint_writes
    }

    pub fn put_summary(&self, student_id: &str, text: &str) {
        self.state
            .lock()
            .unwrap()
            .summaries
            .insert(student_id.to_string(), text.to_string());
    }

    pub fn summary(&self, student_id: &str) -> Option<String> {
        self.state.lock().unwrap().summaries.get(student_id).cloned()
    }

    pub fn summary_writes(&self) -> usize {
        self.state.lock().unwrap().summary_writes
    }

    pub fn fail_summary_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_summaries = fail;
    }
}

impl SnapshotStore for MemoryArchive {
    async fn write_snapshot(
        &self,
        snapshot: &SnapshotRef,
        entries: &[LogEntry],
    ) -> Result<(), ArchiveError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_students.contains(&snapshot.student_id) {
            return Err(ArchiveError::Io("disk full".to_string()));
        }
        state.snapshots.insert(snapshot.clone(), entries.to_vec());
        Ok(())
    }

    async fn list_snapshots(&self) -> Result<Vec<SnapshotRef>, ArchiveError> {
        Ok(self.snapshots())
    }

    async fn read_snapshot(&self, snapshot: &SnapshotRef) -> Result<Vec<LogEntry>, ArchiveError> {
        let state = self.state.lock().unwrap();
        if state.corrupt.contains(snapshot) {
            return Err(ArchiveError::CorruptSnapshot {
                file: snapshot.file_name(),
                reason: "expected value at line 1 column 1".to_string(),
            });
        }
        state
            .snapshots
            .get(snapshot)
            .cloned()
            .ok_or_else(|| ArchiveError::Io(format!("{} not found", snapshot.file_name())))
    }
}

impl CheckpointStore for MemoryArchive {
    async fn write_checkpoint(&self, table: &LogTable) -> Result<(), ArchiveError> {
        let mut state = self.state.lock().unwrap();
        state.checkpoint = Some(table.clone());
        state.checkpoint_writes += 1;
        Ok(())
    }

    async fn read_checkpoint(&self) -> Result<Option<LogTable>, ArchiveError> {
        Ok(self.checkpoint())
    }

    async fn remove_checkpoint(&self) -> Result<bool, ArchiveError> {
        Ok(self.state.lock().unwrap().checkpoint.take().is_some())
    }
}

impl SummaryStore for MemoryArchive {
    async fn load_summary(&self, student_id: &str) -> Result<Option<String>, SummaryError> {
        Ok(self.summary(student_id))
    }

    async fn save_summary(&self, student_id: &str, text: &str) -> Result<(), SummaryError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_summaries {
            return Err(SummaryError::Store("read-only filesystem".to_string()));
        }
        state
            .summaries
            .insert(student_id.to_string(), text.to_string());
        state.summary_writes += 1;
        Ok(())
    }
}

/// One scripted provider response.
pub enum Step {
    Reply(String),
    Fail(String),
    Hang,
}

/// Provider that plays back a fixed script and records every request.
///
/// Clones share the script and the request log.
#[derive(Clone)]
pub struct ScriptedProvider {
    script: Arc<Mutex<VecDeque<Step>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedProvider {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: Arc::new(Mutex::new(steps.into_iter().collect())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn replying<I, T>(replies: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::new(replies.into_iter().map(|r| Step::Reply(r.into())))
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(content)) => Ok(CompletionResponse {
                id: format!("scripted-{}", self.requests.lock().unwrap().len()),
                content,
                model: request.model.clone(),
                usage: Usage::default(),
            }),
            Some(Step::Fail(message)) => Err(LlmError::Provider { message }),
            Some(Step::Hang) => {
                std::future::pending::<()>().await;
                Err(LlmError::EmptyResponse)
            }
            None => Err(LlmError::Provider {
                message: "script exhausted".to_string(),
            }),
        }
    }
}
