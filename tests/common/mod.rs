//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use drive_sync::notify::{Notification, Notifier};
use drive_sync::prompt::{AutoPrompt, Decision};
use drive_sync::remote::{RemoteError, RemoteFileGateway, RemoteFileMetadata};
use drive_sync::snapshot::{LocalSnapshot, LocalSnapshotStore};
use drive_sync::sync::{SyncConfig, SyncConfigStore, SyncEngine};

pub fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

pub fn snapshot_at(last_active: &str, marker: &str) -> LocalSnapshot {
    let mut state = Map::new();
    state.insert("marker".to_string(), json!(marker));
    LocalSnapshot::new(ts(last_active), state)
}

pub fn snapshot_bytes(last_active: &str, marker: &str) -> Vec<u8> {
    snapshot_at(last_active, marker).to_bytes().unwrap()
}

/// Gateway call, recorded in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FindByName(String),
    GetMetadata(String),
    ReadContent(String),
    WriteContent(Option<String>, String),
}

#[derive(Debug, Clone)]
struct StoredFile {
    name: String,
    modified_at: DateTime<Utc>,
    content: Vec<u8>,
}

#[derive(Default)]
struct GatewayState {
    files: BTreeMap<String, StoredFile>,
    calls: Vec<Call>,
    next_id: usize,
    unavailable: bool,
}

/// Drive held in memory. Writes are stamped with an explicit clock that
/// advances one second per write.
pub struct MemoryGateway {
    state: Mutex<GatewayState>,
    clock: Mutex<DateTime<Utc>>,
    write_gate: Mutex<Option<(Arc<Notify>, Arc<Notify>)>>,
}

impl MemoryGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(MemoryGateway {
            state: Mutex::new(GatewayState::default()),
            clock: Mutex::new(ts("2024-06-01T00:00:00Z")),
            write_gate: Mutex::new(None),
        })
    }

    pub fn insert_file(&self, id: &str, name: &str, modified_at: DateTime<Utc>, content: Vec<u8>) {
        self.state.lock().unwrap().files.insert(
            id.to_string(),
            StoredFile {
                name: name.to_string(),
                modified_at,
                content,
            },
        );
    }

    pub fn set_clock(&self, now: DateTime<Utc>) {
        *self.clock.lock().unwrap() = now;
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap().unavailable = unavailable;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::WriteContent(..)))
            .collect()
    }

    pub fn content(&self, id: &str) -> Option<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(id)
            .map(|f| f.content.clone())
    }

    pub fn file_count(&self) -> usize {
        self.state.lock().unwrap().files.len()
    }

    /// Block every write until `release` is notified; `entered` fires when a write starts.
    pub fn gate_writes(&self) -> (Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *self.write_gate.lock().unwrap() = Some((entered.clone(), release.clone()));
        (entered, release)
    }

    /// Let writes through again.
    pub fn ungate_writes(&self) {
        *self.write_gate.lock().unwrap() = None;
    }

    fn record(&self, call: Call) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.unavailable {
            return Err(RemoteError::Unavailable("offline".to_string()));
        }
        Ok(())
    }

    fn metadata(id: &str, file: &StoredFile) -> RemoteFileMetadata {
        RemoteFileMetadata {
            id: id.to_string(),
            name: file.name.clone(),
            modified_at: file.modified_at,
        }
    }
}

#[async_trait]
impl RemoteFileGateway for MemoryGateway {
    async fn find_by_name(&self, name: &str) -> Result<Vec<RemoteFileMetadata>, RemoteError> {
        self.record(Call::FindByName(name.to_string()))?;
        let state = self.state.lock().unwrap();
        Ok(state
            .files
            .iter()
            .filter(|(_, f)| f.name == name)
            .map(|(id, f)| Self::metadata(id, f))
            .collect())
    }

    async fn get_metadata(&self, id: &str) -> Result<RemoteFileMetadata, RemoteError> {
        self.record(Call::GetMetadata(id.to_string()))?;
        let state = self.state.lock().unwrap();
        state
            .files
            .get(id)
            .map(|f| Self::metadata(id, f))
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))
    }

    async fn read_content(&self, id: &str) -> Result<Vec<u8>, RemoteError> {
        self.record(Call::ReadContent(id.to_string()))?;
        let state = self.state.lock().unwrap();
        state
            .files
            .get(id)
            .map(|f| f.content.clone())
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))
    }

    async fn write_content(
        &self,
        id: Option<&str>,
        name: &str,
        content: &[u8],
    ) -> Result<RemoteFileMetadata, RemoteError> {
        self.record(Call::WriteContent(
            id.map(str::to_string),
            name.to_string(),
        ))?;

        let gate = self.write_gate.lock().unwrap().clone();
        if let Some((entered, release)) = gate {
            entered.notify_one();
            release.notified().await;
        }

        let modified_at = {
            let mut clock = self.clock.lock().unwrap();
            let now = *clock;
            *clock = now + Duration::seconds(1);
            now
        };

        let mut state = self.state.lock().unwrap();
        let id = match id {
            Some(id) if state.files.contains_key(id) => id.to_string(),
            Some(id) => return Err(RemoteError::NotFound(id.to_string())),
            None => {
                state.next_id += 1;
                format!("file-{}", state.next_id)
            }
        };
        let file = StoredFile {
            name: name.to_string(),
            modified_at,
            content: content.to_vec(),
        };
        let metadata = Self::metadata(&id, &file);
        state.files.insert(id, file);
        Ok(metadata)
    }
}

/// Local application state held in memory
pub struct MemorySnapshotStore {
    snapshot: Mutex<LocalSnapshot>,
    overwrites: Mutex<usize>,
    fail_capture: Mutex<bool>,
}

impl MemorySnapshotStore {
    pub fn new(snapshot: LocalSnapshot) -> Arc<Self> {
        Arc::new(MemorySnapshotStore {
            snapshot: Mutex::new(snapshot),
            overwrites: Mutex::new(0),
            fail_capture: Mutex::new(false),
        })
    }

    pub fn current(&self) -> LocalSnapshot {
        self.snapshot.lock().unwrap().clone()
    }

    pub fn marker(&self) -> Value {
        self.current().state.get("marker").cloned().unwrap_or(Value::Null)
    }

    pub fn overwrite_count(&self) -> usize {
        *self.overwrites.lock().unwrap()
    }

    pub fn set_fail_capture(&self, fail: bool) {
        *self.fail_capture.lock().unwrap() = fail;
    }
}

impl LocalSnapshotStore for MemorySnapshotStore {
    fn capture(&self) -> Result<LocalSnapshot> {
        if *self.fail_capture.lock().unwrap() {
            return Err(anyhow!("local data is corrupt"));
        }
        Ok(self.current())
    }

    fn overwrite(&self, snapshot: &LocalSnapshot) -> Result<()> {
        *self.snapshot.lock().unwrap() = snapshot.clone();
        *self.overwrites.lock().unwrap() += 1;
        Ok(())
    }

    fn local_last_active(&self) -> Result<DateTime<Utc>> {
        Ok(self.current().last_active_time)
    }
}

/// Config store that keeps the last saved config
pub struct MemoryConfigStore {
    saved: Mutex<SyncConfig>,
    saves: Mutex<usize>,
}

impl MemoryConfigStore {
    pub fn new(config: SyncConfig) -> Arc<Self> {
        Arc::new(MemoryConfigStore {
            saved: Mutex::new(config),
            saves: Mutex::new(0),
        })
    }

    pub fn saved(&self) -> SyncConfig {
        self.saved.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }

    /// Change the stored config the way another process would.
    pub fn edit(&self, f: impl FnOnce(&mut SyncConfig)) {
        f(&mut *self.saved.lock().unwrap());
    }
}

impl SyncConfigStore for MemoryConfigStore {
    fn load(&self) -> Result<SyncConfig> {
        Ok(self.saved())
    }

    fn save(&self, config: &SyncConfig) -> Result<()> {
        *self.saved.lock().unwrap() = config.clone();
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

/// Notifier that remembers everything it was asked to show
#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn seen(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

/// Engine wired to in-memory collaborators
pub struct Harness {
    pub engine: Arc<SyncEngine>,
    pub gateway: Arc<MemoryGateway>,
    pub snapshots: Arc<MemorySnapshotStore>,
    pub prompt: Arc<AutoPrompt>,
    pub config_store: Arc<MemoryConfigStore>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new(config: SyncConfig, local: LocalSnapshot, prompt: AutoPrompt) -> Self {
        Self::with_gateway(config, local, prompt, MemoryGateway::new())
    }

    pub fn with_gateway(
        config: SyncConfig,
        local: LocalSnapshot,
        prompt: AutoPrompt,
        gateway: Arc<MemoryGateway>,
    ) -> Self {
        let snapshots = MemorySnapshotStore::new(local);
        let prompt = Arc::new(prompt);
        let config_store = MemoryConfigStore::new(config);
        let notifier = Arc::new(RecordingNotifier::default());

        let engine = SyncEngine::new(
            gateway.clone(),
            snapshots.clone(),
            prompt.clone(),
            config_store.clone(),
            notifier.clone(),
        )
        .unwrap();

        Harness {
            engine: Arc::new(engine),
            gateway,
            snapshots,
            prompt,
            config_store,
            notifier,
        }
    }

    pub async fn config(&self) -> SyncConfig {
        self.engine.config().await
    }
}

/// Prompt that cancels everything
pub fn cancel_all() -> AutoPrompt {
    AutoPrompt::new(Decision::Cancel)
}

/// Config with a provisioned remote file
pub fn provisioned_config(id: &str, last_sync_to_remote: &str) -> SyncConfig {
    SyncConfig {
        is_enabled: true,
        sync_file_name: "sync.json".to_string(),
        remote_file_id: Some(id.to_string()),
        last_sync_to_remote: ts(last_sync_to_remote),
        last_local_update: ts(last_sync_to_remote),
        last_sync_from_remote: ts(last_sync_to_remote),
        ..Default::default()
    }
}
