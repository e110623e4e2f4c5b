//! Shared test doubles: in-memory storage and a scripted transport that
//! record every call they receive.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use filexfer::error::{NetworkError, StorageError};
use filexfer::storage::{Blob, CreateOptions, Entry, FileEntry, FileMetadata, Storage};
use filexfer::transfer::TransferCallbacks;
use filexfer::utils::logging::setup_test_logging;
use filexfer::transport::{ProgressSender, Transport, TransportRequest, TransportResponse};

pub const DEFAULT_ROOT: &str = "/persistent";

/// Callback notifications in the order they fired
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Progress(u64),
    Success,
    Fail(i32),
    Cancel,
}

pub type Events = Arc<Mutex<Vec<Event>>>;

/// Callbacks that append to a shared event log.
pub fn recorder<R: Send + 'static>() -> (Events, TransferCallbacks<R>) {
    setup_test_logging();
    let events: Events = Arc::new(Mutex::new(Vec::new()));
    let (p, s, f, c) = (
        Arc::clone(&events),
        Arc::clone(&events),
        Arc::clone(&events),
        Arc::clone(&events),
    );
    let callbacks = TransferCallbacks::new()
        .on_progress(move |info| p.lock().unwrap().push(Event::Progress(info.loaded)))
        .on_success(move |_| s.lock().unwrap().push(Event::Success))
        .on_fail(move |e| f.lock().unwrap().push(Event::Fail(e.code().as_i32())))
        .on_cancel(move || c.lock().unwrap().push(Event::Cancel));
    (events, callbacks)
}

pub fn snapshot(events: &Events) -> Vec<Event> {
    events.lock().unwrap().clone()
}

/// Number of terminal notifications in `events`
pub fn terminal_count(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|e| !matches!(e, Event::Progress(_)))
        .count()
}

/// In-memory storage with switchable failures
#[derive(Default)]
pub struct MemoryStorage {
    pub external_root: Option<String>,
    pub directories: HashSet<String>,
    pub default_root_fails: bool,
    pub create_fails: bool,
    pub write_fails: bool,
    pub write_hangs: bool,
    pub(crate) files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    pub(crate) calls: Mutex<Vec<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_directory(mut self, location: &str) -> Self {
        self.directories.insert(location.to_string());
        self
    }

    pub fn with_file(self, path: &str, bytes: &[u8]) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(PathBuf::from(path), bytes.to_vec());
        self
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(&PathBuf::from(path)).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn path_of(uri: &str) -> PathBuf {
        PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri))
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    fn external_storage_root(&self) -> Option<String> {
        self.external_root.clone()
    }

    async fn resolve_path(&self, location: &str) -> Result<Entry, StorageError> {
        self.record(format!("resolve_path {}", location));
        if self.directories.contains(location) {
            Ok(Entry::new(location))
        } else {
            Err(StorageError::DirectoryNotFound(location.to_string()))
        }
    }

    async fn default_root(&self) -> Result<Entry, StorageError> {
        self.record("default_root".to_string());
        if self.default_root_fails {
            Err(StorageError::Unavailable("no persistent file system".to_string()))
        } else {
            Ok(Entry::new(DEFAULT_ROOT))
        }
    }

    async fn create_file(
        &self,
        dir: &Entry,
        name: &str,
        _options: CreateOptions,
    ) -> Result<FileEntry, StorageError> {
        self.record(format!("create_file {}", name));
        if self.create_fails {
            return Err(StorageError::PermissionDenied(name.to_string()));
        }
        let path = dir.path().join(name);
        self.files.lock().unwrap().entry(path.clone()).or_default();
        Ok(FileEntry::new(name, path))
    }

    async fn write_file(&self, file: &FileEntry, blob: &Blob) -> Result<(), StorageError> {
        self.record(format!("write_file {}", file.name()));
        if self.write_hangs {
            std::future::pending::<()>().await;
        }
        if self.write_fails {
            return Err(StorageError::Unavailable("disk full".to_string()));
        }
        self.files
            .lock()
            .unwrap()
            .insert(file.path().to_path_buf(), blob.bytes().to_vec());
        Ok(())
    }

    async fn remove_file(&self, file: &FileEntry) -> Result<(), StorageError> {
        self.record(format!("remove_file {}", file.name()));
        self.files.lock().unwrap().remove(file.path());
        Ok(())
    }

    async fn resolve_file(&self, uri: &str) -> Result<FileEntry, StorageError> {
        self.record(format!("resolve_file {}", uri));
        let path = Self::path_of(uri);
        if !self.files.lock().unwrap().contains_key(&path) {
            return Err(StorageError::FileNotFound(uri.to_string()));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(FileEntry::new(name, path))
    }

    async fn metadata(&self, file: &FileEntry) -> Result<FileMetadata, StorageError> {
        self.record(format!("metadata {}", file.name()));
        let size = self
            .files
            .lock()
            .unwrap()
            .get(file.path())
            .map(|bytes| bytes.len() as u64)
            .ok_or_else(|| StorageError::FileNotFound(file.name().to_string()))?;
        Ok(FileMetadata {
            name: file.name().to_string(),
            size,
        })
    }

    async fn read_bytes(&self, file: &FileEntry) -> Result<Vec<u8>, StorageError> {
        self.record(format!("read_bytes {}", file.name()));
        self.files
            .lock()
            .unwrap()
            .get(file.path())
            .cloned()
            .ok_or_else(|| StorageError::FileNotFound(file.name().to_string()))
    }
}

/// What the scripted transport does with a request
pub enum Script {
    /// Reply with `status` and `body`, reporting progress in `chunks` steps
    Respond {
        status: u16,
        body: Vec<u8>,
        chunks: usize,
    },
    /// Reply 200 with `body` after `steps` progress reports spaced by `interval`
    Trickle {
        body: Vec<u8>,
        steps: u64,
        interval: Duration,
    },
    /// Fail at the transport level
    Fail(String),
    /// Never complete
    Hang,
}

/// Transport double that records requests and follows a script
pub struct ScriptedTransport {
    script: Script,
    requests: Mutex<Vec<TransportRequest>>,
    pub started: Notify,
    aborted: Arc<AtomicBool>,
}

struct AbortFlag(Arc<AtomicBool>);

impl Drop for AbortFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl ScriptedTransport {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
            started: Notify::new(),
            aborted: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn ok(body: &[u8], chunks: usize) -> Self {
        Self::new(Script::Respond {
            status: 200,
            body: body.to_vec(),
            chunks,
        })
    }

    pub fn status(status: u16) -> Self {
        Self::new(Script::Respond {
            status,
            body: b"nope".to_vec(),
            chunks: 1,
        })
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Wait until an in-flight request has been dropped by its task.
    pub async fn wait_aborted(&self) -> bool {
        for _ in 0..100 {
            if self.aborted.load(Ordering::SeqCst) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        request: TransportRequest,
        progress: ProgressSender,
    ) -> Result<TransportResponse, NetworkError> {
        self.requests.lock().unwrap().push(request);
        self.started.notify_one();

        match &self.script {
            Script::Respond {
                status,
                body,
                chunks,
            } => {
                let total = body.len() as u64;
                let step = (body.len() / (*chunks).max(1)).max(1);
                let mut loaded = 0usize;
                while loaded < body.len() {
                    loaded = (loaded + step).min(body.len());
                    progress.report(loaded as u64, Some(total));
                    tokio::task::yield_now().await;
                }
                Ok(TransportResponse::new(*status, body.clone()))
            }
            Script::Trickle {
                body,
                steps,
                interval,
            } => {
                let total = body.len() as u64;
                for step in 1..=*steps {
                    tokio::time::sleep(*interval).await;
                    progress.report(total * step / *steps, Some(total));
                }
                Ok(TransportResponse::new(200, body.clone()))
            }
            Script::Fail(message) => Err(NetworkError::Connection(message.clone())),
            Script::Hang => {
                let _flag = AbortFlag(Arc::clone(&self.aborted));
                progress.report(0, None);
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}
