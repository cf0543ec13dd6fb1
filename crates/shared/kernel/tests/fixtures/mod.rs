#![allow(dead_code, unreachable_pub)]

use async_trait::async_trait;
use confhub_kernel::domain::{Capabilities, NamingMetadata};
use confhub_kernel::{
    Config, ConfigsService, Document, FileStream, FileSystemError, FileSystemPort,
    SerializationError, SerializationPort,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const APP_DIR: &str = "/app";

/// In-memory [`FileSystemPort`] with optional latency on every read and write.
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    root: PathBuf,
    files: Arc<Mutex<BTreeMap<PathBuf, Vec<u8>>>>,
    latency: Duration,
    commits: Arc<AtomicUsize>,
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self {
            root: PathBuf::from(APP_DIR),
            files: Arc::default(),
            latency: Duration::ZERO,
            commits: Arc::default(),
        }
    }
}

impl MemoryFileSystem {
    #[must_use]
    pub fn with_latency(latency: Duration) -> Self {
        Self { latency, ..Self::default() }
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.lock().get(path.as_ref()).cloned()
    }

    pub fn get_json(&self, path: impl AsRef<Path>) -> Option<serde_json::Value> {
        self.get(path).map(|bytes| serde_json::from_slice(&bytes).unwrap())
    }

    pub fn put(&self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.files.lock().insert(path.into(), bytes.into());
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().keys().cloned().collect()
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn stream(&self, path: &Path) -> Box<dyn FileStream> {
        Box::new(MemoryStream {
            path: path.to_path_buf(),
            buffer: Vec::new(),
            fs: self.clone(),
        })
    }
}

#[derive(Debug)]
struct MemoryStream {
    path: PathBuf,
    buffer: Vec<u8>,
    fs: MemoryFileSystem,
}

#[async_trait]
impl FileStream for MemoryStream {
    async fn write_all(&mut self, data: &[u8]) -> Result<(), FileSystemError> {
        self.fs.delay().await;
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), FileSystemError> {
        let Self { path, buffer, fs } = *self;
        fs.files.lock().insert(path, buffer);
        fs.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl FileSystemPort for MemoryFileSystem {
    async fn exists(&self, path: &Path) -> Result<bool, FileSystemError> {
        Ok(self.files.lock().contains_key(path))
    }

    async fn create(&self, path: &Path) -> Result<Box<dyn FileStream>, FileSystemError> {
        Ok(self.stream(path))
    }

    async fn open_for_overwrite(
        &self,
        path: &Path,
    ) -> Result<Box<dyn FileStream>, FileSystemError> {
        if !self.files.lock().contains_key(path) {
            return Err(not_found(path));
        }
        Ok(self.stream(path))
    }

    async fn delete(&self, path: &Path) -> Result<(), FileSystemError> {
        self.files.lock().remove(path).map(drop).ok_or_else(|| not_found(path))
    }

    async fn read_all_bytes(&self, path: &Path) -> Result<Vec<u8>, FileSystemError> {
        self.delay().await;
        self.get(path).ok_or_else(|| not_found(path))
    }

    async fn create_directories_along_path(&self, _path: &Path) -> Result<(), FileSystemError> {
        Ok(())
    }

    fn application_directory(&self) -> &Path {
        &self.root
    }
}

fn not_found(path: &Path) -> FileSystemError {
    FileSystemError::NotFound { message: path.display().to_string().into(), context: None }
}

/// Pretty JSON [`SerializationPort`].
#[derive(Debug, Default)]
pub struct JsonPort;

#[async_trait]
impl SerializationPort for JsonPort {
    async fn serialize(&self, document: &Document) -> Result<Vec<u8>, SerializationError> {
        serde_json::to_vec_pretty(document).map_err(SerializationError::encode)
    }

    async fn deserialize(&self, data: &[u8]) -> Result<Document, SerializationError> {
        serde_json::from_slice(data).map_err(SerializationError::decode)
    }
}

pub fn service(fs: &MemoryFileSystem) -> ConfigsService {
    ConfigsService::builder()
        .file_system(Arc::new(fs.clone()))
        .serializer(Arc::new(JsonPort))
        .build()
        .expect("Service setup failed")
}

pub fn app_path(relative: &str) -> PathBuf {
    Path::new(APP_DIR).join(relative)
}

// --- Config types -----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Counter {
    pub count: u32,
}

impl Config for Counter {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub name: String,
    pub items: Vec<u32>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self { name: "default".into(), items: vec![1, 2, 3] }
    }
}

impl Config for Catalog {
    fn naming() -> NamingMetadata {
        NamingMetadata::new().file_name("catalog.json").directory("data")
    }
}

/// Runs every hook; `limit == 0` fails the correctness check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guarded {
    pub limit: u32,
    pub saves: u32,
    #[serde(skip)]
    pub loaded: bool,
}

impl Default for Guarded {
    fn default() -> Self {
        Self { limit: 10, saves: 0, loaded: false }
    }
}

#[async_trait]
impl Config for Guarded {
    const CAPABILITIES: Capabilities = Capabilities::all();

    fn on_before_serialize(&mut self) {
        self.saves += 1;
    }

    fn on_after_deserialize(&mut self) {
        self.loaded = true;
    }

    async fn check_data_correctness(&self) -> Result<(), Cow<'static, str>> {
        if self.limit == 0 {
            return Err("limit must be positive".into());
        }
        Ok(())
    }
}

/// Keeps a runtime-only cache across loads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cached {
    pub count: u32,
    #[serde(skip)]
    pub cache: u32,
}

impl Config for Cached {
    fn populate_from(&mut self, loaded: Self) {
        self.count = loaded.count;
    }
}

/// Same hooks as [`Guarded`] but declares no capability, so none of them run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Undeclared {
    pub limit: u32,
    pub saves: u32,
}

#[async_trait]
impl Config for Undeclared {
    fn on_before_serialize(&mut self) {
        self.saves += 1;
    }

    async fn check_data_correctness(&self) -> Result<(), Cow<'static, str>> {
        Err("never called".into())
    }
}
