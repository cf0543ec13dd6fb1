#![allow(dead_code, unreachable_pub)]

use async_trait::async_trait;
use confhub::prelude::*;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;
use tempfile::TempDir;

pub struct Workspace {
    pub temp: TempDir,
    pub fs: LocalFileSystem,
}

impl Workspace {
    pub async fn new() -> Self {
        let temp = TempDir::new().expect("Temp dir setup failed");
        let fs = LocalFileSystem::builder()
            .root(temp.path().join("app"))
            .connect()
            .await
            .expect("File system setup failed");
        Self { temp, fs }
    }

    pub fn service(&self) -> ConfigsService {
        ConfigsService::builder()
            .file_system(Arc::new(self.fs.clone()))
            .serializer(Arc::new(JsonSerializer::new()))
            .build()
            .expect("Service setup failed")
    }

    pub fn hub(&self, shards: usize) -> ConfigsHub {
        let formatter =
            PathsFormatter::new(Some("instances"), "{id}").expect("Formatter setup failed");
        let hub = ConfigsHub::new(
            Arc::new(self.fs.clone()),
            Arc::new(JsonSerializer::new()),
            formatter,
        );
        for _ in 0..shards {
            hub.add_shard();
        }
        hub
    }

    pub fn read_json(&self, relative: &str) -> serde_json::Value {
        let bytes = std::fs::read(self.fs.root().join(relative)).expect("File should exist");
        serde_json::from_slice(&bytes).expect("File should hold JSON")
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.fs.root().join(relative).is_file()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Counter {
    pub count: u32,
}

impl Config for Counter {}

/// Network settings with a correctness rule and a normalizing load hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub host: String,
    pub port: u16,
    pub peers: Vec<String>,
}

impl Default for Network {
    fn default() -> Self {
        Self { host: "localhost".into(), port: 8080, peers: vec!["alpha".into(), "beta".into()] }
    }
}

#[async_trait]
impl Config for Network {
    const CAPABILITIES: Capabilities =
        Capabilities::AFTER_DESERIALIZE.union(Capabilities::CHECK_CORRECTNESS);

    fn naming() -> NamingMetadata {
        NamingMetadata::new().file_name("network.json").directory("net")
    }

    fn on_after_deserialize(&mut self) {
        self.host = self.host.trim().to_lowercase();
    }

    async fn check_data_correctness(&self) -> Result<(), Cow<'static, str>> {
        if self.port == 0 {
            return Err("port must not be zero".into());
        }
        Ok(())
    }
}
