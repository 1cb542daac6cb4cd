//! Test fixture helpers for creating weigh-in projects
//!
//! A project is a temporary directory holding a bundler manifest, the
//! emitted assets it lists and an artifacts directory.

#![allow(dead_code)]

use super::scripted::ScriptedSender;
use super::{CIRCLE_TOKEN, GITHUB_TOKEN, OWNER, REPO};
use circleci_weigh_in::cmd::WeighInSettings;
use circleci_weigh_in::env::Environment;
use circleci_weigh_in::infra::RealFileSystem;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A temporary weigh-in project
pub struct Project {
    temp_dir: TempDir,
}

impl Project {
    /// Create a project whose manifest lists `(asset id, filename, size)`
    pub fn new(assets: &[(&str, &str, usize)]) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let dist = temp_dir.path().join("dist");
        fs::create_dir_all(&dist).unwrap();

        let mut manifest = Map::new();
        for (asset_id, filename, size) in assets {
            fs::write(dist.join(filename), vec![b'x'; *size]).unwrap();
            manifest.insert(asset_id.to_string(), json!(filename));
        }
        fs::write(
            dist.join("manifest.json"),
            Value::Object(manifest).to_string(),
        )
        .unwrap();

        Self { temp_dir }
    }

    /// Project root
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Artifacts directory (not created until the workflow writes to it)
    pub fn artifacts(&self) -> PathBuf {
        self.root().join("artifacts")
    }

    /// Settings for a run against pull request 45 at commit abc123
    pub fn settings(&self) -> WeighInSettings {
        let mut settings = WeighInSettings::new(
            self.root().join("dist/manifest.json"),
            self.root().join("dist"),
            self.artifacts(),
        );
        settings.pull_request_id = Some("45".to_string());
        settings.build_sha = Some("abc123".to_string());
        settings.build_url = Some("https://circleci.com/gh/acme/web/1000".to_string());
        settings.stats_store = self.root().join(".weigh-in/stats.json");
        settings
    }

    /// Read a JSON artifact written by the workflow
    pub fn artifact(&self, filename: &str) -> Value {
        let contents = fs::read_to_string(self.artifacts().join(filename)).unwrap();
        serde_json::from_str(&contents).unwrap()
    }

    /// Whether the workflow wrote `filename`
    pub fn has_artifact(&self, filename: &str) -> bool {
        self.artifacts().join(filename).exists()
    }
}

/// Environment over the real filesystem and a scripted sender
pub fn env(sender: Arc<ScriptedSender>) -> Arc<Environment> {
    Arc::new(Environment {
        request: sender,
        fs: Arc::new(RealFileSystem),
        github_api_token: GITHUB_TOKEN.to_string(),
        circle_api_token: CIRCLE_TOKEN.to_string(),
        repo_owner: OWNER.to_string(),
        repo_name: REPO.to_string(),
    })
}

/// A CircleCI artifact listing entry
pub fn artifact_entry(path: &str, url: &str) -> Value {
    json!({"path": path, "pretty_path": path, "node_index": 0, "url": url})
}

/// A CircleCI build history entry
pub fn build_entry(build_num: u64, status: &str, previous: Option<u64>) -> Value {
    json!({
        "build_num": build_num,
        "status": status,
        "branch": "main",
        "previous_successful_build": previous.map(|n| json!({"build_num": n, "status": "success"})),
    })
}

/// Sender scripted for a pull request on `main` whose latest build 935
/// succeeded and stored `base_stats` as asset-stats.json
pub fn base_build_sender(base_stats: Value) -> Arc<ScriptedSender> {
    ScriptedSender::new()
        .on_get("repos/acme/web/pulls/45", 200, json!({"number": 45, "base": {"ref": "main"}}))
        .on_get(
            "project/github/acme/web/tree/main",
            200,
            json!([build_entry(935, "success", Some(930))]),
        )
        .on_get(
            "project/github/acme/web/935/artifacts",
            200,
            json!([artifact_entry(
                "home/ubuntu/web/artifacts/asset-stats.json",
                "https://935-1-gh.circle-artifacts.com/0/artifacts/asset-stats.json",
            )]),
        )
        .on_get("circle-artifacts.com/0/artifacts/asset-stats.json", 200, base_stats)
        .on_post("repos/acme/web/statuses/abc123", 201, json!({"id": 1}))
}
