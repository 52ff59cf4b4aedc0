//! Common test utilities and fixtures
//!
//! Shared helpers for sca CLI tests.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A store whose `Store` component reaches `Catalog` by explicit target and
/// exposes its own service over binding.ws
pub const STORE_TOML: &str = r#"
deployable = "Store"

[[composite]]
name = "Store"

[[composite.component]]
name = "Catalog"

[composite.component.implementation]
kind = "atomic"
type = "implementation.java"

[[composite.component.implementation.service]]
name = "Catalog"
interface = { interface = { name = "CatalogService" } }

[[composite.component]]
name = "Store"

[composite.component.implementation]
kind = "atomic"
type = "implementation.java"

[[composite.component.implementation.service]]
name = "Store"
interface = { interface = { name = "StoreService" } }

[[composite.component.implementation.service.binding]]
type = "binding.ws"

[[composite.component.implementation.reference]]
name = "catalog"
interface = { interface = { name = "CatalogService" } }
targets = ["Catalog"]
"#;

/// A single component whose required reference has no target
pub const DANGLING_JSON: &str = r#"{
    "deployable": "Orders",
    "composite": [{
        "name": "Orders",
        "component": [{
            "name": "Checkout",
            "implementation": {
                "kind": "atomic",
                "type": "implementation.java",
                "reference": [{ "name": "payments", "multiplicity": "1..1" }]
            }
        }]
    }]
}"#;

/// Creates a temporary directory for test fixtures
pub fn create_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Write `content` to `name` inside `dir`
pub fn write_descriptor(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("Failed to write descriptor");
    path
}

/// The `sca` binary with config and data directories inside `home`
pub fn sca(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sca").expect("sca binary should be built");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("XDG_DATA_HOME", home.join(".local/share"))
        .env_remove("SCA_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}
