//! Integration tests for `sca config`

mod common;

use common::{STORE_TOML, create_temp_dir, sca, write_descriptor};
use predicates::prelude::*;

#[test]
fn test_config_path_honors_env() {
    let home = create_temp_dir();
    let config_path = home.path().join("custom.toml");

    sca(home.path())
        .env("SCA_CONFIG", &config_path)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_config_init_refuses_overwrite() {
    let home = create_temp_dir();
    let config_path = home.path().join("config.toml");

    sca(home.path())
        .env("SCA_CONFIG", &config_path)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));
    assert!(config_path.exists());

    sca(home.path())
        .env("SCA_CONFIG", &config_path)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    sca(home.path())
        .env("SCA_CONFIG", &config_path)
        .args(["config", "init", "--force"])
        .assert()
        .success();
}

#[test]
fn test_config_show_defaults() {
    let home = create_temp_dir();

    sca(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(defaults)"));
}

#[test]
fn test_config_base_uri_applies_to_build() {
    let home = create_temp_dir();
    let config_path = home.path().join("config.toml");
    std::fs::write(
        &config_path,
        "[binding-base-uris]\n\"binding.ws\" = \"https://shop.example.com\"\n",
    )
    .unwrap();
    let descriptor = write_descriptor(home.path(), "store.toml", STORE_TOML);

    sca(home.path())
        .env("SCA_CONFIG", &config_path)
        .arg("build")
        .arg(&descriptor)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "binding.ws Store https://shop.example.com/Store",
        ));
}

#[test]
fn test_invalid_config_fails_build() {
    let home = create_temp_dir();
    let config_path = home.path().join("config.toml");
    std::fs::write(&config_path, "[binding-base-uris]\n\"binding.ws\" = \"relative\"\n").unwrap();
    let descriptor = write_descriptor(home.path(), "store.toml", STORE_TOML);

    sca(home.path())
        .env("SCA_CONFIG", &config_path)
        .arg("build")
        .arg(&descriptor)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config validation failed"));
}
