use std::time::Duration;
use std::{env, fs};

use rolebind::config::loader::{load_config, load_config_with_default_path};
use rolebind::{AssociationAttributes, AssociationKey, CancellationToken, build_reconciler};
use rolebind_api_memory::ApiBackend;

const VALID_TOML: &str = r#"
[reconciler]
poll_interval_ms = 2000
create_timeout_secs = 120
delete_timeout_secs = 300
jitter_ratio = 0.0

[logging]
level = "debug"

[backend]
kind = "in-memory"
clusters = ["cluster-A", "cluster-B"]

[backend.simulation]
pending_polls = 2
deleting_polls = 1
"#;

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("rolebind.toml");
    fs::write(&path, VALID_TOML).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.reconciler.poll_interval_ms, 2000);
    assert_eq!(cfg.reconciler.create_timeout_secs, 120);
    assert_eq!(cfg.logging.level, "debug");
    assert_eq!(cfg.backend.kind, ApiBackend::InMemory);
    assert_eq!(cfg.backend.clusters, vec!["cluster-A", "cluster-B"]);
    assert_eq!(cfg.backend.simulation.deleting_polls, 1);

    let reconciler_config = cfg.to_reconciler_config();
    assert_eq!(reconciler_config.poll_interval, Duration::from_secs(2));
    assert_eq!(reconciler_config.delete_timeout, Duration::from_secs(300));
    assert_eq!(reconciler_config.jitter_ratio, 0.0);

    // 2) Env override should win over file
    unsafe {
        env::set_var("ROLEBIND__RECONCILER__DELETE_TIMEOUT_SECS", "90");
        env::set_var("ROLEBIND__LOGGING__LEVEL", "warn");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.reconciler.delete_timeout_secs, 90);
    assert_eq!(cfg_env.logging.level, "warn");
    assert_eq!(cfg_env.reconciler.create_timeout_secs, 120);
    unsafe {
        env::remove_var("ROLEBIND__RECONCILER__DELETE_TIMEOUT_SECS");
        env::remove_var("ROLEBIND__LOGGING__LEVEL");
    }

    // Path-typed entry point reads the same file
    let cfg_path = load_config_with_default_path(Some(&path)).expect("should parse by path");
    assert_eq!(cfg_path.reconciler.poll_interval_ms, 2000);
    assert_eq!(cfg_path.backend.clusters.len(), 2);

    // 3) Missing file falls back to defaults
    let missing = dir.path().join("missing.toml");
    let cfg_default = load_config(missing.to_str()).expect("defaults should validate");
    assert_eq!(cfg_default.reconciler.poll_interval_ms, 5000);
    assert!(cfg_default.backend.clusters.is_empty());

    // 4) Timeout shorter than one poll interval should error
    let invalid_path = dir.path().join("invalid.toml");
    let invalid_toml = r#"
[reconciler]
poll_interval_ms = 30000
create_timeout_secs = 10
"#;
    fs::write(&invalid_path, invalid_toml).expect("write invalid toml");
    let err = load_config(invalid_path.to_str()).expect_err("expected validation error");
    assert!(err.to_string().contains("create_timeout_secs"));
}

#[tokio::test(start_paused = true)]
async fn reconciler_built_from_file_config() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("rolebind.toml");
    fs::write(&path, VALID_TOML).expect("write toml");

    let cfg = load_config(path.to_str()).expect("should parse config");
    let reconciler = build_reconciler(&cfg);
    let cancel = CancellationToken::new();
    let key = AssociationKey::new("cluster-B", "arn:aws:iam::123456789012:role/rds-s3")
        .expect("valid key");
    let attrs = AssociationAttributes::new().with_feature_name("s3Import");

    let started = tokio::time::Instant::now();
    let record = reconciler
        .create(&key, &attrs, &cancel)
        .await
        .expect("create converges");
    assert!(record.is_active());
    assert_eq!(started.elapsed(), Duration::from_secs(4));

    reconciler
        .delete(&key, &attrs, &cancel)
        .await
        .expect("delete converges");
    assert!(!reconciler.read(&key).await.expect("read").is_present());
}
