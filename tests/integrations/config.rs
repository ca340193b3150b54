//! Configuration loading and fail-fast account construction.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use slackwire::{Account, NotificationConfig, ReqwestTransport, SettingsError};
use tempfile::NamedTempFile;

/// A helper function to run a test with a temporary config file.
fn with_config_file<F>(toml_content: &str, test_fn: F)
where
    F: FnOnce(PathBuf),
{
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", toml_content).unwrap();
    let path = file.path().to_path_buf();
    test_fn(path);
}

#[test]
fn accounts_load_and_construct_with_url_fallback() {
    let toml_content = r##"
        [defaults]
        url = "https://hooks.slack.test/services/T0/B0/shared"

        [accounts.ops]
        [accounts.ops.message_defaults]
        from = "watcher"
        to = ["#ops"]

        [accounts.audit]
        url = "https://hooks.slack.test/services/T0/B0/audit"
    "##;

    with_config_file(toml_content, |path| {
        let config = NotificationConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.accounts.len(), 2);

        let transport = Arc::new(ReqwestTransport::default());

        // "ops" has no URL of its own and must fall back to the defaults.
        let ops = Account::new(
            "ops",
            &config.accounts["ops"],
            &config.defaults,
            transport.clone(),
        )
        .unwrap();
        assert_eq!(ops.message_defaults().from.as_deref(), Some("watcher"));
        assert_eq!(ops.message_defaults().to, vec!["#ops"]);

        let audit = Account::new(
            "audit",
            &config.accounts["audit"],
            &config.defaults,
            transport,
        )
        .unwrap();
        assert_eq!(audit.name(), "audit");
    });
}

#[test]
fn missing_url_everywhere_fails_account_construction() {
    let toml_content = r#"
        [accounts.ops]
        [accounts.ops.message_defaults]
        from = "watcher"
    "#;

    with_config_file(toml_content, |path| {
        let config = NotificationConfig::load(path.to_str().unwrap()).unwrap();
        let err = Account::new(
            "ops",
            &config.accounts["ops"],
            &config.defaults,
            Arc::new(ReqwestTransport::default()),
        )
        .err()
        .unwrap();

        assert!(matches!(err, SettingsError::MissingUrl { .. }));
        assert!(err.to_string().contains("[url]"));
    });
}

#[test]
fn invalid_url_fails_account_construction() {
    let toml_content = r#"
        [accounts.ops]
        url = "hooks dot slack"
    "#;

    with_config_file(toml_content, |path| {
        let config = NotificationConfig::load(path.to_str().unwrap()).unwrap();
        let err = Account::new(
            "ops",
            &config.accounts["ops"],
            &config.defaults,
            Arc::new(ReqwestTransport::default()),
        )
        .err()
        .unwrap();

        assert!(matches!(err, SettingsError::InvalidUrl { .. }));
    });
}
