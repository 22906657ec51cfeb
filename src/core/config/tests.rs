use super::data::Config;
use super::settings::SettingError;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nonexistent_config.toml");

    let config = Config::load_from_path(&config_path).expect("Failed to load config");

    assert_eq!(config, Config::default());
}

#[test]
fn test_config_persistence_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config
        .set_value("base-url", "https://gen.example.com")
        .expect("set base-url");
    config
        .set_value("archive-name", "bundle.zip")
        .expect("set archive-name");
    config.save_to_path(&config_path).expect("Failed to save config");

    let mut loaded = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(loaded.base_url.as_deref(), Some("https://gen.example.com"));
    assert_eq!(loaded.archive_name(), "bundle.zip");

    loaded.unset_value("archive-name").expect("unset archive-name");
    loaded.save_to_path(&config_path).expect("Failed to save config");

    let reloaded = Config::load_from_path(&config_path).expect("Failed to reload config");
    assert_eq!(reloaded.archive_name, None);
    assert_eq!(reloaded.base_url.as_deref(), Some("https://gen.example.com"));
}

#[test]
fn test_invalid_toml_reports_parse_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "base_url = [unterminated").unwrap();

    let err = Config::load_from_path(&config_path).unwrap_err();
    assert!(err.to_string().starts_with("Failed to parse config at"));
}

#[test]
fn test_setting_validation() {
    let mut config = Config::default();
    assert!(matches!(
        config.set_value("base-url", "ftp://nope"),
        Err(SettingError::InvalidValue { key: "base-url", .. })
    ));
    assert!(matches!(
        config.set_value("archive-name", "dir/out.zip"),
        Err(SettingError::InvalidValue { key: "archive-name", .. })
    ));
    assert_eq!(
        config.set_value("theme", "dark"),
        Err(SettingError::UnknownKey("theme".to_string()))
    );
    assert_eq!(
        config.unset_value("theme"),
        Err(SettingError::UnknownKey("theme".to_string()))
    );
}

#[test]
fn test_explicit_state_dir_wins() {
    let config = Config {
        state_dir: Some(PathBuf::from("/tmp/extshift-state")),
        ..Default::default()
    };
    assert_eq!(
        config.resolve_state_dir().unwrap(),
        PathBuf::from("/tmp/extshift-state")
    );
}
