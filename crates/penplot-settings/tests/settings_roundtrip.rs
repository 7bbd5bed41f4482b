use penplot_settings::{Config, PaperSize, SettingsManager};
use tempfile::TempDir;

#[test]
fn test_missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let manager = SettingsManager::with_override(Some(&dir.path().join("settings.toml"))).unwrap();
    let config = manager.load_or_default().unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.area().width, 385.0);
    assert!(config.papers.get("A4").is_some());
}

#[test]
fn test_save_then_load_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("settings.toml");
    let manager = SettingsManager::with_override(Some(&path)).unwrap();

    let mut config = Config::default();
    config.general.area_width = 300.0;
    config.general.invert_y = true;
    config.optimizer.workers = Some(2);
    config
        .papers
        .add(PaperSize::new("Postcard", 148.0, 100.0))
        .unwrap();
    manager.save(&config).unwrap();

    let loaded = manager.load_or_default().unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_save_then_load_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    let manager = SettingsManager::with_override(Some(&path)).unwrap();

    let mut config = Config::default();
    config.papers.remove("Letter").unwrap();
    manager.save(&config).unwrap();

    let loaded = manager.load_or_default().unwrap();
    assert!(loaded.papers.get("Letter").is_none());
    assert_eq!(loaded.papers.len(), config.papers.len());
}

#[test]
fn test_invalid_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, "[general]\narea_width = -1.0\narea_height = 10.0\n").unwrap();

    let manager = SettingsManager::with_override(Some(&path)).unwrap();
    let err = manager.load_or_default().unwrap_err();
    assert!(err.is_config_error());
}
