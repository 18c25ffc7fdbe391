use match_client::{CliConfig, play};
use match_content::SelectionMode;
use match_runtime::{FileSnapshotRepository, SnapshotRepository};

#[tokio::test]
async fn headless_match_finishes_and_saves() {
    let dir = tempfile::tempdir().unwrap();
    let config = CliConfig {
        seed: 2024,
        selection: SelectionMode::Draft,
        save_dir: Some(dir.path().to_path_buf()),
        max_turns: 300,
        ..CliConfig::default()
    };

    let report = play(&config).await.unwrap();
    if let Some(winner) = report.winner {
        assert_eq!(report.hp[winner.other()], 0);
    }

    let repository = FileSnapshotRepository::new(dir.path()).unwrap();
    let saved = repository.load(CliConfig::SAVE_SLOT).unwrap().unwrap();
    assert_eq!(saved.state.turn, report.turn);
}

#[tokio::test]
async fn custom_config_file_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("game.toml");
    std::fs::write(&config_path, "starting_hp = 12\nsecond_player_bonus_hp = 0\n").unwrap();

    let config = CliConfig {
        seed: 5,
        config_path: Some(config_path),
        selection: SelectionMode::Random,
        save_dir: Some(dir.path().join("saves")),
        max_turns: 200,
        ..CliConfig::default()
    };
    let report = play(&config).await.unwrap();
    assert!(report.hp.one <= 12 && report.hp.two <= 12);
}

#[tokio::test]
async fn missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = CliConfig {
        config_path: Some(dir.path().join("nope.toml")),
        save_dir: Some(dir.path().to_path_buf()),
        ..CliConfig::default()
    };
    let err = play(&config).await.unwrap_err();
    assert!(format!("{err:#}").contains("nope.toml"));
}
