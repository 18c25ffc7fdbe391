use std::fs;

use match_content::{Roster, random_teams};
use match_core::{Battle, BattleSetup, BattleSnapshot, GameConfig, GameRng, Move, NullSink};
use match_runtime::{
    FileSnapshotRepository, InMemorySnapshotRepo, RepositoryError, SnapshotRepository,
};

fn snapshot(seed: u64, moves: usize) -> BattleSnapshot {
    let roster = Roster::builtin().unwrap();
    let teams = random_teams(&roster, &mut GameRng::new(seed)).unwrap();
    let setup = BattleSetup::new(GameConfig::default(), teams.teams, teams.first_player, seed);
    let mut battle = Battle::new(setup, Box::new(NullSink)).unwrap();
    for _ in 0..moves {
        let player = battle.current_player();
        let hint = battle.request_show_hint(player).unwrap();
        battle.apply_move(player, Move::swap(hint.a, hint.b)).unwrap();
    }
    battle.snapshot().unwrap()
}

#[test]
fn file_repository_round_trips_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileSnapshotRepository::new(dir.path().join("saves")).unwrap();
    let saved = snapshot(21, 2);

    assert!(repo.load("slot-1").unwrap().is_none());
    repo.save("slot-1", &saved).unwrap();
    assert!(repo.exists("slot-1"));
    assert_eq!(repo.load("slot-1").unwrap(), Some(saved.clone()));

    // The loaded snapshot restores into a working battle.
    let restored = Battle::from_snapshot(saved, Box::new(NullSink)).unwrap();
    assert!(restored.is_settled());
}

#[test]
fn file_repository_lists_and_deletes_slots() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileSnapshotRepository::new(dir.path()).unwrap();
    let saved = snapshot(22, 0);

    repo.save("b", &saved).unwrap();
    repo.save("a", &saved).unwrap();
    assert_eq!(repo.list_slots().unwrap(), vec!["a", "b"]);

    repo.delete("a").unwrap();
    repo.delete("a").unwrap();
    assert_eq!(repo.list_slots().unwrap(), vec!["b"]);
    assert!(!dir.path().join("a.sha256").exists());
}

#[test]
fn tampered_file_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileSnapshotRepository::new(dir.path()).unwrap();
    repo.save("autosave", &snapshot(23, 1)).unwrap();

    let path = dir.path().join("autosave.json");
    let edited = fs::read_to_string(&path)
        .unwrap()
        .replacen("\"turn\": ", "\"turn\": 9", 1);
    fs::write(&path, edited).unwrap();

    assert!(matches!(
        repo.load("autosave"),
        Err(RepositoryError::CorruptedData(_))
    ));
}

#[test]
fn slot_names_are_restricted() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileSnapshotRepository::new(dir.path()).unwrap();
    let saved = snapshot(24, 0);

    for slot in ["", "../escape", "a b", "dir/slot"] {
        assert!(matches!(
            repo.save(slot, &saved),
            Err(RepositoryError::InvalidSlot(_))
        ));
    }
    assert!(!repo.exists("../escape"));
}

#[test]
fn in_memory_repository_behaves_like_files() {
    let repo = InMemorySnapshotRepo::new();
    let saved = snapshot(25, 1);

    repo.save("quick", &saved).unwrap();
    assert_eq!(repo.load("quick").unwrap(), Some(saved));
    assert_eq!(repo.list_slots().unwrap(), vec!["quick"]);

    repo.delete("quick").unwrap();
    assert!(!repo.exists("quick"));
    assert!(repo.load("quick").unwrap().is_none());
}
