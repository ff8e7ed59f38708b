//! Tests for database repository operations.

use chrono::NaiveDate;
use tempfile::NamedTempFile;

use tictactoe_api::{
    AI_PLAYER, DbErrorKind, GameOutcome, GameRepository, GameState, NewMoveRecord, NewScore,
    NewUser,
};

/// Creates a temporary database file with schema applied, returns the file
/// handle (must stay in scope to keep the file alive) and a ready repository.
fn setup_test_db() -> (NamedTempFile, GameRepository) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();

    let repo = GameRepository::new(db_path).expect("Failed to create repository");
    repo.run_migrations().expect("Migrations failed");
    (db_file, repo)
}

fn new_user(name: &str) -> NewUser {
    NewUser::new(name.to_string(), Some(format!("{}@example.com", name.to_lowercase())))
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 1).expect("valid date")
}

#[test]
fn test_empty_path_rejected() {
    let err = GameRepository::new("  ".to_string()).unwrap_err();
    assert_eq!(err.kind, DbErrorKind::Connection);
}

#[test]
fn test_migrations_are_idempotent() {
    let (_db, repo) = setup_test_db();
    assert_eq!(repo.run_migrations().expect("Second run failed"), 0);
}

#[test]
fn test_create_user() {
    let (_db, repo) = setup_test_db();
    let user = repo.create_user(new_user("Alice")).expect("Create failed");
    assert_eq!(user.name(), "Alice");
    assert_eq!(user.email().as_deref(), Some("alice@example.com"));
    assert_eq!(*user.ranking_score(), 0);
    assert!(*user.id() > 0);
}

#[test]
fn test_create_user_duplicate_name_fails() {
    let (_db, repo) = setup_test_db();
    repo.create_user(new_user("Bob")).expect("First create failed");
    let err = repo.create_user(new_user("Bob")).unwrap_err();
    assert!(err.is_unique_violation(), "Duplicate name should be a unique violation");
}

#[test]
fn test_get_user_by_name_found() {
    let (_db, repo) = setup_test_db();
    repo.create_user(new_user("Carol")).expect("Create failed");
    let found = repo.get_user_by_name("Carol").expect("Query failed");
    assert_eq!(found.expect("Carol missing").name(), "Carol");
}

#[test]
fn test_get_user_by_name_not_found() {
    let (_db, repo) = setup_test_db();
    let found = repo.get_user_by_name("NoSuchUser").expect("Query failed");
    assert!(found.is_none());
}

#[test]
fn test_list_users_ordered_by_creation() {
    let (_db, repo) = setup_test_db();
    for name in ["Alpha", "Beta", "Gamma"] {
        repo.create_user(new_user(name)).expect("Create failed");
    }

    let users = repo.list_users().expect("List failed");
    let names: Vec<_> = users.iter().map(|u| u.name().as_str()).collect();
    assert_eq!(names, ["Alpha", "Beta", "Gamma"]);
}

#[test]
fn test_create_game_round_trips_state() {
    let (_db, repo) = setup_test_db();
    let user = repo.create_user(new_user("Dana")).expect("Create failed");

    let game = repo.create_game(*user.id(), &GameState::new()).expect("Create game failed");
    let loaded = repo
        .get_game(*game.id())
        .expect("Query failed")
        .expect("Game missing");

    assert_eq!(loaded.board(), "---------");
    assert_eq!(loaded.turn(), "human");
    assert!(!*loaded.game_over());
    assert_eq!(loaded.state().expect("State decode failed"), GameState::new());
}

#[test]
fn test_get_game_not_found() {
    let (_db, repo) = setup_test_db();
    assert!(repo.get_game(404).expect("Query failed").is_none());
}

#[test]
fn test_commit_game_writes_record_and_score_together() {
    let (_db, repo) = setup_test_db();
    let user = repo.create_user(new_user("Eve")).expect("Create failed");
    let game = repo.create_game(*user.id(), &GameState::new()).expect("Create game failed");
    let game_id = *game.id();

    let mut state = GameState::new();
    state.apply_human_move(4).expect("Move failed");
    let record = NewMoveRecord::new(game_id, state.board().to_string(), "Eve".to_string(), 1);
    repo.commit_game(game_id, &state, Some(record), None)
        .expect("Commit failed");

    let records = repo.move_records(game_id).expect("History failed");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].board(), "----O----");
    assert_eq!(records[0].actor(), "Eve");
    assert!(repo.list_scores().expect("Scores failed").is_empty());

    let reloaded = repo.get_game(game_id).expect("Query failed").expect("Game missing");
    assert_eq!(reloaded.state().expect("State decode failed"), state);
}

#[test]
fn test_commit_game_rolls_back_on_duplicate_score() {
    let (_db, repo) = setup_test_db();
    let user = repo.create_user(new_user("Finn")).expect("Create failed");
    let game = repo.create_game(*user.id(), &GameState::new()).expect("Create game failed");
    let game_id = *game.id();

    let score = || NewScore::new(*user.id(), game_id, day(), "win".to_string());
    repo.commit_game(game_id, &GameState::new(), None, Some(score()))
        .expect("First commit failed");

    let mut state = GameState::new();
    state.apply_human_move(0).expect("Move failed");
    let record = NewMoveRecord::new(game_id, state.board().to_string(), AI_PLAYER.to_string(), 1);
    let err = repo
        .commit_game(game_id, &state, Some(record), Some(score()))
        .unwrap_err();
    assert!(err.is_unique_violation());

    // Neither the board change nor the record survived the failed commit.
    let reloaded = repo.get_game(game_id).expect("Query failed").expect("Game missing");
    assert_eq!(reloaded.board(), "---------");
    assert!(repo.move_records(game_id).expect("History failed").is_empty());
    assert_eq!(repo.list_scores().expect("Scores failed").len(), 1);
}

#[test]
fn test_active_games_exclude_finished() {
    let (_db, repo) = setup_test_db();
    let user = repo.create_user(new_user("Gus")).expect("Create failed");
    let open = repo.create_game(*user.id(), &GameState::new()).expect("Create game failed");
    let done = repo.create_game(*user.id(), &GameState::new()).expect("Create game failed");

    let finished = GameState::restore(
        "OOOXX----".parse().expect("Board parse failed"),
        tictactoe_api::Turn::Human,
        5,
        true,
        Some(GameOutcome::Win),
    )
    .expect("Restore failed");
    repo.commit_game(*done.id(), &finished, None, None)
        .expect("Commit failed");

    let active = repo.active_games_for_user(*user.id()).expect("Query failed");
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id(), open.id());
    assert_eq!(repo.active_games().expect("Query failed").len(), 1);
    assert_eq!(repo.count_active_games().expect("Count failed"), 1);
}

#[test]
fn test_delete_game_cascades_to_records() {
    let (_db, repo) = setup_test_db();
    let user = repo.create_user(new_user("Hana")).expect("Create failed");
    let game = repo.create_game(*user.id(), &GameState::new()).expect("Create game failed");
    let game_id = *game.id();

    let mut state = GameState::new();
    state.apply_human_move(8).expect("Move failed");
    let record = NewMoveRecord::new(game_id, state.board().to_string(), "Hana".to_string(), 1);
    repo.commit_game(game_id, &state, Some(record), None)
        .expect("Commit failed");

    assert_eq!(repo.delete_game(game_id).expect("Delete failed"), 1);
    assert!(repo.get_game(game_id).expect("Query failed").is_none());
    assert!(repo.move_records(game_id).expect("History failed").is_empty());
}

#[test]
fn test_outcome_counts_per_user() {
    let (_db, repo) = setup_test_db();
    let ivy = repo.create_user(new_user("Ivy")).expect("Create failed");
    let jon = repo.create_user(new_user("Jon")).expect("Create failed");

    for (user_id, result) in [
        (*ivy.id(), "win"),
        (*ivy.id(), "win"),
        (*ivy.id(), "draw"),
        (*ivy.id(), "lose"),
        (*jon.id(), "lose"),
    ] {
        let game = repo.create_game(user_id, &GameState::new()).expect("Create game failed");
        let score = NewScore::new(user_id, *game.id(), day(), result.to_string());
        repo.commit_game(*game.id(), &GameState::new(), None, Some(score))
            .expect("Commit failed");
    }

    let counts = repo.outcome_counts(*ivy.id()).expect("Count failed");
    assert_eq!((*counts.wins(), *counts.draws(), *counts.losses()), (2, 1, 1));
    assert_eq!(counts.total(), 4);

    let counts = repo.outcome_counts(*jon.id()).expect("Count failed");
    assert_eq!((*counts.wins(), *counts.draws(), *counts.losses()), (0, 0, 1));

    let scores = repo.user_scores(*ivy.id()).expect("Scores failed");
    assert_eq!(scores.len(), 4);
    assert_eq!(scores[0].outcome().expect("Decode failed"), GameOutcome::Win);
    assert_eq!(*scores[0].played_on(), day());
}

#[test]
fn test_ranking_scores_persist_and_order() {
    let (_db, repo) = setup_test_db();
    let a = repo.create_user(new_user("Ann")).expect("Create failed");
    let b = repo.create_user(new_user("Ben")).expect("Create failed");
    let c = repo.create_user(new_user("Cal")).expect("Create failed");

    repo.set_ranking_scores(&[(*a.id(), 3), (*b.id(), 16), (*c.id(), 3)])
        .expect("Store failed");

    let users = repo.list_users_by_ranking().expect("List failed");
    let order: Vec<_> = users.iter().map(|u| (u.name().as_str(), *u.ranking_score())).collect();
    assert_eq!(order, [("Ben", 16), ("Ann", 3), ("Cal", 3)]);
}
