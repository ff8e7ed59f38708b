//! Game service facade: the operations behind every API endpoint.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Local;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, error, info, instrument, warn};

use crate::active_games::ActiveGamesCounter;
use crate::db::{AI_PLAYER, DbError, Game, GameRepository, NewMoveRecord, NewScore, NewUser, Score, User};
use crate::error::ServiceError;
use crate::forms::{
    GameForm, GameForms, MoveRecordForm, MoveRecordForms, ScoreForm, ScoreForms, StringMessage,
    UserForm, UserForms,
};
use crate::games::tictactoe::{GameState, MoveError, Transition, Turn};
use crate::keys::{EntityKey, EntityKind};
use crate::locks::GameLocks;
use crate::ports::{Cache, Task, TaskQueue};
use crate::ranking::ranking_score;

const YOUR_MOVE: &str = "Time to make a move!";
const NOT_YOUR_MOVE: &str = "This is not your turn.";
const GOOD_LUCK: &str = "Good luck playing Tic-tac-toe!";
const GAME_DELETED: &str = "Game Deleted";
const CANNOT_DELETE_COMPLETED: &str = "Completed Game cannot be deleted.";
const CANCEL_FAILED: &str = "Error in cancelling the game";
const NAME_TAKEN: &str = "A User with that name already exists!";

/// Service exposing user, game, history and score operations.
///
/// All methods block on the database; async callers run them on a
/// blocking thread.
#[derive(Debug)]
pub struct GameService {
    repository: GameRepository,
    active_games: ActiveGamesCounter,
    tasks: Arc<dyn TaskQueue>,
    rng: Mutex<StdRng>,
    locks: GameLocks,
}

impl GameService {
    /// Creates a service whose opponent draws from OS entropy.
    #[instrument(skip_all)]
    pub fn new(repository: GameRepository, cache: Arc<dyn Cache>, tasks: Arc<dyn TaskQueue>) -> Self {
        Self::with_rng(repository, cache, tasks, StdRng::from_os_rng())
    }

    /// Creates a service with a caller-provided opponent generator.
    pub fn with_rng(
        repository: GameRepository,
        cache: Arc<dyn Cache>,
        tasks: Arc<dyn TaskQueue>,
        rng: StdRng,
    ) -> Self {
        info!("Creating GameService");
        Self {
            active_games: ActiveGamesCounter::new(repository.clone(), cache),
            repository,
            tasks,
            rng: Mutex::new(rng),
            locks: GameLocks::new(),
        }
    }

    /// Underlying repository.
    pub fn repository(&self) -> &GameRepository {
        &self.repository
    }

    /// Per-game mutex registry guarding moves and cancels.
    pub fn game_locks(&self) -> &GameLocks {
        &self.locks
    }

    /// Active-games counter sharing this service's cache.
    pub fn active_games_counter(&self) -> &ActiveGamesCounter {
        &self.active_games
    }

    // - - - Users - - - - - - - - - - - - - - - - -

    /// Registers a user with a unique name.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Conflict`] if the name is taken.
    #[instrument(skip(self, email))]
    pub fn create_user(
        &self,
        user_name: &str,
        email: Option<String>,
    ) -> Result<StringMessage, ServiceError> {
        if self.repository.get_user_by_name(user_name)?.is_some() {
            debug!("Name already registered");
            return Err(ServiceError::Conflict(NAME_TAKEN.to_string()));
        }

        let email = email.filter(|e| !e.trim().is_empty());
        match self.repository.create_user(NewUser::new(user_name.to_string(), email)) {
            Ok(user) => Ok(StringMessage::new(format!("User {} created!", user.name()))),
            // Lost a race with a concurrent registration of the same name.
            Err(e) if e.is_unique_violation() => Err(ServiceError::Conflict(NAME_TAKEN.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    // - - - Games - - - - - - - - - - - - - - - - -

    /// Starts a fresh game for `user_name`, human to move.
    ///
    /// Schedules a refresh of the cached active-games count; a scheduling
    /// failure is logged and does not fail the request.
    #[instrument(skip(self))]
    pub fn new_game(&self, user_name: &str) -> Result<GameForm, ServiceError> {
        let user = self.user_by_name(user_name)?;
        let state = GameState::new();
        let game = self.repository.create_game(*user.id(), &state)?;

        if let Err(e) = self.tasks.enqueue(Task::CacheActiveGames) {
            warn!(error = %e, "Active games refresh not scheduled");
        }

        Ok(GameForm::new(*game.id(), &state, user.name(), GOOD_LUCK))
    }

    /// Current state of a game with a whose-turn hint.
    #[instrument(skip(self))]
    pub fn get_game(&self, key: &str) -> Result<GameForm, ServiceError> {
        let game = self.load_game(resolve_game(key)?)?;
        let user = self.owner(&game)?;
        let state = game.state()?;
        let message = match state.turn() {
            Turn::Human => YOUR_MOVE,
            Turn::Ai => NOT_YOUR_MOVE,
        };
        Ok(GameForm::new(*game.id(), &state, user.name(), message))
    }

    /// Unfinished games of `user_name`.
    #[instrument(skip(self))]
    pub fn user_active_games(&self, user_name: &str) -> Result<GameForms, ServiceError> {
        let user = self.user_by_name(user_name)?;
        let items = self
            .repository
            .active_games_for_user(*user.id())?
            .iter()
            .map(|game| Ok(GameForm::new(*game.id(), &game.state()?, user.name(), YOUR_MOVE)))
            .collect::<Result<Vec<_>, DbError>>()?;
        debug!(count = items.len(), "Active games listed");
        Ok(GameForms { items })
    }

    /// Deletes an unfinished game together with its move history.
    ///
    /// A completed game is refused with an informational message and kept.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Internal`] if the delete fails.
    #[instrument(skip(self))]
    pub fn cancel_game(&self, key: &str) -> Result<StringMessage, ServiceError> {
        let game_id = resolve_game(key)?;
        self.locks.with_lock(game_id, || self.cancel_locked(game_id))
    }

    fn cancel_locked(&self, game_id: i32) -> Result<StringMessage, ServiceError> {
        let game = self.load_game(game_id)?;
        if *game.game_over() {
            debug!("Completed game left in place");
            return Ok(StringMessage::new(CANNOT_DELETE_COMPLETED));
        }

        self.repository.delete_game(game_id).map_err(|e| {
            error!(game_id, error = %e, "Cancel failed");
            ServiceError::Internal(CANCEL_FAILED.to_string())
        })?;
        Ok(StringMessage::new(GAME_DELETED))
    }

    /// Places the human's mark on square `position` (0-8).
    ///
    /// Wrong-turn and game-over attempts return the unchanged game with an
    /// informational message.
    ///
    /// # Errors
    ///
    /// [`ServiceError::InvalidMove`] for an out-of-range or occupied square.
    #[instrument(skip(self))]
    pub fn make_move(&self, key: &str, position: i64) -> Result<GameForm, ServiceError> {
        self.play(key, |state| state.apply_human_move(position))
    }

    /// Lets the opponent place its mark on a uniformly random empty square.
    #[instrument(skip(self))]
    pub fn random_move(&self, key: &str) -> Result<GameForm, ServiceError> {
        self.play(key, |state| {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            state.apply_ai_move(&mut *rng)
        })
    }

    /// Loads, advances and commits a game under its lock.
    fn play<F>(&self, key: &str, apply: F) -> Result<GameForm, ServiceError>
    where
        F: FnOnce(&mut GameState) -> Result<Transition, MoveError>,
    {
        let game_id = resolve_game(key)?;
        self.locks.with_lock(game_id, || self.play_locked(game_id, apply))
    }

    fn play_locked<F>(&self, game_id: i32, apply: F) -> Result<GameForm, ServiceError>
    where
        F: FnOnce(&mut GameState) -> Result<Transition, MoveError>,
    {
        let game = self.load_game(game_id)?;
        let user = self.owner(&game)?;
        let mut state = game.state()?;

        match apply(&mut state) {
            Ok(transition) => {
                let record = transition.recorded_mover().map(|mover| {
                    NewMoveRecord::new(
                        game_id,
                        state.board().to_string(),
                        actor_name(mover, &user),
                        i32::from(*state.move_count()),
                    )
                });
                let score = transition.outcome().map(|outcome| {
                    NewScore::new(
                        *user.id(),
                        game_id,
                        Local::now().date_naive(),
                        outcome.to_db_string().to_string(),
                    )
                });
                self.repository.commit_game(game_id, &state, record, score)?;
                debug!(status = transition.message(), "Move applied");
                Ok(GameForm::new(game_id, &state, user.name(), transition.message()))
            }
            Err(MoveError::IllegalTurn(turn)) => {
                debug!(reason = %turn, "Move refused");
                Ok(GameForm::new(game_id, &state, user.name(), turn.message()))
            }
            Err(MoveError::InvalidMove(e)) => Err(ServiceError::InvalidMove(e)),
        }
    }

    /// Move history of a game in move order.
    #[instrument(skip(self))]
    pub fn game_history(&self, key: &str) -> Result<MoveRecordForms, ServiceError> {
        let game = self.load_game(resolve_game(key)?)?;
        let items = self
            .repository
            .move_records(*game.id())?
            .iter()
            .map(MoveRecordForm::from)
            .collect();
        Ok(MoveRecordForms { items })
    }

    // - - - Scores & ranking - - - - - - - - - - -

    /// Every recorded score.
    #[instrument(skip(self))]
    pub fn scores(&self) -> Result<ScoreForms, ServiceError> {
        let names: HashMap<i32, String> = self
            .repository
            .list_users()?
            .into_iter()
            .map(|u| (*u.id(), u.name().clone()))
            .collect();
        let scores = self.repository.list_scores()?;
        let items = scores
            .iter()
            .map(|score| {
                let name = names.get(score.user_id()).map(String::as_str).unwrap_or_default();
                score_form(score, name)
            })
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(ScoreForms { items })
    }

    /// Scores of `user_name`.
    #[instrument(skip(self))]
    pub fn user_scores(&self, user_name: &str) -> Result<ScoreForms, ServiceError> {
        let user = self.user_by_name(user_name)?;
        let items = self
            .repository
            .user_scores(*user.id())?
            .iter()
            .map(|score| score_form(score, user.name()))
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(ScoreForms { items })
    }

    /// Cached active-games message, empty until first computed.
    #[instrument(skip(self))]
    pub fn active_games(&self) -> StringMessage {
        StringMessage::new(self.active_games.cached())
    }

    /// Recounts unfinished games into the cache.
    #[instrument(skip(self))]
    pub fn cache_active_games(&self) -> Result<i64, ServiceError> {
        Ok(self.active_games.refresh()?)
    }

    /// Recomputes every user's ranking score and lists users best first.
    #[instrument(skip(self))]
    pub fn ranking(&self) -> Result<UserForms, ServiceError> {
        let users = self.repository.list_users()?;
        let mut computed = Vec::with_capacity(users.len());
        for user in &users {
            let counts = self.repository.outcome_counts(*user.id())?;
            computed.push((*user.id(), ranking_score(&counts)));
        }
        self.repository.set_ranking_scores(&computed)?;

        let items = self
            .repository
            .list_users_by_ranking()?
            .iter()
            .map(UserForm::from)
            .collect();
        Ok(UserForms { items })
    }

    // - - - Lookups - - - - - - - - - - - - - - - -

    fn user_by_name(&self, user_name: &str) -> Result<User, ServiceError> {
        self.repository
            .get_user_by_name(user_name)?
            .ok_or_else(ServiceError::user_not_found)
    }

    fn load_game(&self, game_id: i32) -> Result<Game, ServiceError> {
        self.repository
            .get_game(game_id)?
            .ok_or_else(ServiceError::game_not_found)
    }

    fn owner(&self, game: &Game) -> Result<User, ServiceError> {
        self.repository.get_user(*game.user_id())?.ok_or_else(|| {
            DbError::corrupt(format!("game {} owner {} missing", game.id(), game.user_id())).into()
        })
    }
}

fn resolve_game(key: &str) -> Result<i32, ServiceError> {
    Ok(EntityKey::resolve(key, EntityKind::Game)?)
}

fn actor_name(mover: Turn, user: &User) -> String {
    match mover {
        Turn::Human => user.name().clone(),
        Turn::Ai => AI_PLAYER.to_string(),
    }
}

fn score_form(score: &Score, user_name: &str) -> Result<ScoreForm, DbError> {
    Ok(ScoreForm::new(score, user_name, score.outcome()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_game_rejects_user_key() {
        assert!(matches!(
            resolve_game("user-3"),
            Err(ServiceError::MalformedReference(_))
        ));
        assert!(matches!(
            resolve_game("not a key"),
            Err(ServiceError::MalformedReference(_))
        ));
        assert_eq!(resolve_game("game-3").unwrap(), 3);
    }
}
