//! Database repository for users, games, move history and scores.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel_migrations::MigrationHarness;
use tracing::{debug, info, instrument, warn};

use crate::db::{
    DbError, DbErrorKind, Game, GameChanges, MIGRATIONS, MoveRecord, NewGame, NewMoveRecord,
    NewScore, NewUser, OutcomeCounts, Score, User, schema,
};
use crate::games::tictactoe::GameState;

/// Database repository for user and game operations.
#[derive(Debug, Clone)]
pub struct GameRepository {
    db_path: String,
}

impl GameRepository {
    /// Creates a new repository for the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        if db_path.trim().is_empty() {
            return Err(DbError::new(DbErrorKind::Connection, "Empty database path"));
        }
        info!(path = %db_path, "Creating GameRepository");
        Ok(Self { db_path })
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path).map_err(|e| {
            DbError::new(
                DbErrorKind::Connection,
                format!("Failed to connect to '{}': {}", self.db_path, e),
            )
        })?;
        // Writers on other games wait instead of failing with SQLITE_BUSY.
        conn.batch_execute("PRAGMA busy_timeout = 5000; PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    /// Applies any pending embedded migrations, returning how many ran.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a migration fails.
    #[instrument(skip(self))]
    pub fn run_migrations(&self) -> Result<usize, DbError> {
        let mut conn = self.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(DbErrorKind::Migration, e.to_string()))?;
        info!(count = applied.len(), "Migrations applied");
        Ok(applied.len())
    }

    // - - - Users - - - - - - - - - - - - - - - - -

    /// Creates a new user.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] of kind `UniqueViolation` if the name is taken.
    #[instrument(skip(self, new_user))]
    pub fn create_user(&self, new_user: NewUser) -> Result<User, DbError> {
        let mut conn = self.connection()?;

        let user = diesel::insert_into(schema::users::table)
            .values(&new_user)
            .returning(User::as_returning())
            .get_result(&mut conn)?;

        info!(user_id = user.id(), name = %user.name(), "User created");
        Ok(user)
    }

    /// Gets a user by id. Returns `None` if not found.
    #[instrument(skip(self))]
    pub fn get_user(&self, user_id: i32) -> Result<Option<User>, DbError> {
        let mut conn = self.connection()?;
        let user = schema::users::table
            .find(user_id)
            .select(User::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(user)
    }

    /// Gets a user by name. Returns `None` if not found.
    #[instrument(skip(self))]
    pub fn get_user_by_name(&self, name: &str) -> Result<Option<User>, DbError> {
        debug!(name = %name, "Looking up user by name");
        let mut conn = self.connection()?;

        let user = schema::users::table
            .filter(schema::users::name.eq(name))
            .select(User::as_select())
            .first(&mut conn)
            .optional()?;

        if let Some(ref u) = user {
            debug!(user_id = u.id(), "User found");
        } else {
            debug!("User not found");
        }

        Ok(user)
    }

    /// Lists all users in creation order.
    #[instrument(skip(self))]
    pub fn list_users(&self) -> Result<Vec<User>, DbError> {
        let mut conn = self.connection()?;
        let users = schema::users::table
            .order(schema::users::id.asc())
            .select(User::as_select())
            .load(&mut conn)?;
        debug!(count = users.len(), "Users loaded");
        Ok(users)
    }

    /// Lists users by ranking score, highest first; ties keep creation order.
    #[instrument(skip(self))]
    pub fn list_users_by_ranking(&self) -> Result<Vec<User>, DbError> {
        let mut conn = self.connection()?;
        let users = schema::users::table
            .order((
                schema::users::ranking_score.desc(),
                schema::users::id.asc(),
            ))
            .select(User::as_select())
            .load(&mut conn)?;
        Ok(users)
    }

    /// Stores recomputed ranking scores in one transaction.
    #[instrument(skip(self, scores), fields(count = scores.len()))]
    pub fn set_ranking_scores(&self, scores: &[(i32, i32)]) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        conn.immediate_transaction::<_, DbError, _>(|conn| {
            for (user_id, score) in scores {
                diesel::update(schema::users::table.find(*user_id))
                    .set(schema::users::ranking_score.eq(*score))
                    .execute(conn)?;
            }
            Ok(())
        })?;
        info!(count = scores.len(), "Ranking scores stored");
        Ok(())
    }

    // - - - Games - - - - - - - - - - - - - - - - -

    /// Inserts a game for `user_id` in the given state.
    #[instrument(skip(self, state))]
    pub fn create_game(&self, user_id: i32, state: &GameState) -> Result<Game, DbError> {
        let mut conn = self.connection()?;
        let game = diesel::insert_into(schema::games::table)
            .values(&NewGame::new(user_id, state))
            .returning(Game::as_returning())
            .get_result(&mut conn)?;
        info!(game_id = game.id(), user_id, "Game created");
        Ok(game)
    }

    /// Gets a game by id. Returns `None` if not found.
    #[instrument(skip(self))]
    pub fn get_game(&self, game_id: i32) -> Result<Option<Game>, DbError> {
        let mut conn = self.connection()?;
        let game = schema::games::table
            .find(game_id)
            .select(Game::as_select())
            .first(&mut conn)
            .optional()?;
        if game.is_none() {
            debug!("Game not found");
        }
        Ok(game)
    }

    /// Lists a user's unfinished games.
    #[instrument(skip(self))]
    pub fn active_games_for_user(&self, user_id: i32) -> Result<Vec<Game>, DbError> {
        let mut conn = self.connection()?;
        let games = schema::games::table
            .filter(schema::games::user_id.eq(user_id))
            .filter(schema::games::game_over.eq(false))
            .order(schema::games::id.asc())
            .select(Game::as_select())
            .load(&mut conn)?;
        debug!(count = games.len(), "Active games loaded");
        Ok(games)
    }

    /// Lists every unfinished game.
    #[instrument(skip(self))]
    pub fn active_games(&self) -> Result<Vec<Game>, DbError> {
        let mut conn = self.connection()?;
        let games = schema::games::table
            .filter(schema::games::game_over.eq(false))
            .order(schema::games::id.asc())
            .select(Game::as_select())
            .load(&mut conn)?;
        Ok(games)
    }

    /// Counts unfinished games.
    #[instrument(skip(self))]
    pub fn count_active_games(&self) -> Result<i64, DbError> {
        let mut conn = self.connection()?;
        let count = schema::games::table
            .filter(schema::games::game_over.eq(false))
            .count()
            .get_result(&mut conn)?;
        debug!(count, "Active games counted");
        Ok(count)
    }

    /// Writes a game's new state together with its optional move record and
    /// score, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if any write fails; nothing is committed then.
    #[instrument(skip(self, state, record, score), fields(record = record.is_some(), score = score.is_some()))]
    pub fn commit_game(
        &self,
        game_id: i32,
        state: &GameState,
        record: Option<NewMoveRecord>,
        score: Option<NewScore>,
    ) -> Result<Game, DbError> {
        let mut conn = self.connection()?;
        let changes = GameChanges::from(state);

        let game = conn.immediate_transaction::<_, DbError, _>(|conn| {
            let game = diesel::update(schema::games::table.find(game_id))
                .set(&changes)
                .returning(Game::as_returning())
                .get_result(conn)?;

            if let Some(record) = &record {
                diesel::insert_into(schema::move_records::table)
                    .values(record)
                    .execute(conn)?;
            }
            if let Some(score) = &score {
                diesel::insert_into(schema::scores::table)
                    .values(score)
                    .execute(conn)?;
            }
            Ok(game)
        })?;

        info!(
            game_id,
            move_count = game.move_count(),
            game_over = game.game_over(),
            "Game committed"
        );
        Ok(game)
    }

    /// Deletes a game and its move history in one transaction.
    ///
    /// Returns the number of move records removed with it.
    #[instrument(skip(self))]
    pub fn delete_game(&self, game_id: i32) -> Result<usize, DbError> {
        let mut conn = self.connection()?;
        let removed = conn.immediate_transaction::<_, DbError, _>(|conn| {
            let records = diesel::delete(
                schema::move_records::table.filter(schema::move_records::game_id.eq(game_id)),
            )
            .execute(conn)?;
            let games = diesel::delete(schema::games::table.find(game_id)).execute(conn)?;
            if games == 0 {
                warn!(game_id, "No game row deleted");
            }
            Ok(records)
        })?;
        info!(game_id, records = removed, "Game deleted");
        Ok(removed)
    }

    // - - - History & scores - - - - - - - - - - -

    /// Move records of a game in move order.
    #[instrument(skip(self))]
    pub fn move_records(&self, game_id: i32) -> Result<Vec<MoveRecord>, DbError> {
        let mut conn = self.connection()?;
        let records = schema::move_records::table
            .filter(schema::move_records::game_id.eq(game_id))
            .order((
                schema::move_records::move_count.asc(),
                schema::move_records::id.asc(),
            ))
            .select(MoveRecord::as_select())
            .load(&mut conn)?;
        debug!(count = records.len(), "Move records loaded");
        Ok(records)
    }

    /// All scores in insertion order.
    #[instrument(skip(self))]
    pub fn list_scores(&self) -> Result<Vec<Score>, DbError> {
        let mut conn = self.connection()?;
        let scores = schema::scores::table
            .order(schema::scores::id.asc())
            .select(Score::as_select())
            .load(&mut conn)?;
        Ok(scores)
    }

    /// A user's scores in insertion order.
    #[instrument(skip(self))]
    pub fn user_scores(&self, user_id: i32) -> Result<Vec<Score>, DbError> {
        let mut conn = self.connection()?;
        let scores = schema::scores::table
            .filter(schema::scores::user_id.eq(user_id))
            .order(schema::scores::id.asc())
            .select(Score::as_select())
            .load(&mut conn)?;
        debug!(count = scores.len(), "User scores loaded");
        Ok(scores)
    }

    /// Counts a user's wins, draws and losses.
    #[instrument(skip(self))]
    pub fn outcome_counts(&self, user_id: i32) -> Result<OutcomeCounts, DbError> {
        let mut counts = OutcomeCounts::default();
        for score in self.user_scores(user_id)? {
            match score.outcome() {
                Ok(outcome) => counts.add(outcome),
                Err(e) => warn!(score_id = score.id(), error = %e, "Skipping unreadable score"),
            }
        }
        debug!(
            wins = counts.wins(),
            draws = counts.draws(),
            losses = counts.losses(),
            "Outcomes counted"
        );
        Ok(counts)
    }
}
