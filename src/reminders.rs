//! Reminder mail for unfinished games.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::db::{DbError, GameRepository, User};
use crate::keys::EntityKey;
use crate::ports::{Mail, Mailer};

/// Sends one reminder per unfinished game to its owner.
///
/// Run by an external periodic trigger (cron calling the `remind`
/// subcommand or the reminder endpoint).
#[derive(Debug, Clone)]
pub struct ReminderJob {
    repository: GameRepository,
    mailer: Arc<dyn Mailer>,
    sender: String,
    public_url: String,
}

impl ReminderJob {
    /// Creates a job sending from `sender` with links under `public_url`.
    pub fn new(
        repository: GameRepository,
        mailer: Arc<dyn Mailer>,
        sender: String,
        public_url: String,
    ) -> Self {
        Self {
            repository,
            mailer,
            sender,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Builds the reminder for `game_id` owned by `user`, if they have an email.
    pub fn reminder_for(&self, user: &User, game_id: i32) -> Option<Mail> {
        let to = user.email().as_deref().filter(|e| !e.trim().is_empty())?;
        let key = EntityKey::game(game_id);
        let subject = format!("{}, You have unfinished game!", user.name());
        let body = format!(
            "Hello {}, you have unfinished game!\n\nClick {}/game/{} to access the game\n",
            user.name(),
            self.public_url,
            key
        );
        Some(Mail::new(self.sender.clone(), to.to_string(), subject, body))
    }

    /// Sends reminders and returns how many were handed off.
    ///
    /// Individual send failures are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the games or users cannot be read.
    #[instrument(skip(self))]
    pub fn run(&self) -> Result<usize, DbError> {
        let games = self.repository.active_games()?;
        let users: HashMap<i32, User> = self
            .repository
            .list_users()?
            .into_iter()
            .map(|u| (*u.id(), u))
            .collect();

        let mut sent = 0;
        for game in &games {
            let Some(user) = users.get(game.user_id()) else {
                warn!(game_id = game.id(), "Game owner missing");
                continue;
            };
            let Some(mail) = self.reminder_for(user, *game.id()) else {
                debug!(game_id = game.id(), user = %user.name(), "No email on file");
                continue;
            };
            match self.mailer.send(&mail) {
                Ok(()) => sent += 1,
                Err(e) => warn!(game_id = game.id(), error = %e, "Reminder not sent"),
            }
        }

        info!(games = games.len(), sent, "Reminders sent");
        Ok(sent)
    }
}
