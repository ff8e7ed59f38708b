//! Opaque urlsafe entity keys.
//!
//! Keys travel through URLs as `<kind>-<id>` (for example `game-12`).
//! Resolving one is a three-step contract: the text must parse, it must
//! name the expected kind, and the row must exist. The first two failures
//! are [`KeyError`]s; the last is the caller's not-found.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{EnumString, IntoStaticStr};
use tracing::{debug, instrument};

/// Kind of entity a key addresses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum EntityKind {
    /// A registered user.
    User,
    /// A game.
    Game,
}

/// Key that failed to resolve before reaching the store.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum KeyError {
    /// Text is not a key at all.
    #[display("Invalid Key: '{}'", _0)]
    Malformed(#[error(not(source))] String),
    /// A well-formed key for a different kind of entity.
    #[display("Incorrect Kind: expected {} key, got {} key", expected, found)]
    WrongKind {
        /// Kind the caller asked for.
        expected: EntityKind,
        /// Kind encoded in the key.
        found: EntityKind,
    },
}

/// Strongly typed reference to a stored entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityKey {
    kind: EntityKind,
    id: i32,
}

impl EntityKey {
    /// Key for a game row.
    pub fn game(id: i32) -> Self {
        Self {
            kind: EntityKind::Game,
            id,
        }
    }

    /// Key for a user row.
    pub fn user(id: i32) -> Self {
        Self {
            kind: EntityKind::User,
            id,
        }
    }

    /// Entity kind.
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Row id.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Urlsafe text form.
    pub fn urlsafe(&self) -> String {
        self.to_string()
    }

    /// Parses `text` and checks it addresses `expected`, returning the row id.
    ///
    /// # Errors
    ///
    /// [`KeyError::Malformed`] if `text` does not parse,
    /// [`KeyError::WrongKind`] if it names another kind.
    #[instrument]
    pub fn resolve(text: &str, expected: EntityKind) -> Result<i32, KeyError> {
        let key: EntityKey = text.parse()?;
        if key.kind != expected {
            debug!(found = %key.kind, "Key addresses another kind");
            return Err(KeyError::WrongKind {
                expected,
                found: key.kind,
            });
        }
        Ok(key.id)
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.kind, self.id)
    }
}

impl FromStr for EntityKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || KeyError::Malformed(s.to_string());
        let (kind, id) = s.split_once('-').ok_or_else(malformed)?;
        let kind = kind.parse::<EntityKind>().map_err(|_| malformed())?;
        // Digits only: rejects signs and whitespace that `parse` would accept.
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let id = id.parse::<i32>().map_err(|_| malformed())?;
        Ok(Self { kind, id })
    }
}
