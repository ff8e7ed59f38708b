//! Outbound mail port.

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_new::new;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, instrument};

/// A message to deliver.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
pub struct Mail {
    from: String,
    to: String,
    subject: String,
    body: String,
}

/// Mail could not be handed off.
#[derive(Debug, Clone, Display, Error)]
#[display("Mail error: {} at {}:{}", message, file, line)]
pub struct MailError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl MailError {
    /// Creates a new mail error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Best-effort mail delivery.
pub trait Mailer: Send + Sync + std::fmt::Debug {
    /// Hands `mail` to the delivery channel.
    fn send(&self, mail: &Mail) -> Result<(), MailError>;
}

/// Writes each message as an RFC 822 style file into a spool directory
/// for a relay to pick up.
#[derive(Debug)]
pub struct SpoolMailer {
    dir: PathBuf,
    sequence: AtomicU64,
}

impl SpoolMailer {
    /// Creates a mailer spooling into `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`MailError`] if the directory cannot be created.
    #[instrument(skip(dir), fields(dir = %dir.display()))]
    pub fn new(dir: PathBuf) -> Result<Self, MailError> {
        std::fs::create_dir_all(&dir)
            .map_err(|e| MailError::new(format!("Cannot create spool '{}': {}", dir.display(), e)))?;
        Ok(Self {
            dir,
            sequence: AtomicU64::new(0),
        })
    }
}

impl Mailer for SpoolMailer {
    #[instrument(skip(self, mail), fields(to = %mail.to))]
    fn send(&self, mail: &Mail) -> Result<(), MailError> {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.f");
        let path = self.dir.join(format!("{stamp}-{seq}.eml"));
        let content = format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\n\r\n{}\r\n",
            mail.from, mail.to, mail.subject, mail.body
        );
        std::fs::write(&path, content)
            .map_err(|e| MailError::new(format!("Cannot spool '{}': {}", path.display(), e)))?;
        info!(path = %path.display(), "Mail spooled");
        Ok(())
    }
}
