//! Side-effecting collaborators of the game service.
//!
//! Each port is a trait plus the adapter the binary wires in. Failures
//! on these channels are logged by callers and never fail the primary
//! operation.

mod cache;
mod mail;
mod tasks;

pub use cache::{ACTIVE_GAMES_KEY, Cache, CacheError, MemoryCache};
pub use mail::{Mail, MailError, Mailer, SpoolMailer};
pub use tasks::{ChannelTaskQueue, Task, TaskError, TaskQueue};
