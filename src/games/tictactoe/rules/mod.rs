//! Board evaluation rules.

mod draw;
mod win;

pub use draw::is_full;
pub use win::evaluate;
