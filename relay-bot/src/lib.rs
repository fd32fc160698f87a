//! # relay-bot
//!
//! The application crate: config, the command router and its handlers, the
//! stream relay, and the Telegram transport adapter. `main` wires a teloxide
//! dispatcher to [`router::Router::dispatch`].

pub mod config;
pub mod error;
pub mod events;
pub mod export;
pub mod handlers;
pub mod locks;
pub mod relay;
pub mod router;
pub mod strings;
pub mod transport;

pub use config::Config;
pub use error::{BotError, BotResult};
pub use events::{Incoming, IncomingKind, Sender};
pub use locks::UserLocks;
pub use relay::StreamRelay;
pub use router::{authorize, AuthOutcome, BotContext, Invocation, Router};
pub use transport::TeloxideTransport;
