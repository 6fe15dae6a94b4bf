//! Daemon module for the native timer.
//!
//! This module contains the core daemon functionality:
//! - `manager`: Timer session manager (session, live-status slot, notification policy)
//! - `clock`: Wall-clock abstraction
//! - `ticker`: Periodic tick source
//! - `signals`: Remote signal bus
//! - `ipc`: Unix socket bridge in front of the manager
//! - `server`: Daemon run loop

pub mod clock;
pub mod error;
pub mod ipc;
pub mod manager;
pub mod server;
pub mod signals;
pub mod ticker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::TimerError;
pub use ipc::{IpcError, IpcServer, RequestHandler};
pub use manager::{TimerEvent, TimerSessionManager};
pub use server::run;
pub use signals::{RemoteSignalBus, SignalSubscription};
pub use ticker::Ticker;
