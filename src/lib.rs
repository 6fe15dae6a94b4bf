//! Native Timer Library
//!
//! Background timer sessions with native notifications and live statuses.
//! It includes:
//! - Timer session manager (single session, single live-status publication)
//! - Notification delivery behind a platform trait (macOS backend included)
//! - Live-status publication behind a provider trait
//! - IPC server/client for daemon-CLI communication
//! - CLI command parsing and display utilities
//! - Configuration and type definitions

pub mod cli;
pub mod config;
pub mod daemon;
pub mod live_status;
pub mod notification;
pub mod types;

pub use config::NativeTimerConfig;

pub use daemon::{
    Clock, ManualClock, RemoteSignalBus, SystemClock, TimerError, TimerEvent, TimerSessionManager,
};

pub use live_status::{LiveStatusBoard, LiveStatusError, LiveStatusProvider, MockLiveStatusProvider};

pub use notification::{
    LogNotificationCenter, MockNotificationCenter, NotificationCenter, NotificationError,
    PlatformNotificationCenter,
};

pub use types::{
    format_elapsed, ForegroundState, IpcRequest, IpcResponse, LiveStatusContent,
    LiveStatusPublication, LiveStatusSlot, PublicationId, RemoteSignal, ResponseData, TimerSession,
};
