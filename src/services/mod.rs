pub mod dispatcher;
pub mod replay;
pub mod sentinel;

pub use dispatcher::{spawn_dispatcher, DispatchHandle, DispatchStats, Notification};
pub use replay::{replay_lines, ReplayReport, ReplayStep};
pub use sentinel::{consume_events, handle_candle, startup_message, RunReport, Sentinel};
