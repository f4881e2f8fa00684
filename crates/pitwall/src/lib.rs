pub mod automation;
pub mod export;
pub mod host;
pub mod tracker;

pub use automation::{
    parse_command, Action, BindingIssue, CommandCall, ConfigError, Context, LifecycleEvent,
    LoadReport, RoomAutomation, RoomConfig,
};
pub use export::{export_results, ExportError};
pub use host::{HostApi, NullHost};
pub use tracker::{
    BestResult, Level, LevelOverview, LevelSnapshot, OverviewRow, Player, PlayerSnapshot,
    RoomTracker, TrackerNotification, UNSET_TIME_SECONDS,
};
