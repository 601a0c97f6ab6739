pub mod error;
pub mod http;
pub mod response;
pub mod server;
pub mod watch;

// Re-exports
pub use error::DevServerError;
pub use http::{bind, run, serve};
pub use response::{DevResponse, ReloadNotice};
pub use server::{DevServer, ModuleState, CLIENT_PATH, EVENTS_PATH, STYLES_PATH};
pub use watch::{is_ignored, watch_project, ProjectWatcher, WatchMode};
