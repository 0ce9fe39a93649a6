pub mod chat;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod providers;
pub mod server;
pub mod translate;
pub mod transport;

pub use config::BridgeConfig;
pub use dispatch::{BackendSelector, ExecutorDispatch, SelectorHandle};
pub use error::{BridgeError, Result};
pub use logging::SharedLogger;
pub use server::{build_router, AppState};
