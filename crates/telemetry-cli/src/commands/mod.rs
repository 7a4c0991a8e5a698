//! Command implementations for telemetry-cli

pub mod dashboard;
pub mod login;
pub mod signal;
pub mod signals;
pub mod vehicles;

pub use dashboard::dashboard;
pub use login::login_url;
pub use signal::signal;
pub use signals::signals;
pub use vehicles::vehicles;
