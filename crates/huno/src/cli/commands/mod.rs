pub mod auth;
pub mod export;
pub mod fetch;
pub mod profile;
pub mod recommend;

pub use auth::{login, logout, status};
pub use export::run as export;
pub use fetch::run as fetch;
pub use profile::{settings as show_settings, show as show_profile};
pub use recommend::run as recommend;
