pub mod api;
pub mod session;

pub use api::{ClientConfig, RawResponse, VendorClient};
pub use session::SessionToken;
