pub mod aggregate;
pub mod config;
pub mod document;
pub mod error;
pub mod question;

pub use aggregate::{aggregate, flatten_results};
pub use config::Config;
pub use document::*;
pub use error::*;
pub use question::*;
