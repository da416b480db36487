pub mod config;
pub mod error_handler;
pub mod logging;
pub mod network;
pub mod units;

pub use config::{Amounts, DeployConfig, MNEMONIC_ENV, TokenMetadata};
pub use error_handler::{ClassifiedCategory, ClassifiedError, classify_error, classify_message};
pub use network::{Endpoint, Network, validate_url};
pub use units::{NANO_PER_COIN, from_nano, to_nano};
