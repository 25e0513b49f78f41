mod client;
mod errors;
mod symbol;
pub mod types;
pub mod user_agent;
pub use self::client::{Client, DEFAULT_SEARCH_PATH};
pub use self::errors::Error;
pub use self::symbol::{closest_candidate, extract_symbol_token, select_exact_match};
