mod search;
pub use self::search::{SearchResponse, SearchResult};

mod session;
pub use self::session::{SessionCookie, SessionCredentials};
