// Authentication module
// Token storage, single-flight refresh, session state and permissions

mod types;
mod store;
mod refresh;
pub mod permissions;
pub mod session;

pub use refresh::{PendingRequest, RefreshCoordinator, RefreshLease, RefreshOutcome, RefreshTicket};
pub use session::{Session, SessionHandle, SessionStatus};
pub use store::{MemoryTokenStore, SqliteTokenStore, TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
pub use types::{token_preview, LoginRequest, LoginResponse, RefreshRequest, TokenPair};
