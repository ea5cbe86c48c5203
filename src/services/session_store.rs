use crate::error::AppResult;
use crate::session::EditSession;

/// Storage for per-user edit sessions.
pub trait SessionStore: Send + Sync {
    fn load(&self, key: &str) -> AppResult<EditSession>;
    fn save(&self, key: &str, session: &EditSession) -> AppResult<()>;
    fn clear(&self, key: &str) -> AppResult<()>;
}
