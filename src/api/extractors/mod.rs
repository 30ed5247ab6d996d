pub mod same_origin;
pub mod session_ctx;

pub use same_origin::SameOrigin;
pub use session_ctx::{SessionCtx, SessionCtxExtractor};
