//! Error types for agent streaming.
//!
//! - [`StreamError`] - what `StreamClient` operations fail with
//! - [`ErrorCategory`] - high-level classification for handling decisions
//! - [`HttpError`](crate::traits::HttpError) - transport-level failures, wrapped
//!   by `StreamError::Transport`
//!
//! | Category | Typical cause | Retryable |
//! |----------|---------------|-----------|
//! | Network | Connection lost, timeout | Yes |
//! | Auth | 401 / 403 | No |
//! | Server | 5xx, 429 | Yes |
//! | Client | Bad request or response body | No |
//! | User | Cancelled | No |

mod category;
mod stream;

pub use category::ErrorCategory;
pub use stream::StreamError;

/// Result alias for client operations.
pub type StreamResult<T> = Result<T, StreamError>;
