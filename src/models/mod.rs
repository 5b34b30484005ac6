//! Wire and value types shared across the client.

mod request;
mod snapshot;

pub use request::{AgentRequest, FeedbackAck, FeedbackRating, FeedbackRequest};
pub use snapshot::{Citation, Snapshot};
