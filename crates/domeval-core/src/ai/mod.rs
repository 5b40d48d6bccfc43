//! DeepSeek streaming client: SSE framing, phase tracking, coalesced
//! snapshot emission, and the offline fallback appraiser.

pub mod client;
pub mod config;
pub mod fallback;
pub mod request;
pub mod session;
pub mod sse;
pub mod stream_buffer;
pub mod transport;
pub mod types;
