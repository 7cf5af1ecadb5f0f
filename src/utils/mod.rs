//! Request helpers shared by middleware.
//!
//! - [`client_ip`] - client address resolution for rate limiting

pub mod client_ip;
