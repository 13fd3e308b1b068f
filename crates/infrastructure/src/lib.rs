//! HTTPDNS Infrastructure Layer
//!
//! Concrete cache, scheduler, net-stack detector, HTTP transport, response
//! parser and signer, plus the [`HttpDnsClient`](engine::HttpDnsClient)
//! engine handle wiring them together.
pub mod dns;
pub mod engine;
pub mod system;

pub use engine::HttpDnsClient;
