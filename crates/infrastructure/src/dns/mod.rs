pub mod cache;
pub mod forwarding;
pub mod scheduler;
pub mod signing;
pub mod transport;

pub use cache::{CacheMetrics, ResultCache};
pub use forwarding::JsonResponseParser;
pub use scheduler::{BootServers, ServerScheduler};
pub use signing::Sha256Signer;
pub use transport::ReqwestExchanger;
