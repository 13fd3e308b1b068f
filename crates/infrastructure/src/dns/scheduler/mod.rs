pub mod boot;
pub mod ewma;
pub mod server_scheduler;

pub use boot::BootServers;
pub use ewma::ewma;
pub use server_scheduler::ServerScheduler;
