pub mod local_resolver;
pub mod net_stack;

pub use local_resolver::LocalResolver;
pub use net_stack::NetStackDetector;
