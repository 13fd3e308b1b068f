//! HTTPDNS Domain Layer
pub mod config;
pub mod errors;
pub mod ip;
pub mod query_type;
pub mod resolve_request;
pub mod resolve_result;

pub use config::{CliOverrides, ClientConfig, Config, ConfigError};
pub use errors::DomainError;
pub use ip::{ip_list_from, IpEntry, IpList};
pub use query_type::{NetStackType, QueryType};
pub use resolve_request::{ResolveRequest, MAX_HOSTS_PER_BATCH};
pub use resolve_result::{ResolveAnswer, ResolveResult, ScheduleAnswer};
