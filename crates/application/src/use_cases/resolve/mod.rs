mod merge;
mod query_url;
mod task;

pub use merge::merge_results;
pub use query_url::{format_server, QueryUrlBuilder};
pub use task::{
    CompletionCallback, ResolveContext, ResolveDeps, ResolveState, ResolveTask, TaskSettings,
};
