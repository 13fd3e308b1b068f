pub mod resolve;

pub use resolve::{
    CompletionCallback, QueryUrlBuilder, ResolveContext, ResolveDeps, ResolveState, ResolveTask,
    TaskSettings,
};
