mod answer_cache;
mod http_exchanger;
mod request_signer;
mod resolver_scheduler;
mod response_parser;
mod stack_detector;

pub use answer_cache::AnswerCache;
pub use http_exchanger::{HttpExchanger, HttpRequest, HttpResponse, HTTP_OK};
pub use request_signer::{RequestSigner, Signature};
pub use resolver_scheduler::ResolverScheduler;
pub use response_parser::ResponseParser;
pub use stack_detector::StackDetector;
