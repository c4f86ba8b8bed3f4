mod requests_logging;

pub use requests_logging::{log_requests, RequestsLoggingLevel, UNMATCHED_ROUTE};
