//! Decorated HTTP client stack (§4.5):
//!
//! ```text
//! Request -> RetryDecorator -> CacheDecorator -> BaseClient -> network
//!                                 (GET only)
//! ```

pub mod base_client;
pub mod cache_decorator;
pub mod error;
pub mod events;
pub mod retry;

pub use base_client::{BaseClient, HttpResponse, MultipartPart, ReqwestBaseClient};
pub use cache_decorator::CacheDecorator;
pub use error::{ApiErrorBody, HttpError, HttpResult};
pub use events::{Event, EventBus};
pub use retry::{RetryConfig, RetryDecorator};
