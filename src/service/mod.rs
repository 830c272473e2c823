//! Service layer module.
//!
//! Contains the shortening business logic, the deletion pipeline and the
//! helpers the HTTP layer leans on (ownership registry, cookie signing).

pub mod cookie;
pub mod deletion;
pub mod generator;
pub mod url;
pub mod users;

pub use cookie::{AUTH_COOKIE, COOKIE_MAX_AGE, CookieSigner};
pub use deletion::{DeletionJob, DeletionPipeline, log_deleted};
pub use generator::{DEFAULT_ID_LENGTH, NanoIdGenerator, SequenceGenerator, ShortIdGenerator};
pub use url::{BatchShortened, UrlService};
pub use users::UserRegistry;
