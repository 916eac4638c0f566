pub mod config;
pub mod constants;
pub mod error;
pub mod extract;
pub mod load;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod transform;
pub mod types;

pub use error::{ExtractError, LoadError, ParseError, PipelineError, TransformError};
pub use types::{CleanRecord, RawRecord};
