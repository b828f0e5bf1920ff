pub mod error;
pub mod restrictions;
pub mod sink;
pub mod types;

pub use error::Error;
pub use restrictions::{RestrictionKind, Restrictions, StopCondition};
pub use sink::DocumentSink;
pub use types::{Document, ParseOutcome, PluginDescriptor};

pub type Result<T> = std::result::Result<T, Error>;
