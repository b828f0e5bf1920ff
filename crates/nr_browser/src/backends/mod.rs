pub mod cdp;
pub mod dom;
pub mod fetch;
pub mod memory;

pub use cdp::CdpSession;
pub use dom::DomElement;
pub use fetch::FetchSession;
pub use memory::{MemorySession, SessionEvent};
