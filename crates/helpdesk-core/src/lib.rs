//! Service plumbing shared by helpdesk binaries: request ids, tracing bootstrap and
//! timestamp serialization.

pub mod middleware;
pub mod serde;
pub mod tracing;
