//! Stream transport
//!
//! An ordered, append-only log of byte payloads. The log assigns every entry
//! a strictly increasing `StreamEntryId`; readers pull entries after a cursor
//! and may block, with a bound, until something arrives. Entries are never
//! removed, so any number of independent readers can replay the log.
//!
//! ```text
//!  producer / ingress                       consumer
//!         │ publish                           ▲ read(after, n, timeout)
//!    ┌────▼──────────────────────────────────┴────┐
//!    │ Transport                                   │
//!    │  LocalTransport  (memory | journal on disk) │
//!    │  HttpTransport   (client of the gateway)    │
//!    └─────────────────────────────────────────────┘
//! ```

pub mod id_gen;
pub mod transport;
pub mod local;
pub mod http;
pub mod wire;

pub use id_gen::IdGenerator;
pub use local::LocalTransport;
pub use http::HttpTransport;
pub use transport::{StreamEntry, Transport, TransportError};
