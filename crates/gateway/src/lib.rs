//! Remote resource gateway: typed request/response mapping for the backend's
//! REST resources, plus an in-memory implementation for tests.

pub mod envelope;
pub mod error;
pub mod http;
pub mod memory;
pub mod resource;
pub mod session;

pub use envelope::{RemoteItemSnapshot, decode_detail, decode_list, decode_resource, wire_id};
pub use error::{GatewayError, GatewayResult};
pub use http::{RestGateway, RestTransport};
pub use memory::{CallLog, CallOp, InMemoryGateway, RecordedCall};
pub use resource::{ListQuery, Page, PageMeta, Record, Resource, ResourceGateway};
pub use session::{Role, SessionContext, SessionUser};
