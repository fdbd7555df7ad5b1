//! HTTP plumbing: request dispatch and transports.

mod endpoint;
mod transport;

pub use endpoint::Endpoint;
pub use transport::{
    Credentials, EsTransport, HttpTransport, Method, Transport, TransportRequest,
    TransportResponse,
};

#[cfg(test)]
pub(crate) use transport::testing;
