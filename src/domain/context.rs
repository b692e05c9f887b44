//! Request context carried through the API as an extension.

use std::net::IpAddr;
use uuid::Uuid;

/// Who asked, for log correlation. Every request gets one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationContext {
    pub correlation_id: Uuid,
    /// Peer address, when the server was started with connect info
    pub client_ip: Option<IpAddr>,
}

impl OperationContext {
    pub fn new(correlation_id: Uuid) -> Self {
        Self {
            correlation_id,
            client_ip: None,
        }
    }

    /// Reuse a caller-supplied id if it parses as a UUID, otherwise mint a
    /// fresh v4 id.
    pub fn from_header(value: Option<&str>) -> Self {
        let correlation_id = value
            .map(str::trim)
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);
        Self::new(correlation_id)
    }

    pub fn with_client_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = Some(ip);
        self
    }
}
