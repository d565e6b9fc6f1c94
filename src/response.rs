//! Response wire record: the frames a shard streams back to a caller.

use crate::request::ServerId;

/// Closed set of response tags this layer interprets. Unknown/opaque
/// payload tags (e.g. actual point data) are carried as `Query`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Query,
    EndStream,
    AccessDenied,
    WriteOk,
    Error,
}

#[derive(Debug, Clone)]
pub struct Response {
    pub kind: ResponseKind,
    pub message: Option<String>,
    pub server_id: Option<ServerId>,
}

impl Response {
    pub fn query(payload: impl Into<String>) -> Self {
        Self {
            kind: ResponseKind::Query,
            message: Some(payload.into()),
            server_id: None,
        }
    }

    /// The terminal marker. Exactly one is emitted per completed stream.
    pub fn end_stream() -> Self {
        Self {
            kind: ResponseKind::EndStream,
            message: None,
            server_id: None,
        }
    }

    /// A terminal marker that also carries a message, used when the shard
    /// has nothing to report but a single synthesized frame (e.g. no
    /// healthy replicas).
    pub fn end_stream_with_message(message: impl Into<String>) -> Self {
        Self {
            kind: ResponseKind::EndStream,
            message: Some(message.into()),
            server_id: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ResponseKind::Error,
            message: Some(message.into()),
            server_id: None,
        }
    }

    pub fn access_denied() -> Self {
        Self {
            kind: ResponseKind::AccessDenied,
            message: None,
            server_id: None,
        }
    }

    pub fn is_end_stream(&self) -> bool {
        self.kind == ResponseKind::EndStream
    }

    pub fn is_access_denied(&self) -> bool {
        self.kind == ResponseKind::AccessDenied
    }
}
