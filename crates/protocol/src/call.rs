//! Typed outcome of one remote invocation.
//!
//! Every remote method yields a [`CallResult`]: either the daemon ran the
//! call and produced a [`CallReply`] (success or logical rejection), or
//! delivery itself failed with a [`TransportFault`]. The distinction
//! matters: a fault means the daemon may be gone, a rejection means it is
//! alive and said no.

use crate::status::StatusCode;

/// Reply produced by the daemon for a single invocation.
#[derive(Debug, Clone)]
pub struct CallReply<T> {
    /// Result code; only [`StatusCode::Success`] is a success.
    pub status: StatusCode,
    /// Diagnostic message accompanying a rejection. Empty on success.
    pub message: String,
    /// Payload of a successful call, when the method returns one.
    pub payload: Option<T>,
}

impl<T> CallReply<T> {
    /// A successful reply carrying `payload`.
    pub fn success(payload: T) -> Self {
        Self {
            status: StatusCode::Success,
            message: String::new(),
            payload: Some(payload),
        }
    }

    /// A rejection with the given status code and diagnostic message.
    pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            payload: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == StatusCode::Success
    }
}

/// Delivery-level failure of one invocation.
///
/// Raised by the transport when the call never reached the daemon or the
/// response never came back, as opposed to the daemon rejecting the call.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct TransportFault(pub String);

impl TransportFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Shape of every remote trait method.
pub type CallResult<T> = Result<CallReply<T>, TransportFault>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_reply_carries_payload() {
        let reply = CallReply::success(42u32);
        assert!(reply.is_success());
        assert_eq!(reply.payload, Some(42));
        assert!(reply.message.is_empty());
    }

    #[test]
    fn failure_reply_has_no_payload() {
        let reply: CallReply<u32> =
            CallReply::failure(StatusCode::FailureNetworkUnknown, "no such network");
        assert!(!reply.is_success());
        assert!(reply.payload.is_none());
        assert_eq!(reply.message, "no such network");
    }
}
