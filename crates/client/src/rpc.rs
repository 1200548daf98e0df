//! Uniform acceptance of remote-call outcomes.
//!
//! Every remote invocation in this crate funnels through [`expect`]: a
//! delivery fault becomes [`Error::TransportFault`], a non-success status
//! becomes [`Error::RemoteRejected`], and only a success status with its
//! payload counts as success. Absence of a fault is never sufficient.
//! Interface-presence checks happen before the call is even issued, in
//! the session accessors.

use tracing::error;

use supplicant_protocol::CallResult;

use crate::error::{Error, Result};

pub(crate) fn expect<T>(method: &'static str, outcome: CallResult<T>) -> Result<T> {
    match outcome {
        Err(fault) => {
            error!(method, fault = %fault, "remote call failed to deliver");
            Err(Error::TransportFault(fault.0))
        }
        Ok(reply) if reply.is_success() => reply.payload.ok_or(Error::MalformedReply(method)),
        Ok(reply) => {
            error!(method, status = %reply.status, message = %reply.message, "remote call rejected");
            Err(Error::RemoteRejected {
                method,
                status: reply.status,
                message: reply.message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use supplicant_protocol::{CallReply, StatusCode, TransportFault};

    use super::*;

    #[test]
    fn success_with_payload_passes_through() {
        let out = expect("getMacAddress", Ok(CallReply::success("aa:bb:cc:dd:ee:ff".to_string())));
        assert_eq!(out.unwrap(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn rejection_carries_status_and_message() {
        let out: Result<()> = expect(
            "select",
            Ok(CallReply::failure(StatusCode::FailureNetworkInvalid, "bad id")),
        );
        match out.unwrap_err() {
            Error::RemoteRejected {
                method,
                status,
                message,
            } => {
                assert_eq!(method, "select");
                assert_eq!(status, StatusCode::FailureNetworkInvalid);
                assert_eq!(message, "bad id");
            }
            other => panic!("expected RemoteRejected, got {other:?}"),
        }
    }

    #[test]
    fn fault_maps_to_transport_fault() {
        let out: Result<()> = expect("disconnect", Err(TransportFault::new("daemon gone")));
        assert!(matches!(out.unwrap_err(), Error::TransportFault(m) if m == "daemon gone"));
    }

    #[test]
    fn success_without_payload_is_malformed() {
        let out: Result<u32> = expect(
            "addNetwork",
            Ok(CallReply {
                status: StatusCode::Success,
                message: String::new(),
                payload: None,
            }),
        );
        assert!(matches!(out.unwrap_err(), Error::MalformedReply("addNetwork")));
    }
}
