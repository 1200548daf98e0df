//! Error taxonomy for the client core.
//!
//! Every remote-call failure is converted to one of these kinds at the
//! component boundary; no raw transport-level signal propagates further.

use supplicant_protocol::StatusCode;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The service registry itself cannot be reached. Fatal configuration
    /// condition, not a transient failure.
    #[error("service registry unreachable")]
    RegistryUnavailable,

    /// Precondition not met: the required remote handle is absent. No
    /// remote call was attempted.
    #[error("no {0} interface available")]
    InterfaceUnavailable(&'static str),

    /// Delivery-level failure of a remote call. Treated as daemon death:
    /// the session is reset when this surfaces at the client boundary.
    #[error("transport fault: {0}")]
    TransportFault(String),

    /// The daemon ran the call and returned a non-success status code.
    #[error("{method} rejected: {status} ({message})")]
    RemoteRejected {
        method: &'static str,
        status: StatusCode,
        message: String,
    },

    /// The daemon reported success but omitted the expected payload.
    #[error("{0} reported success without a payload")]
    MalformedReply(&'static str),

    /// A multi-step orchestration stopped after an earlier step failed.
    #[error("{sequence} aborted")]
    SequenceAborted {
        sequence: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub(crate) fn aborted(sequence: &'static str, source: Error) -> Self {
        Error::SequenceAborted {
            sequence,
            source: Box::new(source),
        }
    }

    /// True when this error, or any step error it wraps, was a transport
    /// fault. Drives the death-handling reset at the client boundary.
    pub fn involves_transport_fault(&self) -> bool {
        match self {
            Error::TransportFault(_) => true,
            Error::SequenceAborted { source, .. } => source.involves_transport_fault(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_detection_recurses_through_aborted_sequences() {
        let inner = Error::TransportFault("pipe closed".into());
        let wrapped = Error::aborted("connectToNetwork", inner);
        assert!(wrapped.involves_transport_fault());

        let rejected = Error::aborted(
            "connectToNetwork",
            Error::RemoteRejected {
                method: "select",
                status: StatusCode::FailureNetworkInvalid,
                message: String::new(),
            },
        );
        assert!(!rejected.involves_transport_fault());
    }
}
