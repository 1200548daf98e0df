//! Status codes returned by the supplicant daemon.

use serde::{Deserialize, Serialize};

/// Result code carried by every daemon reply.
///
/// Only [`StatusCode::Success`] constitutes a successful call; every other
/// code is a logical rejection by the daemon, distinct from a delivery
/// failure of the call itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    Success,
    FailureUnknown,
    FailureArgsInvalid,
    FailureIfaceInvalid,
    FailureIfaceUnknown,
    FailureIfaceExists,
    FailureIfaceDisabled,
    FailureIfaceNotDisconnected,
    FailureNetworkInvalid,
    FailureNetworkUnknown,
}

impl StatusCode {
    /// Stable string form used in logs and diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCode::Success => "SUCCESS",
            StatusCode::FailureUnknown => "FAILURE_UNKNOWN",
            StatusCode::FailureArgsInvalid => "FAILURE_ARGS_INVALID",
            StatusCode::FailureIfaceInvalid => "FAILURE_IFACE_INVALID",
            StatusCode::FailureIfaceUnknown => "FAILURE_IFACE_UNKNOWN",
            StatusCode::FailureIfaceExists => "FAILURE_IFACE_EXISTS",
            StatusCode::FailureIfaceDisabled => "FAILURE_IFACE_DISABLED",
            StatusCode::FailureIfaceNotDisconnected => "FAILURE_IFACE_NOT_DISCONNECTED",
            StatusCode::FailureNetworkInvalid => "FAILURE_NETWORK_INVALID",
            StatusCode::FailureNetworkUnknown => "FAILURE_NETWORK_UNKNOWN",
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_stable_form() {
        assert_eq!(StatusCode::Success.to_string(), "SUCCESS");
        assert_eq!(
            StatusCode::FailureIfaceNotDisconnected.to_string(),
            "FAILURE_IFACE_NOT_DISCONNECTED"
        );
    }
}
