//! RMR-style message envelope.
//!
//! There is no RIC Message Router here: messages arrive from the MQTT bridge
//! or from tests, and outbound control requests are only logged.

use serde::{Deserialize, Serialize};

pub const RIC_INDICATION: u32 = 12010;
pub const E2_CONTROL_REQUEST: u32 = 12011;
pub const A1_POLICY_REQUEST: u32 = 20010;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RmrMessage {
    pub message_type: u32,
    pub payload: Vec<u8>,
    pub source: String,
    pub destination: String,
}

impl RmrMessage {
    pub fn new(
        message_type: u32,
        payload: Vec<u8>,
        source: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            message_type,
            payload,
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// Inbound messages the xApp knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Indication,
    PolicyRequest,
}

impl TryFrom<u32> for MessageKind {
    type Error = u32;

    fn try_from(message_type: u32) -> Result<Self, Self::Error> {
        match message_type {
            RIC_INDICATION => Ok(MessageKind::Indication),
            A1_POLICY_REQUEST => Ok(MessageKind::PolicyRequest),
            other => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_kind_from_type_code() {
        assert_eq!(MessageKind::try_from(RIC_INDICATION), Ok(MessageKind::Indication));
        assert_eq!(MessageKind::try_from(A1_POLICY_REQUEST), Ok(MessageKind::PolicyRequest));
        // outbound only
        assert_eq!(MessageKind::try_from(E2_CONTROL_REQUEST), Err(E2_CONTROL_REQUEST));
        assert_eq!(MessageKind::try_from(0), Err(0));
    }
}
