use std::io;

use thiserror::Error;

mod id;
pub use id::{Pt, Ssrc};

mod header;
pub use header::RtpHeader;

mod rtcp;
pub use rtcp::*;

/// Errors that can arise in RTP/RTCP handling.
#[derive(Debug, Error)]
pub enum RtpError {
    /// Failed to parse RTP header.
    #[error("Failed to parse RTP header")]
    ParseHeader,

    /// RTP version field is not 2.
    #[error("RTP packet is not version 2: {0}")]
    BadVersion(u8),

    /// Data tagged as RTP carries an RTCP SR/RR packet type.
    #[error("RTP packet has a payload type indicating RR/SR: {0}")]
    Misclassified(u8),

    /// Failed to parse an RTCP packet.
    #[error("Failed to parse RTCP: {0}")]
    ParseRtcp(&'static str),

    /// The RTCP length field declares more bytes than the buffer holds.
    #[error("RTCP length {declared} exceeds buffer length {actual}")]
    TooShort {
        /// Bytes according to the length field.
        declared: usize,
        /// Bytes in the buffer.
        actual: usize,
    },

    /// The transport is not open.
    #[error("Track is closed")]
    TrackClosed,

    /// Other io error
    #[error("{0}")]
    Io(#[from] io::Error),
}

impl From<&'static str> for RtpError {
    fn from(value: &'static str) -> Self {
        RtpError::ParseRtcp(value)
    }
}
