use std::sync::atomic::{AtomicU32, Ordering};

use crate::rtp_::{Pt, Ssrc, SDES_MAX_ITEM_LEN};

/// Settings shared between a packetizer and the handlers reporting on it.
///
/// The current RTP timestamp is updated by the packetizer and read by the
/// sender report element, so the config is normally shared in an `Arc`.
///
/// ```
/// use std::sync::Arc;
/// use rtcpkit::RtpPacketizationConfig;
///
/// let config = Arc::new(
///     RtpPacketizationConfig::new(42.into(), "video-send", 96.into(), 90_000)
///         .set_start_timestamp(0),
/// );
///
/// config.set_timestamp(config.seconds_to_timestamp(1.5));
/// assert_eq!(config.timestamp(), 135_000);
/// ```
#[derive(Debug)]
pub struct RtpPacketizationConfig {
    ssrc: Ssrc,
    cname: String,
    payload_type: Pt,
    clock_rate: u32,
    start_timestamp: u32,
    timestamp: AtomicU32,
}

impl RtpPacketizationConfig {
    /// Creates a new config with a random start timestamp.
    ///
    /// A `cname` longer than 255 bytes is truncated, since that is what fits an SDES item.
    pub fn new(ssrc: Ssrc, cname: &str, payload_type: Pt, clock_rate: u32) -> Self {
        let start_timestamp = fastrand::u32(..);

        RtpPacketizationConfig {
            ssrc,
            cname: truncate_cname(cname),
            payload_type,
            clock_rate,
            start_timestamp,
            timestamp: AtomicU32::new(start_timestamp),
        }
    }

    /// Set the RTP timestamp of the first packet. Also resets the current timestamp.
    pub fn set_start_timestamp(mut self, start_timestamp: u32) -> Self {
        self.start_timestamp = start_timestamp;
        self.timestamp = AtomicU32::new(start_timestamp);
        self
    }

    /// The SSRC of the stream.
    pub fn ssrc(&self) -> Ssrc {
        self.ssrc
    }

    /// Canonical name sent in SDES.
    pub fn cname(&self) -> &str {
        &self.cname
    }

    /// Payload type of the stream.
    pub fn payload_type(&self) -> Pt {
        self.payload_type
    }

    /// RTP clock rate in Hz.
    pub fn clock_rate(&self) -> u32 {
        self.clock_rate
    }

    /// RTP timestamp of the first packet.
    pub fn start_timestamp(&self) -> u32 {
        self.start_timestamp
    }

    /// The current RTP timestamp.
    pub fn timestamp(&self) -> u32 {
        self.timestamp.load(Ordering::Acquire)
    }

    /// Update the current RTP timestamp.
    pub fn set_timestamp(&self, timestamp: u32) {
        self.timestamp.store(timestamp, Ordering::Release);
    }

    /// Convert an RTP timestamp delta to seconds using the clock rate.
    pub fn timestamp_to_seconds(&self, timestamp: u32) -> f64 {
        timestamp as f64 / self.clock_rate as f64
    }

    /// Convert seconds to an RTP timestamp delta using the clock rate.
    pub fn seconds_to_timestamp(&self, seconds: f64) -> u32 {
        (seconds * self.clock_rate as f64).round() as u32
    }
}

fn truncate_cname(cname: &str) -> String {
    if cname.len() <= SDES_MAX_ITEM_LEN {
        return cname.to_string();
    }

    let mut end = SDES_MAX_ITEM_LEN;
    while !cname.is_char_boundary(end) {
        end -= 1;
    }

    warn!("CNAME truncated to {} bytes: {}", end, cname);

    cname[..end].to_string()
}
