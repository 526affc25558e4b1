//! RTCP feedback and sender reports for RTP media streams.
//!
//! This is a Sans I/O library. Nothing in here talks to the network, and there
//! are no internal threads or async tasks. Incoming packets are handed to the
//! library, and outgoing packets come out of a sink callback or as return values.
//!
//! There are two halves.
//!
//! * Receiving media, a [`FeedbackSession`] observes RTP and RTCP from the remote
//!   peer. Every sender report (SR) is answered with a receiver report (RR), and
//!   [`FeedbackSession::request_bitrate`] asks the sender to stay under a bitrate
//!   using REMB.
//! * Sending media, a [`SrReporter`] sits in the outgoing path, counts the RTP
//!   packets and payload octets, and adds an SR followed by a CNAME SDES to the
//!   control message when triggered with [`SrReporter::set_needs_to_report`].
//!
//! # Receiving
//!
//! ```
//! use std::sync::Arc;
//! use rtcpkit::{track_sink, FeedbackSession, Message, RtcpHandler, Track};
//! use rtcpkit::error::RtpError;
//!
//! struct Udp;
//!
//! impl Track for Udp {
//!     fn send(&self, data: &[u8]) -> Result<(), RtpError> {
//!         // Write to the socket here.
//!         Ok(())
//!     }
//!
//!     fn is_open(&self) -> bool {
//!         true
//!     }
//! }
//!
//! let mut session = FeedbackSession::new();
//! session.on_outgoing(Box::new(track_sink(Arc::new(Udp))));
//!
//! // For every datagram read from the socket.
//! let datagram = Message::control(vec![0x80, 201, 0, 1, 0, 0, 0, 42]);
//! session.incoming(datagram);
//! assert_eq!(session.ssrc(), 42.into());
//!
//! // Ask for at most 500kbit/s.
//! session.request_bitrate(500_000);
//! ```
//!
//! # Sending
//!
//! ```
//! use std::sync::Arc;
//! use rtcpkit::{MediaHandler, RtpPacketizationConfig, SrReporter};
//!
//! let config = Arc::new(RtpPacketizationConfig::new(
//!     42.into(),
//!     "video-send",
//!     96.into(),
//!     90_000,
//! ));
//!
//! let reporter = SrReporter::new(config.clone());
//!
//! // Typically from a timer, every few seconds.
//! reporter.set_needs_to_report();
//!
//! let (rtp, control) = reporter.process_outgoing(vec![], None);
//! assert!(rtp.is_empty());
//! assert!(control.is_some());
//! ```
//!
//! # Wire format
//!
//! The codec in [`rtp`] reads and writes RTP headers and the RTCP packets used
//! here (SR, RR, SDES and REMB). All fields are packed with explicit shifts and
//! masks in network byte order.
#![forbid(unsafe_code)]
#![allow(clippy::new_without_default)]
#![allow(clippy::bool_to_int_with_if)]
#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

#[path = "rtp/mod.rs"]
mod rtp_;

/// Low level RTP access.
pub mod rtp {
    /// RTCP packets and their sizes.
    pub mod rtcp {
        pub use crate::rtp_::{Descriptions, Remb, Sdes, SdesType, SDES_MAX_ITEM_LEN};
        pub use crate::rtp_::{FeedbackMessageType, PayloadType, RtcpHeader, RtcpType};
        pub use crate::rtp_::{ReceiverReport, ReceptionReport, SenderInfo, SenderReport};
        pub use crate::rtp_::{ReportList, Rtcp, RtcpPacket};

        pub use crate::rtp_::{pack_bitrate, unpack_bitrate};
        pub use crate::rtp_::{remb_size, report_block_size, rr_size, sdes_size, sr_size};
    }

    pub use crate::rtp_::{Pt, RtpHeader, Ssrc};
}

/// NTP wallclock helpers.
pub mod ntp {
    pub use crate::util::{decode_ntp, encode_ntp, ntp_middle_32, ntp_now};
}

/// Various error types.
pub mod error {
    pub use crate::rtp_::RtpError;
}

mod util;
pub use util::{SinkFn, SyncCallback};

mod message;
pub use message::{Message, MessageKind};

mod config;
pub use config::RtpPacketizationConfig;

mod session;
pub use session::{FeedbackSession, RtcpHandler};

mod reporter;
pub use reporter::{MediaHandler, SenderReportBuilder, SenderStats, SrReporter};

mod track;
pub use track::{track_sink, Track};
