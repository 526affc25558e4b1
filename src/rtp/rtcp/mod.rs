#![allow(clippy::unusual_byte_groupings)]

mod header;
use header::LEN_HEADER;
use std::collections::VecDeque;

pub use header::{RtcpHeader, RtcpType};

mod list;
pub use list::ReportList;

mod fmt;
pub use fmt::{FeedbackMessageType, PayloadType};

mod sr;
pub use sr::{SenderInfo, SenderReport};

mod rr;
pub use rr::{ReceiverReport, ReceptionReport};

mod sdes;
pub use sdes::{Descriptions, Sdes, SdesType, MAX_ITEM_LEN as SDES_MAX_ITEM_LEN};

mod remb;
pub use remb::{pack_bitrate, unpack_bitrate, Remb};

use super::{RtpError, Ssrc};

/// A packet that can be written as RTCP.
pub trait RtcpPacket {
    /// The header for this packet, with the length derived from `length_words`.
    fn header(&self) -> RtcpHeader;

    /// Length of entire RTCP packet (including header) in words (4 bytes).
    fn length_words(&self) -> usize;

    /// Write this packet to the buffer.
    ///
    /// Panics if the buffer doesn't have capacity to hold length_words * 4 bytes.
    fn write_to(&self, buf: &mut [u8]) -> usize;
}

/// RTCP packets handled by rtcpkit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rtcp {
    /// Sender report. Also known as SR.
    SenderReport(SenderReport),
    /// Receiver report. Also known as RR.
    ReceiverReport(ReceiverReport),
    /// Description of Synchronization Sources (senders).
    SourceDescription(Descriptions),
    /// Receiver Estimated Maximum Bitrate. Feedback to the sender about the maximum bitrate.
    Remb(Remb),
}

impl Rtcp {
    /// Parse every packet in a compound RTCP buffer.
    ///
    /// A header that is short, not version 2, or declares more bytes than remain,
    /// stops the walk with an error. Packets of any other type, known or not, that
    /// we don't handle are skipped. Packets parsed before the error are kept in
    /// `feedback`.
    pub fn read_packet(buf: &[u8], feedback: &mut VecDeque<Rtcp>) -> Result<(), RtpError> {
        let mut buf = buf;
        loop {
            if buf.is_empty() {
                break;
            }

            if buf.len() < LEN_HEADER {
                return Err(RtpError::ParseRtcp("Less than 4 bytes for RtcpHeader"));
            }

            let version = buf[0] >> 6;
            if version != 2 {
                return Err(RtpError::ParseRtcp("RTCP version is not 2"));
            }

            // The length is read without the type, so unknown types can be stepped over.
            let has_padding = buf[0] & 0b00_1_00000 > 0;
            let full_length = (u16::from_be_bytes([buf[2], buf[3]]) as usize + 1) * 4;

            if full_length > buf.len() {
                return Err(RtpError::TooShort {
                    declared: full_length,
                    actual: buf.len(),
                });
            }

            let unpadded_length = if has_padding {
                let pad = buf[full_length - 1] as usize;
                if full_length < pad + 4 {
                    debug!("RTCP padding beyond packet: {} < {}", full_length, pad);
                    return Err(RtpError::ParseRtcp("Padding larger than packet"));
                }
                full_length - pad
            } else {
                full_length
            };

            match Rtcp::try_from(&buf[..unpadded_length]) {
                Ok(v) => {
                    debug!("Read RTCP: {:?}", v);
                    feedback.push_back(v);
                }
                Err(e) => trace!("Skip RTCP: {}", e),
            }

            buf = &buf[full_length..];
        }

        Ok(())
    }

    /// Serialize the queued packets back to back into `buf`, as a compound packet.
    ///
    /// Stops at the first packet that doesn't fit and leaves it in the queue.
    /// Returns the number of bytes written.
    pub fn write_packet(feedback: &mut VecDeque<Rtcp>, buf: &mut [u8]) -> usize {
        let total_len = buf.len();

        let mut offset = 0;
        while let Some(fb) = feedback.front() {
            // Length of next item.
            let item_len = fb.length_words() * 4;

            // Capacity left in the buffer.
            if total_len - offset < item_len {
                break;
            }

            let written = fb.write_to(&mut buf[offset..]);

            assert_eq!(
                written, item_len,
                "length_words equals write_to length: {fb:?}"
            );

            debug!("Write RTCP: {:?}", fb);
            feedback.pop_front();

            offset += item_len;
        }

        offset
    }

    /// Serialize packets as one compound packet in a buffer of exact size.
    pub fn to_compound(packets: impl IntoIterator<Item = Rtcp>) -> Vec<u8> {
        let mut queue: VecDeque<Rtcp> = packets.into_iter().collect();
        let len = queue.iter().map(|p| p.length_words() * 4).sum();

        let mut buf = vec![0; len];
        let n = Rtcp::write_packet(&mut queue, &mut buf);
        buf.truncate(n);

        buf
    }
}

impl RtcpPacket for Rtcp {
    fn header(&self) -> RtcpHeader {
        match self {
            Rtcp::SenderReport(v) => v.header(),
            Rtcp::ReceiverReport(v) => v.header(),
            Rtcp::SourceDescription(v) => v.header(),
            Rtcp::Remb(v) => v.header(),
        }
    }

    fn length_words(&self) -> usize {
        match self {
            Rtcp::SenderReport(v) => v.length_words(),
            Rtcp::ReceiverReport(v) => v.length_words(),
            Rtcp::SourceDescription(v) => v.length_words(),
            Rtcp::Remb(v) => v.length_words(),
        }
    }

    fn write_to(&self, buf: &mut [u8]) -> usize {
        match self {
            Rtcp::SenderReport(v) => v.write_to(buf),
            Rtcp::ReceiverReport(v) => v.write_to(buf),
            Rtcp::SourceDescription(v) => v.write_to(buf),
            Rtcp::Remb(v) => v.write_to(buf),
        }
    }
}

impl<'a> TryFrom<&'a [u8]> for Rtcp {
    type Error = &'static str;

    fn try_from(buf: &'a [u8]) -> Result<Self, Self::Error> {
        let header: RtcpHeader = buf.try_into()?;

        // By constraining the length, all subparsing can go
        // until they exhaust the buffer length. This presupposes
        // padding is removed from the input.
        let buf = &buf[4..];

        Ok(match header.rtcp_type() {
            RtcpType::SenderReport => Rtcp::SenderReport((header.count(), buf).try_into()?),
            RtcpType::ReceiverReport => Rtcp::ReceiverReport((header.count(), buf).try_into()?),
            RtcpType::SourceDescription => {
                Rtcp::SourceDescription((header.count(), buf).try_into()?)
            }
            RtcpType::PayloadSpecificFeedback => match header.feedback_message_type() {
                FeedbackMessageType::PayloadFeedback(PayloadType::ApplicationLayer) => {
                    Rtcp::Remb(buf.try_into()?)
                }
                _ => return Err("Ignore PayloadSpecificFeedback other than REMB"),
            },
            RtcpType::Goodbye => return Err("Ignore RTCP type: Goodbye"),
            RtcpType::ApplicationDefined => return Err("Ignore RTCP type: ApplicationDefined"),
            RtcpType::TransportLayerFeedback => {
                return Err("Ignore RTCP type: TransportLayerFeedback")
            }
            RtcpType::ExtendedReport => return Err("Ignore RTCP type: ExtendedReport"),
        })
    }
}

/// Pad up to the next word (4 byte) boundary.
fn pad_bytes_to_word(n: usize) -> usize {
    let pad = 4 - n % 4;
    if pad == 4 {
        n
    } else {
        n + pad
    }
}

/// Bytes in one report block.
pub fn report_block_size() -> usize {
    rr::LEN_REPORT_BLOCK
}

/// Bytes in a sender report with `report_count` report blocks.
pub fn sr_size(report_count: usize) -> usize {
    header::LEN_HEADER + sr::LEN_SENDER_INFO + report_count * report_block_size()
}

/// Bytes in a receiver report with `report_count` report blocks.
pub fn rr_size(report_count: usize) -> usize {
    header::LEN_HEADER + 4 + report_count * report_block_size()
}

/// Bytes in a REMB for `num_targets` SSRCs.
pub fn remb_size(num_targets: usize) -> usize {
    header::LEN_HEADER + 16 + num_targets * 4
}

/// Bytes in an SDES packet. One slice of item text lengths per chunk.
pub fn sdes_size(chunks: &[&[usize]]) -> usize {
    header::LEN_HEADER + chunks.iter().map(|c| sdes::chunk_size(c)).sum::<usize>()
}
