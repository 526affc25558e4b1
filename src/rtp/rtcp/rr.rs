use std::fmt;

use super::list::private::WordSized;
use super::Ssrc;
use super::{FeedbackMessageType, ReportList, RtcpHeader, RtcpPacket, RtcpType};

/// Byte size of one report block.
pub(crate) const LEN_REPORT_BLOCK: usize = 24;

/// A receiver report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverReport {
    /// Sender of this feedback.
    pub sender_ssrc: Ssrc,
    /// The individual reports for received SSRC.
    pub reports: ReportList<ReceptionReport>,
}

/*
    0                   1                   2                   3
    0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
   +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
   |                 SSRC_1 (SSRC of first source)                 |
   +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
   | fraction lost |       cumulative number of packets lost       |
   +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
   |    sequence number cycles     |  highest sequence no received |
   +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
   |                      interarrival jitter                      |
   +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
   |                         last SR (LSR)                         |
   +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
   |                   delay since last SR (DLSR)                  |
   +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
*/

/// An individual report of reception.
///
/// See [RFC 3550 6.4.1](https://www.rfc-editor.org/rfc/rfc3550#section-6.4.1)
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct ReceptionReport {
    /// The source this report is about.
    pub ssrc: Ssrc,
    /// Fraction of packets lost since the previous report, in 1/256.
    pub fraction_lost: u8,
    /// Cumulative number of packets lost. 24 bit.
    pub packets_lost: u32,
    /// Extended highest sequence number: cycles in the upper 16 bits,
    /// highest sequence number in the lower 16 bits.
    pub max_seq: u32,
    /// Interarrival jitter.
    pub jitter: u32,
    /// Middle 32 bits of the NTP timestamp of the last SR.
    pub last_sr_time: u32,
    /// Delay since the last SR in units of 1/65536 seconds.
    pub last_sr_delay: u32,
}

impl ReceptionReport {
    /// Combine sequence number cycles and the highest sequence number.
    pub fn extended_seq(cycles: u16, highest: u16) -> u32 {
        (cycles as u32) << 16 | highest as u32
    }

    /// Sequence number cycles part of `max_seq`.
    pub fn seq_cycles(&self) -> u16 {
        (self.max_seq >> 16) as u16
    }

    /// Highest sequence number part of `max_seq`.
    pub fn highest_seq(&self) -> u16 {
        (self.max_seq & 0xffff) as u16
    }

    pub(crate) fn write_to(&self, buf: &mut [u8]) {
        let lost = (self.fraction_lost as u32) << 24 | (self.packets_lost & 0x00ff_ffff);

        buf[0..4].copy_from_slice(&self.ssrc.to_be_bytes());
        buf[4..8].copy_from_slice(&lost.to_be_bytes());
        buf[8..12].copy_from_slice(&self.max_seq.to_be_bytes());
        buf[12..16].copy_from_slice(&self.jitter.to_be_bytes());
        buf[16..20].copy_from_slice(&self.last_sr_time.to_be_bytes());
        buf[20..24].copy_from_slice(&self.last_sr_delay.to_be_bytes());
    }
}

impl fmt::Debug for ReceptionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceptionReport")
            .field("ssrc", &self.ssrc)
            .field("fraction_lost", &self.fraction_lost)
            .field("packets_lost", &self.packets_lost)
            .field("highest_seq", &self.highest_seq())
            .field("seq_cycles", &self.seq_cycles())
            .field("jitter", &self.jitter)
            .field("last_sr_time", &self.last_sr_time)
            .field("last_sr_delay", &self.last_sr_delay)
            .finish()
    }
}

impl RtcpPacket for ReceiverReport {
    fn header(&self) -> RtcpHeader {
        RtcpHeader {
            rtcp_type: RtcpType::ReceiverReport,
            feedback_message_type: FeedbackMessageType::ReceptionReport(self.reports.len() as u8),
            words_less_one: (self.length_words() - 1) as u16,
        }
    }

    fn length_words(&self) -> usize {
        // * header: 1
        // * sender SSRC
        // * reports: x 6
        1 + 1 + 6 * self.reports.len()
    }

    fn write_to(&self, buf: &mut [u8]) -> usize {
        self.header().write_to(buf);

        buf[4..8].copy_from_slice(&self.sender_ssrc.to_be_bytes());

        for (i, r) in self.reports.iter().enumerate() {
            r.write_to(&mut buf[8 + i * LEN_REPORT_BLOCK..]);
        }

        self.length_words() * 4
    }
}

impl WordSized for ReceptionReport {
    fn word_size(&self) -> usize {
        6
    }
}

/// Parse `count` report blocks from the start of `buf`.
pub(crate) fn read_reports(
    count: usize,
    buf: &[u8],
) -> Result<ReportList<ReceptionReport>, &'static str> {
    if buf.len() < count * LEN_REPORT_BLOCK {
        return Err("Report count larger than buffer");
    }

    let mut reports = ReportList::new();
    for chunk in buf.chunks_exact(LEN_REPORT_BLOCK).take(count) {
        reports.push(chunk.try_into()?);
    }

    Ok(reports)
}

impl<'a> TryFrom<(usize, &'a [u8])> for ReceiverReport {
    type Error = &'static str;

    fn try_from((count, buf): (usize, &'a [u8])) -> Result<Self, Self::Error> {
        if buf.len() < 4 {
            return Err("Less than 4 bytes for ReceiverReport");
        }

        let sender_ssrc = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]).into();
        let reports = read_reports(count, &buf[4..])?;

        Ok(ReceiverReport {
            sender_ssrc,
            reports,
        })
    }
}

impl<'a> TryFrom<&'a [u8]> for ReceptionReport {
    type Error = &'static str;

    fn try_from(buf: &'a [u8]) -> Result<Self, Self::Error> {
        if buf.len() < LEN_REPORT_BLOCK {
            return Err("Less than 24 bytes for ReceptionReport");
        }

        let ssrc = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]).into();
        let lost = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
        let fraction_lost = (lost >> 24) as u8;
        let packets_lost = lost & 0x00ff_ffff;
        let max_seq = u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]);
        let jitter = u32::from_be_bytes([buf[12], buf[13], buf[14], buf[15]]);
        let last_sr_time = u32::from_be_bytes([buf[16], buf[17], buf[18], buf[19]]);
        let last_sr_delay = u32::from_be_bytes([buf[20], buf[21], buf[22], buf[23]]);

        Ok(ReceptionReport {
            ssrc,
            fraction_lost,
            packets_lost,
            max_seq,
            jitter,
            last_sr_time,
            last_sr_delay,
        })
    }
}
