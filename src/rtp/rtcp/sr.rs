use std::fmt;

use crate::util::{decode_ntp, ntp_middle_32};

use super::rr::{read_reports, LEN_REPORT_BLOCK};
use super::{FeedbackMessageType, RtcpType, Ssrc};
use super::{ReceptionReport, ReportList, RtcpHeader, RtcpPacket};

/// Byte size of the sender info including the sender SSRC.
pub(crate) const LEN_SENDER_INFO: usize = 24;

/// A report of packets sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderReport {
    /// Information about the sender of this report.
    pub sender_info: SenderInfo,
    /// A sender report is implicitly also a receiver report. This
    /// might hold data that would otherwise come in a separate RR.
    pub reports: ReportList<ReceptionReport>,
}

/// Information about a stream being sent.
///
/// See [RFC 3550 6.4.1](https://www.rfc-editor.org/rfc/rfc3550#section-6.4.1)
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SenderInfo {
    /// The SSRC of the SR originator.
    pub ssrc: Ssrc,
    /// The 64 bit NTP timestamp, Q32.32 seconds since 1900-01-01.
    pub ntp_time: u64,
    /// The RTP timestamp that corresponds to the same point in time as the NTP timestamp above.
    pub rtp_time: u32,
    /// The total number of packets the sender had sent when this information was generated.
    pub sender_packet_count: u32,
    /// The total number of octets the sender had sent when this information was generated.
    pub sender_octet_count: u32,
}

impl SenderInfo {
    /// The middle 32 bits of the NTP timestamp, as echoed in report blocks (LSR).
    pub fn ntp_middle(&self) -> u32 {
        ntp_middle_32(self.ntp_time)
    }

    fn write_to(&self, buf: &mut [u8]) {
        buf[..4].copy_from_slice(&self.ssrc.to_be_bytes());
        buf[4..12].copy_from_slice(&self.ntp_time.to_be_bytes());
        buf[12..16].copy_from_slice(&self.rtp_time.to_be_bytes());
        buf[16..20].copy_from_slice(&self.sender_packet_count.to_be_bytes());
        buf[20..24].copy_from_slice(&self.sender_octet_count.to_be_bytes());
    }
}

impl fmt::Debug for SenderInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SenderInfo")
            .field("ssrc", &self.ssrc)
            .field("ntp_time", &decode_ntp(self.ntp_time))
            .field("rtp_time", &self.rtp_time)
            .field("sender_packet_count", &self.sender_packet_count)
            .field("sender_octet_count", &self.sender_octet_count)
            .finish()
    }
}

impl RtcpPacket for SenderReport {
    fn header(&self) -> RtcpHeader {
        RtcpHeader {
            rtcp_type: RtcpType::SenderReport,
            feedback_message_type: FeedbackMessageType::ReceptionReport(self.reports.len() as u8),
            words_less_one: (self.length_words() - 1) as u16,
        }
    }

    fn length_words(&self) -> usize {
        // * header: 1
        // * sender info: 6
        // * reports: x 6
        1 + 6 + 6 * self.reports.len()
    }

    fn write_to(&self, buf: &mut [u8]) -> usize {
        self.header().write_to(buf);

        self.sender_info.write_to(&mut buf[4..]);

        for (i, r) in self.reports.iter().enumerate() {
            r.write_to(&mut buf[4 + LEN_SENDER_INFO + i * LEN_REPORT_BLOCK..]);
        }

        self.length_words() * 4
    }
}

impl<'a> TryFrom<(usize, &'a [u8])> for SenderReport {
    type Error = &'static str;

    fn try_from((count, buf): (usize, &'a [u8])) -> Result<Self, Self::Error> {
        let sender_info = buf.try_into()?;
        let reports = read_reports(count, &buf[LEN_SENDER_INFO..])?;

        Ok(SenderReport {
            sender_info,
            reports,
        })
    }
}

impl<'a> TryFrom<&'a [u8]> for SenderInfo {
    type Error = &'static str;

    fn try_from(buf: &'a [u8]) -> Result<Self, Self::Error> {
        if buf.len() < LEN_SENDER_INFO {
            return Err("Less than 24 bytes for SenderInfo");
        }

        // Sender report shape is here
        // https://www.rfc-editor.org/rfc/rfc3550#section-6.4.1

        let ssrc = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]).into();

        let ntp_time = u64::from_be_bytes([
            buf[4], buf[5], buf[6], buf[7], buf[8], buf[9], buf[10], buf[11],
        ]);

        // The clock rate (90kHz etc) is known higher up the stack.
        let rtp_time = u32::from_be_bytes([buf[12], buf[13], buf[14], buf[15]]);

        let sender_packet_count = u32::from_be_bytes([buf[16], buf[17], buf[18], buf[19]]);
        let sender_octet_count = u32::from_be_bytes([buf[20], buf[21], buf[22], buf[23]]);

        Ok(SenderInfo {
            ssrc,
            ntp_time,
            rtp_time,
            sender_packet_count,
            sender_octet_count,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sr_with_report_block() {
        let sr = SenderReport {
            sender_info: SenderInfo {
                ssrc: 1000.into(),
                ntp_time: 0xe5f1_2345_8000_0000,
                rtp_time: 90_000,
                sender_packet_count: 3,
                sender_octet_count: 414,
            },
            reports: ReceptionReport {
                ssrc: 7.into(),
                max_seq: 12,
                ..Default::default()
            }
            .into(),
        };

        let mut buf = vec![0; 52];
        let n = sr.write_to(&mut buf);
        assert_eq!(n, 52);
        assert_eq!(&buf[..4], &[0x81, 200, 0, 12]);
        assert_eq!(&buf[8..16], &[0xe5, 0xf1, 0x23, 0x45, 0x80, 0, 0, 0]);

        let sr2 = SenderReport::try_from((1_usize, &buf[4..])).unwrap();
        assert_eq!(sr, sr2);
        assert_eq!(sr2.sender_info.ntp_middle(), 0x2345_8000);
    }

    #[test]
    fn sr_too_short() {
        assert!(SenderReport::try_from((0_usize, &[0_u8; 20][..])).is_err());
        assert!(SenderReport::try_from((1_usize, &[0_u8; 24][..])).is_err());
    }
}
