use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::config::RtpPacketizationConfig;
use crate::message::{Message, MessageKind};
use crate::rtp_::{sdes_size, sr_size, Descriptions, Sdes, SenderInfo, SenderReport};
use crate::rtp_::{Rtcp, RtpHeader};
use crate::util::ntp_now;

/// An element in the outgoing media path.
pub trait MediaHandler {
    /// Handle a batch of outgoing RTP messages, and the control message produced
    /// by an earlier element, if any.
    ///
    /// Returns the messages to pass on to the next element.
    fn process_outgoing(
        &self,
        messages: Vec<Message>,
        control: Option<Message>,
    ) -> (Vec<Message>, Option<Message>);
}

/// Builds an SR followed by an SDES chunk with the CNAME, as one compound packet.
///
/// ```
/// use rtcpkit::{RtpPacketizationConfig, SenderReportBuilder};
///
/// let config = RtpPacketizationConfig::new(42.into(), "video-send", 96.into(), 90_000);
///
/// let m = SenderReportBuilder::new(&config)
///     .set_packet_count(10)
///     .set_octet_count(12_000)
///     .build(config.timestamp());
///
/// assert!(m.is_control());
/// // SR without report blocks, then SDES with a 10 byte CNAME.
/// assert_eq!(m.len(), 28 + 24);
/// ```
#[derive(Debug, Clone)]
pub struct SenderReportBuilder<'a> {
    config: &'a RtpPacketizationConfig,
    packet_count: u32,
    octet_count: u32,
    ntp_time: Option<u64>,
}

impl<'a> SenderReportBuilder<'a> {
    /// Builder for the stream in `config`.
    pub fn new(config: &'a RtpPacketizationConfig) -> Self {
        SenderReportBuilder {
            config,
            packet_count: 0,
            octet_count: 0,
            ntp_time: None,
        }
    }

    /// Cumulative number of packets sent.
    pub fn set_packet_count(mut self, packet_count: u32) -> Self {
        self.packet_count = packet_count;
        self
    }

    /// Cumulative number of payload octets sent.
    pub fn set_octet_count(mut self, octet_count: u32) -> Self {
        self.octet_count = octet_count;
        self
    }

    /// Use this NTP time instead of the current wallclock.
    pub fn set_ntp_time(mut self, ntp_time: u64) -> Self {
        self.ntp_time = Some(ntp_time);
        self
    }

    /// Build the control message with the given RTP timestamp.
    pub fn build(self, timestamp: u32) -> Message {
        let ssrc = self.config.ssrc();
        let cname = self.config.cname();

        let sr = SenderReport {
            sender_info: SenderInfo {
                ssrc,
                ntp_time: self.ntp_time.unwrap_or_else(ntp_now),
                rtp_time: timestamp,
                sender_packet_count: self.packet_count,
                sender_octet_count: self.octet_count,
            },
            reports: Default::default(),
        };

        let sdes = Descriptions {
            reports: Sdes::cname(ssrc, cname).into(),
        };

        let buf = Rtcp::to_compound([Rtcp::SenderReport(sr), Rtcp::SourceDescription(sdes)]);
        debug_assert_eq!(buf.len(), sr_size(0) + sdes_size(&[&[cname.len()]]));

        Message::control(buf)
    }
}

/// Counters of a [`SrReporter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderStats {
    /// Packets sent, wraps at 2^32.
    pub packet_count: u32,
    /// Payload octets sent, wraps at 2^32.
    pub octet_count: u32,
    /// RTP timestamp put in the last sender report.
    pub last_reported_timestamp: u32,
}

#[derive(Debug)]
struct ReportState {
    needs_report: bool,
    stats: SenderStats,
}

/// Counts outgoing RTP and adds a sender report to the control message when asked to.
///
/// [`SrReporter::set_needs_to_report`] can be called from a timer on another
/// thread than the one driving [`MediaHandler::process_outgoing`].
#[derive(Debug)]
pub struct SrReporter {
    config: Arc<RtpPacketizationConfig>,
    state: Mutex<ReportState>,
}

impl SrReporter {
    /// Reporter for the stream packetized with `config`.
    pub fn new(config: Arc<RtpPacketizationConfig>) -> Self {
        let stats = SenderStats {
            last_reported_timestamp: config.timestamp(),
            ..Default::default()
        };

        SrReporter {
            config,
            state: Mutex::new(ReportState {
                needs_report: false,
                stats,
            }),
        }
    }

    /// Make the next call to `process_outgoing` emit a sender report.
    pub fn set_needs_to_report(&self) {
        self.lock().needs_report = true;
    }

    /// RTP timestamp put in the last sender report.
    pub fn last_reported_timestamp(&self) -> u32 {
        self.lock().stats.last_reported_timestamp
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> SenderStats {
        self.lock().stats
    }

    fn lock(&self) -> MutexGuard<'_, ReportState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MediaHandler for SrReporter {
    fn process_outgoing(
        &self,
        messages: Vec<Message>,
        control: Option<Message>,
    ) -> (Vec<Message>, Option<Message>) {
        let mut state = self.lock();
        let mut control = control;

        if std::mem::take(&mut state.needs_report) {
            let timestamp = self.config.timestamp();

            let sr = SenderReportBuilder::new(&self.config)
                .set_packet_count(state.stats.packet_count)
                .set_octet_count(state.stats.octet_count)
                .build(timestamp);

            state.stats.last_reported_timestamp = timestamp;

            control = match control {
                Some(mut c) => {
                    c.extend_from_slice(&sr);
                    Some(c)
                }
                None => Some(sr),
            };
        }

        for m in &messages {
            if m.kind() != MessageKind::Binary {
                trace!("Not counting {:?}", m);
                continue;
            }

            let header = match RtpHeader::parse(m) {
                Ok(v) => v,
                Err(e) => {
                    warn!("Not counting outgoing RTP: {}", e);
                    continue;
                }
            };

            if header.has_padding {
                warn!(
                    "Outgoing RTP with padding, octets counted as unpadded: {:?}",
                    header.padding_len(m)
                );
            }

            let payload_len = m.len().saturating_sub(header.header_len());

            let stats = &mut state.stats;
            stats.packet_count = stats.packet_count.wrapping_add(1);
            stats.octet_count = stats.octet_count.wrapping_add(payload_len as u32);
        }

        (messages, control)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn config() -> Arc<RtpPacketizationConfig> {
        Arc::new(
            RtpPacketizationConfig::new(7.into(), "cname", 96.into(), 90_000)
                .set_start_timestamp(3000),
        )
    }

    #[test]
    fn builder_writes_sr_and_sdes() {
        let config = config();
        let m = SenderReportBuilder::new(&config)
            .set_packet_count(3)
            .set_octet_count(414)
            .set_ntp_time(0x0102_0304_0506_0708)
            .build(90_000);

        assert_eq!(
            &m[..],
            &[
                0x80, 200, 0, 6, // SR, no report blocks
                0, 0, 0, 7, // ssrc
                1, 2, 3, 4, 5, 6, 7, 8, // ntp
                0, 1, 0x5f, 0x90, // rtp time
                0, 0, 0, 3, // packet count
                0, 0, 0x01, 0x9e, // octet count
                0x81, 202, 0, 3, // SDES, one chunk
                0, 0, 0, 7, // ssrc
                1, 5, b'c', b'n', b'a', b'm', b'e', 0, // CNAME + END
            ][..]
        );
    }

    #[test]
    fn initial_last_reported_timestamp() {
        let reporter = SrReporter::new(config());
        assert_eq!(reporter.last_reported_timestamp(), 3000);
        assert_eq!(reporter.stats().packet_count, 0);
    }

    #[test]
    fn control_messages_are_not_counted() {
        let reporter = SrReporter::new(config());
        let (out, control) =
            reporter.process_outgoing(vec![Message::control(vec![0x80, 200, 0, 0])], None);

        assert_eq!(out.len(), 1);
        assert!(control.is_none());
        assert_eq!(reporter.stats(), SenderStats {
            last_reported_timestamp: 3000,
            ..Default::default()
        });
    }

    #[test]
    fn stats_serialize() {
        let stats = SenderStats {
            packet_count: 3,
            octet_count: 414,
            last_reported_timestamp: 9,
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert_eq!(
            json,
            r#"{"packet_count":3,"octet_count":414,"last_reported_timestamp":9}"#
        );
    }
}
