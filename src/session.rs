use std::collections::VecDeque;

use crate::message::{Message, MessageKind};
use crate::rtp_::{ReceiverReport, ReceptionReport, Remb, Rtcp, RtpError, RtpHeader, Ssrc};
use crate::util::{ntp_middle_32, SinkFn, SyncCallback};

/// A handler of RTCP for one media stream.
pub trait RtcpHandler {
    /// Install the sink receiving every packet this handler emits.
    ///
    /// Replaces any previously installed sink.
    fn on_outgoing(&self, sink: Box<SinkFn>);

    /// Handle a message from the remote peer.
    ///
    /// Returns the message if it should be passed on to the caller.
    fn incoming(&mut self, m: Message) -> Option<Message>;
}

/// Receive side RTCP for one media stream.
///
/// Observes incoming RTP to track the remote SSRC and highest sequence number.
/// Answers every sender report with a receiver report, and emits REMB when a
/// bitrate has been requested.
///
/// The sink slot may be replaced from any thread (see [`FeedbackSession::outgoing`]).
/// The rest of the state is owned, calls to [`RtcpHandler::incoming`] and
/// [`FeedbackSession::request_bitrate`] must be serialized by the caller.
#[derive(Debug, Default)]
pub struct FeedbackSession {
    outgoing: SyncCallback,
    ssrc: Ssrc,
    greatest_seq: u16,
    sync_rtp_time: u32,
    sync_ntp_time: u64,
    requested_bitrate: u32,
}

impl FeedbackSession {
    /// Creates a new session with no sink installed.
    pub fn new() -> Self {
        FeedbackSession::default()
    }

    /// Handle to the sink slot. Clones share the slot with this session.
    pub fn outgoing(&self) -> SyncCallback {
        self.outgoing.clone()
    }

    /// SSRC of the remote media stream, as last seen.
    pub fn ssrc(&self) -> Ssrc {
        self.ssrc
    }

    /// Greatest RTP sequence number seen. Wraparound is not handled.
    pub fn greatest_seq(&self) -> u16 {
        self.greatest_seq
    }

    /// RTP timestamp of the last sender report.
    pub fn sync_rtp_time(&self) -> u32 {
        self.sync_rtp_time
    }

    /// NTP timestamp of the last sender report.
    pub fn sync_ntp_time(&self) -> u64 {
        self.sync_ntp_time
    }

    /// The last requested bitrate. 0 means no REMB is sent on sender reports.
    pub fn requested_bitrate(&self) -> u32 {
        self.requested_bitrate
    }

    /// Ask the remote sender to stay below `bitrate` bits per second.
    ///
    /// A REMB is emitted right away, and then again for every sender report
    /// as long as the bitrate is not 0.
    pub fn request_bitrate(&mut self, bitrate: u32) {
        self.requested_bitrate = bitrate;
        self.send_remb();
    }

    fn handle_rtp(&mut self, m: Message) -> Option<Message> {
        let header = match RtpHeader::parse(&m) {
            Ok(v) => v,
            Err(e) => {
                warn!("Drop RTP: {}", e);
                return None;
            }
        };

        if header.collides_with_sr_rr() {
            let e = RtpError::Misclassified(m[1]);
            warn!("Drop RTP: {}", e);
            return None;
        }

        self.ssrc = header.ssrc;
        if header.sequence_number > self.greatest_seq {
            self.greatest_seq = header.sequence_number;
        }

        Some(m)
    }

    fn handle_rtcp(&mut self, m: &Message) {
        let mut packets = VecDeque::new();

        if let Err(e) = Rtcp::read_packet(m, &mut packets) {
            warn!("Drop rest of RTCP after {} packets: {}", packets.len(), e);
        }

        for p in packets {
            match p {
                Rtcp::ReceiverReport(rr) => {
                    self.ssrc = rr.sender_ssrc;
                }
                Rtcp::SenderReport(sr) => {
                    let info = sr.sender_info;
                    self.ssrc = info.ssrc;
                    self.sync_rtp_time = info.rtp_time;
                    self.sync_ntp_time = info.ntp_time;

                    self.send_rr();

                    if self.requested_bitrate > 0 {
                        self.send_remb();
                    }
                }
                _ => {}
            }
        }
    }

    fn send_rr(&self) {
        let report = ReceptionReport {
            ssrc: self.ssrc,
            max_seq: ReceptionReport::extended_seq(0, self.greatest_seq),
            last_sr_time: ntp_middle_32(self.sync_ntp_time),
            ..Default::default()
        };

        self.send(Rtcp::ReceiverReport(ReceiverReport {
            sender_ssrc: self.ssrc,
            reports: report.into(),
        }));
    }

    fn send_remb(&self) {
        let remb = Remb::new(self.ssrc, self.requested_bitrate as u64, vec![self.ssrc]);
        self.send(Rtcp::Remb(remb));
    }

    fn send(&self, packet: Rtcp) {
        let m = Message::control(Rtcp::to_compound([packet]));

        match self.outgoing.call(m) {
            Some(Ok(())) => {}
            Some(Err(e)) => debug!("Failed to send RTCP: {}", e),
            None => trace!("No outgoing sink, drop RTCP"),
        }
    }
}

impl RtcpHandler for FeedbackSession {
    fn on_outgoing(&self, sink: Box<SinkFn>) {
        self.outgoing.set(sink);
    }

    fn incoming(&mut self, m: Message) -> Option<Message> {
        match m.kind() {
            MessageKind::Binary => self.handle_rtp(m),
            MessageKind::Control => {
                self.handle_rtcp(&m);
                None
            }
        }
    }
}
