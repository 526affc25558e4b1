use std::sync::Arc;

use rtcpkit::rtp::rtcp::{Rtcp, SdesType};
use rtcpkit::rtp::RtpHeader;
use rtcpkit::{MediaHandler, Message, RtpPacketizationConfig, SenderStats, SrReporter};

mod common;
use common::{init_log, parse_rtcp, rtp};

fn config() -> Arc<RtpPacketizationConfig> {
    Arc::new(
        RtpPacketizationConfig::new(42.into(), "video-send", 96.into(), 90_000)
            .set_start_timestamp(1000),
    )
}

fn batch() -> Vec<Message> {
    vec![rtp(1, 42, 100), rtp(2, 42, 150), rtp(3, 42, 200)]
}

#[test]
pub fn counts_packets_and_payload_octets() {
    init_log();

    let reporter = SrReporter::new(config());
    let (out, control) = reporter.process_outgoing(batch(), None);

    assert_eq!(out, batch());
    assert!(control.is_none());

    let stats = reporter.stats();
    assert_eq!(stats.packet_count, 3);
    assert_eq!(stats.octet_count, (100 - 12) + (150 - 12) + (200 - 12));
    assert_eq!(stats.octet_count, 414);
}

#[test]
pub fn sr_counts_are_taken_before_the_batch() {
    init_log();

    let config = config();
    let reporter = SrReporter::new(config.clone());

    reporter.process_outgoing(batch(), None);

    config.set_timestamp(4000);
    reporter.set_needs_to_report();
    let (_, control) = reporter.process_outgoing(batch(), None);

    let control = control.expect("control message with SR");
    assert!(control.is_control());

    let packets = parse_rtcp(&control);
    assert_eq!(packets.len(), 2);

    let Rtcp::SenderReport(sr) = &packets[0] else {
        panic!("Expected SR: {:?}", packets[0]);
    };
    assert_eq!(sr.sender_info.ssrc, 42.into());
    assert_eq!(sr.sender_info.rtp_time, 4000);
    assert_eq!(sr.sender_info.sender_packet_count, 3);
    assert_eq!(sr.sender_info.sender_octet_count, 414);
    assert!(sr.reports.is_empty());

    let Rtcp::SourceDescription(sdes) = &packets[1] else {
        panic!("Expected SDES: {:?}", packets[1]);
    };
    assert_eq!(sdes.reports.len(), 1);
    let chunk = &sdes.reports[0];
    assert_eq!(chunk.ssrc, 42.into());
    assert_eq!(chunk.values[0], (SdesType::CNAME, "video-send".to_string()));

    assert_eq!(
        reporter.stats(),
        SenderStats {
            packet_count: 6,
            octet_count: 828,
            last_reported_timestamp: 4000,
        }
    );
}

#[test]
pub fn report_only_once_per_trigger() {
    init_log();

    let reporter = SrReporter::new(config());
    assert_eq!(reporter.last_reported_timestamp(), 1000);

    reporter.set_needs_to_report();
    reporter.set_needs_to_report();

    let (_, first) = reporter.process_outgoing(batch(), None);
    let (_, second) = reporter.process_outgoing(batch(), None);

    assert!(first.is_some());
    assert!(second.is_none());
}

#[test]
pub fn sr_is_appended_to_existing_control() {
    init_log();

    let reporter = SrReporter::new(config());
    reporter.set_needs_to_report();

    let upstream = vec![0x80, 201, 0, 1, 0, 0, 0, 7];
    let (_, control) = reporter.process_outgoing(vec![], Some(Message::control(upstream.clone())));

    let control = control.unwrap();
    assert_eq!(&control[..8], &upstream[..]);

    let packets = parse_rtcp(&control);
    assert_eq!(packets.len(), 3);
    assert!(matches!(packets[0], Rtcp::ReceiverReport(_)));
    assert!(matches!(packets[1], Rtcp::SenderReport(_)));
    assert!(matches!(packets[2], Rtcp::SourceDescription(_)));
}

#[test]
pub fn trigger_from_other_thread() {
    init_log();

    let reporter = Arc::new(SrReporter::new(config()));

    let r = reporter.clone();
    std::thread::spawn(move || r.set_needs_to_report())
        .join()
        .unwrap();

    let (_, control) = reporter.process_outgoing(batch(), None);
    assert!(control.is_some());
}

#[test]
pub fn padded_rtp_is_counted_unpadded() {
    init_log();

    let header = RtpHeader {
        has_padding: true,
        ssrc: 42.into(),
        ..Default::default()
    };
    let mut buf = vec![0; 100];
    header.write_to(&mut buf);
    buf[99] = 4;

    let reporter = SrReporter::new(config());
    reporter.process_outgoing(vec![Message::binary(buf)], None);

    assert_eq!(reporter.stats().octet_count, 88);
}
