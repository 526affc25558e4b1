#![allow(unused)]
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};

use rtcpkit::rtp::rtcp::Rtcp;
use rtcpkit::rtp::RtpHeader;
use rtcpkit::{Message, RtcpHandler, SinkFn};

pub fn init_log() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    static START: Once = Once::new();

    START.call_once(|| {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(env_filter)
            .init();
    });
}

/// Collects everything written to a sink.
#[derive(Clone, Default)]
pub struct Captured(Arc<Mutex<Vec<Message>>>);

impl Captured {
    pub fn install(handler: &impl RtcpHandler) -> Self {
        let c = Captured::default();
        handler.on_outgoing(c.sink());
        c
    }

    pub fn sink(&self) -> Box<SinkFn> {
        let inner = self.0.clone();
        Box::new(move |m| {
            inner.lock().unwrap().push(m);
            Ok(())
        })
    }

    /// Take the captured messages, each parsed as compound RTCP.
    pub fn take(&self) -> Vec<Vec<Rtcp>> {
        let mut lock = self.0.lock().unwrap();
        lock.drain(..).map(|m| parse_rtcp(&m)).collect()
    }
}

pub fn parse_rtcp(buf: &[u8]) -> Vec<Rtcp> {
    let mut parsed = VecDeque::new();
    Rtcp::read_packet(buf, &mut parsed).expect("valid RTCP");
    parsed.into()
}

/// An RTP packet of `len` bytes in total, with a 12 byte header.
pub fn rtp(seq: u16, ssrc: u32, len: usize) -> Message {
    let header = RtpHeader {
        sequence_number: seq,
        ssrc: ssrc.into(),
        ..Default::default()
    };
    let mut buf = vec![0; len];
    header.write_to(&mut buf);
    Message::binary(buf)
}
