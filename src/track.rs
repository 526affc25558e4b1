use std::sync::Arc;

use crate::message::Message;
use crate::rtp_::RtpError;

/// A transport that outgoing RTCP is written to.
pub trait Track: Send + Sync {
    /// Send bytes to the remote peer.
    fn send(&self, data: &[u8]) -> Result<(), RtpError>;

    /// Whether the transport is open for sending.
    fn is_open(&self) -> bool;
}

/// Make a sink for [`FeedbackSession::on_outgoing`] that writes to `track`.
///
/// A closed track gives [`RtpError::TrackClosed`].
///
/// [`FeedbackSession::on_outgoing`]: crate::RtcpHandler::on_outgoing
pub fn track_sink<T>(track: Arc<T>) -> impl Fn(Message) -> Result<(), RtpError> + Send + Sync
where
    T: Track + ?Sized + 'static,
{
    move |m: Message| {
        if !track.is_open() {
            return Err(RtpError::TrackClosed);
        }
        track.send(&m)
    }
}
