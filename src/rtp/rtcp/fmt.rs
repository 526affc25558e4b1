/// Number of _something_ in the RTCP packet.
///
/// PacketType determines how to interpret the count field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackMessageType {
    /// When packet type SenderReport or ReceiverReport.
    ///
    /// The contained u8 is number of receiver reports.
    ReceptionReport(u8),

    /// When packet type SourceDescription (SDES).
    ///
    /// The contained u8 is number of contained SDES chunks.
    SourceCount(u8),

    /// When packet type is PayloadSpecificFeedback.
    PayloadFeedback(PayloadType),

    /// Any other packet type. The raw 5 bits.
    Other(u8),
}

impl FeedbackMessageType {
    /// The count for SR, RR and SDES. 0 for other types.
    pub fn count(&self) -> u8 {
        match self {
            FeedbackMessageType::ReceptionReport(v) => *v,
            FeedbackMessageType::SourceCount(v) => *v,
            _ => 0,
        }
    }
}

impl From<FeedbackMessageType> for u8 {
    fn from(val: FeedbackMessageType) -> Self {
        use FeedbackMessageType::*;
        match val {
            ReceptionReport(v) | SourceCount(v) | Other(v) => {
                assert!(v <= 31, "rtcp fmt when count must be <= 31");
                v
            }
            PayloadFeedback(v) => v as u8,
        }
    }
}

/// Subtypes of [`FeedbackMessageType::PayloadFeedback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadType {
    /// Picture loss indication.
    PictureLossIndication = 1,
    /// Slice loss indication.
    SliceLossIndication = 2,
    /// Reference picture selection indication.
    ReferencePictureSelectionIndication = 3,
    /// Full intra request.
    FullIntraRequest = 4,
    /// Application layer feedback. REMB lives here.
    ///
    /// Definition: <https://datatracker.ietf.org/doc/html/draft-alvestrand-rmcat-remb-03>
    ApplicationLayer = 15,
}

impl TryFrom<u8> for PayloadType {
    type Error = &'static str;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        use PayloadType::*;
        match v {
            1 => Ok(PictureLossIndication),
            2 => Ok(SliceLossIndication),
            3 => Ok(ReferencePictureSelectionIndication),
            4 => Ok(FullIntraRequest),
            15 => Ok(ApplicationLayer),
            _ => {
                trace!("Unknown PayloadType: {}", v);
                Err("Unknown PayloadType")
            }
        }
    }
}
