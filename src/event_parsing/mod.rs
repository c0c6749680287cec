use std::convert::TryFrom;

pub mod attachment;
pub mod message;
pub mod parsing;
pub mod payload_size;
pub mod prefix;

use self::parsing::{from_bytes_to_text, num_to_b64};
use self::payload_size::PayloadType;
use crate::{
    error::Error,
    event::{receipt::Receipt, sections::seal::{EventSeal, SourceSeal}, KeyEvent},
    event_message::{
        signed_event_message::{
            Message, SignedEventMessage, SignedNontransferableReceipt, SignedTransferableReceipt,
        },
        EventMessage, EventTypeTag,
    },
    prefix::{AttachedSignaturePrefix, BasicPrefix, Prefix, SelfSigningPrefix},
};

/// Attached cryptographic material, framed by counter codes.
#[derive(Debug, Clone, PartialEq)]
pub enum Attachment {
    /// Indexed signatures made by the event controller
    AttachedSignatures(Vec<AttachedSignaturePrefix>),
    /// Nontransferable identifier and signature couplets
    ReceiptCouplets(Vec<(BasicPrefix, SelfSigningPrefix)>),
    /// Establishment event seal and associated indexed signatures
    SealSignaturesGroups(Vec<(EventSeal, Vec<AttachedSignaturePrefix>)>),
    /// Source seals anchoring delegated events
    SealSourceCouplets(Vec<SourceSeal>),
    /// Grouping frame counted in quadlets
    Frame(Vec<Attachment>),
}

pub(crate) fn pack_sn(sn: u64) -> String {
    let sn_raw: Vec<u8> = sn.to_be_bytes().to_vec();
    // left pad to 16 bytes, encoded as 22 characters after the code
    let padding = 16 - sn_raw.len();
    let padded: Vec<u8> = std::iter::repeat(0u8)
        .take(padding)
        .chain(sn_raw.into_iter())
        .collect();
    ["0A", &from_bytes_to_text(&padded)[2..]].join("")
}

impl Attachment {
    pub fn to_cesr(&self) -> String {
        let (payload_type, count, data) = match self {
            Attachment::AttachedSignatures(sigs) => {
                let data = sigs.iter().map(|s| s.to_str()).collect::<String>();
                (PayloadType::MA, sigs.len(), data)
            }
            Attachment::ReceiptCouplets(couplets) => {
                let data = couplets
                    .iter()
                    .map(|(bp, sp)| [bp.to_str(), sp.to_str()].join(""))
                    .collect::<String>();
                (PayloadType::MC, couplets.len(), data)
            }
            Attachment::SealSignaturesGroups(seals_signatures) => {
                let data = seals_signatures
                    .iter()
                    .map(|(seal, sigs)| {
                        [
                            seal.prefix.to_str(),
                            pack_sn(seal.sn),
                            seal.event_digest.to_str(),
                            Attachment::AttachedSignatures(sigs.to_vec()).to_cesr(),
                        ]
                        .join("")
                    })
                    .collect::<String>();
                (PayloadType::MF, seals_signatures.len(), data)
            }
            Attachment::SealSourceCouplets(sources) => {
                let data = sources
                    .iter()
                    .map(|s| [pack_sn(s.sn), s.digest.to_str()].join(""))
                    .collect::<String>();
                (PayloadType::MG, sources.len(), data)
            }
            Attachment::Frame(atts) => {
                let data = atts.iter().map(|att| att.to_cesr()).collect::<String>();
                // frame count is in quadlets of the framed material
                (PayloadType::MV, data.len() / 4, data)
            }
        };
        [payload_type.to_str(), num_to_b64(count as u16, 2), data].join("")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EventType {
    KeyEvent(EventMessage<KeyEvent>),
    Receipt(EventMessage<Receipt>),
}

impl EventType {
    pub fn serialize(&self) -> Result<Vec<u8>, Error> {
        match self {
            EventType::KeyEvent(event) => event.serialize(),
            EventType::Receipt(rct) => rct.serialize(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SignedEventData {
    pub deserialized_event: EventType,
    pub attachments: Vec<Attachment>,
}

impl SignedEventData {
    pub fn to_cesr(&self) -> Result<Vec<u8>, Error> {
        let attachments = self
            .attachments
            .iter()
            .map(|att| att.to_cesr())
            .collect::<String>()
            .as_bytes()
            .to_vec();
        Ok([self.deserialized_event.serialize()?, attachments].concat())
    }
}

impl From<&SignedEventMessage> for SignedEventData {
    fn from(ev: &SignedEventMessage) -> Self {
        let mut attachments = vec![Attachment::AttachedSignatures(ev.signatures.clone())];
        if let Some(seal) = &ev.delegator_seal {
            attachments.push(Attachment::SealSourceCouplets(vec![seal.clone()]));
        }
        SignedEventData {
            deserialized_event: EventType::KeyEvent(ev.event_message.clone()),
            attachments,
        }
    }
}

impl From<SignedNontransferableReceipt> for SignedEventData {
    fn from(rcp: SignedNontransferableReceipt) -> SignedEventData {
        SignedEventData {
            deserialized_event: EventType::Receipt(rcp.body),
            attachments: vec![Attachment::ReceiptCouplets(rcp.couplets)],
        }
    }
}

impl From<SignedTransferableReceipt> for SignedEventData {
    fn from(rcp: SignedTransferableReceipt) -> SignedEventData {
        SignedEventData {
            deserialized_event: EventType::Receipt(rcp.body),
            attachments: vec![Attachment::SealSignaturesGroups(vec![(
                rcp.validator_seal,
                rcp.signatures,
            )])],
        }
    }
}

impl From<Message> for SignedEventData {
    fn from(message: Message) -> Self {
        match message {
            Message::Event(event) => SignedEventData::from(&event),
            Message::NontransferableRct(rct) => SignedEventData::from(rct),
            Message::TransferableRct(vrc) => SignedEventData::from(vrc),
        }
    }
}

impl TryFrom<SignedEventData> for Message {
    type Error = Error;

    fn try_from(value: SignedEventData) -> Result<Self, Self::Error> {
        // unpack counted frames first
        let attachments: Vec<Attachment> = value
            .attachments
            .into_iter()
            .flat_map(|att| match att {
                Attachment::Frame(atts) => atts,
                att => vec![att],
            })
            .collect();

        match value.deserialized_event {
            EventType::KeyEvent(event) => {
                let signatures = attachments
                    .iter()
                    .flat_map(|att| match att {
                        Attachment::AttachedSignatures(sigs) => sigs.clone(),
                        _ => vec![],
                    })
                    .collect::<Vec<_>>();
                if signatures.is_empty() {
                    return Err(Error::MissingSignatures);
                }
                let delegator_seal = attachments.iter().find_map(|att| match att {
                    Attachment::SealSourceCouplets(seals) => seals.last().cloned(),
                    _ => None,
                });
                Ok(Message::Event(SignedEventMessage::new(
                    &event,
                    signatures,
                    delegator_seal,
                )))
            }
            EventType::Receipt(rct) => match rct.event_type {
                EventTypeTag::Rct => {
                    let couplets = attachments
                        .iter()
                        .flat_map(|att| match att {
                            Attachment::ReceiptCouplets(couplets) => couplets.clone(),
                            _ => vec![],
                        })
                        .collect::<Vec<_>>();
                    if couplets.is_empty() {
                        return Err(Error::MissingSignatures);
                    }
                    Ok(Message::NontransferableRct(
                        SignedNontransferableReceipt::new(&rct, couplets),
                    ))
                }
                EventTypeTag::Vrc => {
                    let (seal, signatures) = attachments
                        .iter()
                        .find_map(|att| match att {
                            Attachment::SealSignaturesGroups(groups) => groups.first().cloned(),
                            _ => None,
                        })
                        .ok_or(Error::MissingSignatures)?;
                    Ok(Message::TransferableRct(SignedTransferableReceipt::new(
                        rct, seal, signatures,
                    )))
                }
                _ => Err(Error::SemanticError("Improper receipt type tag".into())),
            },
        }
    }
}

#[test]
fn test_pack_sn() {
    use crate::event_parsing::prefix::attached_sn;

    for sn in &[0u64, 1, 3, 64, 1024, u32::MAX as u64] {
        let packed = pack_sn(*sn);
        assert_eq!(packed.len(), 24);
        let (rest, parsed) = attached_sn(packed.as_bytes()).unwrap();
        assert!(rest.is_empty());
        assert_eq!(parsed, *sn);
    }
}
