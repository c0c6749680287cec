use nom::{branch::alt, error::ErrorKind, multi::fold_many0, multi::many0, Needed};
use serde::de::DeserializeOwned;

use super::{attachment::attachment, Attachment, EventType, SignedEventData};
use crate::{
    error::Error,
    event::{receipt::Receipt, KeyEvent},
    event_message::{
        serialization_info::{SerializationFormats, SerializationInfo, VERSION_STRING_LEN},
        EventMessage,
    },
};

// The version string sits within the first few bytes of every
// serialization kind; this window is enough to locate and read it.
const VERSION_PEEK_WINDOW: usize = 24;

/// Peeks the version string of the next message without consuming input.
pub(crate) fn version(data: &[u8]) -> nom::IResult<&[u8], SerializationInfo> {
    let window = &data[..data.len().min(VERSION_PEEK_WINDOW)];
    let pos = match window.windows(4).position(|w| w == b"KERI") {
        Some(pos) => pos,
        None if data.len() < VERSION_PEEK_WINDOW => {
            return Err(nom::Err::Incomplete(Needed::Size(
                VERSION_PEEK_WINDOW - data.len(),
            )))
        }
        None => return Err(nom::Err::Error((data, ErrorKind::IsNot))),
    };
    let (_, with_version) = nom::bytes::streaming::take(pos + VERSION_STRING_LEN)(data)?;
    let info: SerializationInfo = std::str::from_utf8(&with_version[pos..])
        .map_err(|_| nom::Err::Error((data, ErrorKind::IsNot)))?
        .parse()
        .map_err(|_| nom::Err::Error((data, ErrorKind::IsNot)))?;
    Ok((data, info))
}

/// Parses one framed message of any serialization kind. Returns
/// `Incomplete` until the buffer holds the full size declared by the
/// version string.
pub fn message<D: DeserializeOwned>(s: &[u8]) -> nom::IResult<&[u8], EventMessage<D>> {
    let (_, info) = version(s)?;
    if s.len() < info.size {
        return Err(nom::Err::Incomplete(Needed::Size(info.size - s.len())));
    }
    let (rest, raw) = nom::bytes::complete::take(info.size)(s)?;
    let event: EventMessage<D> = match info.kind {
        SerializationFormats::JSON => {
            serde_json::from_slice(raw).map_err(|_| nom::Err::Error((s, ErrorKind::IsNot)))?
        }
        SerializationFormats::CBOR => {
            serde_cbor::from_slice(raw).map_err(|_| nom::Err::Error((s, ErrorKind::IsNot)))?
        }
        SerializationFormats::MGPK => {
            rmp_serde::from_read_ref(raw).map_err(|_| nom::Err::Error((s, ErrorKind::IsNot)))?
        }
    };
    Ok((rest, event))
}

pub fn key_event_message(s: &[u8]) -> nom::IResult<&[u8], EventType> {
    message::<KeyEvent>(s).map(|d| (d.0, EventType::KeyEvent(d.1)))
}

pub fn receipt_message(s: &[u8]) -> nom::IResult<&[u8], EventType> {
    message::<Receipt>(s).map(|d| (d.0, EventType::Receipt(d.1)))
}

pub fn event_message(s: &[u8]) -> nom::IResult<&[u8], EventType> {
    alt((key_event_message, receipt_message))(s)
}

pub fn signed_message(s: &[u8]) -> nom::IResult<&[u8], SignedEventData> {
    let (rest, event) = event_message(s)?;
    let (rest, attachments): (&[u8], Vec<Attachment>) =
        fold_many0(attachment, vec![], |mut acc: Vec<_>, item| {
            acc.push(item);
            acc
        })(rest)?;

    Ok((
        rest,
        SignedEventData {
            deserialized_event: event,
            attachments,
        },
    ))
}

pub fn signed_event_stream(s: &[u8]) -> nom::IResult<&[u8], Vec<SignedEventData>> {
    many0(signed_message)(s)
}

/// Reparses event bytes loaded back from the log.
pub fn key_event_from_raw(raw: &[u8]) -> Result<EventMessage<KeyEvent>, Error> {
    match message::<KeyEvent>(raw) {
        Ok((_, event)) => Ok(event),
        Err(nom::Err::Incomplete(Needed::Size(n))) => Err(Error::ShortageError(n)),
        Err(nom::Err::Incomplete(_)) => Err(Error::ShortageError(1)),
        Err(_) => Err(Error::DeserializeError(
            "Unparseable stored event".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derivation::self_addressing::SelfAddressing;
    use crate::event::sections::threshold::SignatureThreshold;
    use crate::event_message::event_msg_builder::EventMsgBuilder;
    use crate::event_message::EventTypeTag;
    use crate::prefix::BasicPrefix;
    use crate::signer::setup_signers;

    fn test_event_stream() -> Vec<u8> {
        let signers = setup_signers(3);
        let keys = vec![BasicPrefix::Ed25519(signers[0].public_key())];
        let next_keys = vec![BasicPrefix::Ed25519(signers[1].public_key())];

        let icp = EventMsgBuilder::new(EventTypeTag::Icp)
            .with_keys(keys)
            .with_threshold(&SignatureThreshold::Simple(1))
            .with_next_keys(next_keys)
            .with_next_threshold(&SignatureThreshold::Simple(1))
            .build()
            .unwrap();
        let signed = signers[0].sign_indexed(&icp, 0).unwrap();
        signed.serialize().unwrap()
    }

    #[test]
    fn test_version_peek() {
        let stream = test_event_stream();
        let (_, info) = version(&stream).unwrap();
        assert_eq!(info.kind, SerializationFormats::JSON);
        assert!(info.size > 0);

        // too few bytes to even locate the version string
        assert!(matches!(
            version(&stream[..10]),
            Err(nom::Err::Incomplete(_))
        ));
    }

    #[test]
    fn test_signed_event_parse() {
        let stream = test_event_stream();
        let (rest, parsed) = signed_message(&stream).unwrap();
        assert!(rest.is_empty());
        assert!(matches!(parsed.deserialized_event, EventType::KeyEvent(_)));
        assert_eq!(parsed.attachments.len(), 1);

        // re-serialization is byte exact
        assert_eq!(parsed.to_cesr().unwrap(), stream);
    }

    #[test]
    fn test_shortage() {
        let stream = test_event_stream();
        // cut inside the event body
        assert!(matches!(
            signed_message(&stream[..40]),
            Err(nom::Err::Incomplete(_))
        ));
        // cut inside the attached signature
        assert!(matches!(
            signed_message(&stream[..stream.len() - 10]),
            Err(nom::Err::Incomplete(_))
        ));
    }

    #[test]
    fn test_stream_of_two() {
        let stream = [test_event_stream(), test_event_stream()].concat();
        let (rest, messages) = signed_event_stream(&stream).unwrap();
        assert!(rest.is_empty());
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn test_receipt_parse() {
        use crate::event_message::EventMessage;
        use crate::prefix::IdentifierPrefix;

        let digest = SelfAddressing::Blake3_256.derive(b"receipted event body");
        let rct = EventMessage::new_receipt(
            SerializationFormats::JSON,
            EventTypeTag::Rct,
            digest.clone(),
            Receipt::new(IdentifierPrefix::SelfAddressing(digest), 0),
        )
        .unwrap();

        let serialized = rct.serialize().unwrap();
        let (rest, parsed) = event_message(&serialized).unwrap();
        assert!(rest.is_empty());
        assert!(matches!(parsed, EventType::Receipt(_)));
    }
}
