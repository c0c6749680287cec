use nom::{error::ErrorKind, multi::count};

use super::{
    parsing::b64_to_num,
    payload_size::PayloadType,
    prefix::{
        attached_signature, attached_sn, basic_prefix, prefix, self_addressing_prefix,
        self_signing_prefix,
    },
    Attachment,
};
use crate::{
    event::sections::seal::{EventSeal, SourceSeal},
    prefix::{AttachedSignaturePrefix, BasicPrefix, SelfSigningPrefix},
};

pub(crate) fn b64_count(s: &[u8]) -> nom::IResult<&[u8], u16> {
    let (rest, t) = nom::bytes::streaming::take(2u8)(s)?;
    let count = b64_to_num(t).map_err(|_| nom::Err::Error((s, ErrorKind::IsNot)))?;
    Ok((rest, count))
}

fn signatures(s: &[u8]) -> nom::IResult<&[u8], Vec<AttachedSignaturePrefix>> {
    let (rest, sc) = b64_count(s)?;
    count(attached_signature, sc as usize)(rest)
}

fn couplets(s: &[u8]) -> nom::IResult<&[u8], Vec<(BasicPrefix, SelfSigningPrefix)>> {
    let (rest, sc) = b64_count(s)?;

    count(
        nom::sequence::tuple((basic_prefix, self_signing_prefix)),
        sc as usize,
    )(rest)
}

/// returns attached source seals
fn source_seal(s: &[u8]) -> nom::IResult<&[u8], Vec<SourceSeal>> {
    let (rest, sc) = b64_count(s)?;

    let (rest, attachment) = count(
        nom::sequence::tuple((attached_sn, self_addressing_prefix)),
        sc as usize,
    )(rest)?;
    Ok((
        rest,
        attachment
            .into_iter()
            .map(|(sn, digest)| SourceSeal::new(sn, digest))
            .collect(),
    ))
}

fn event_seal(s: &[u8]) -> nom::IResult<&[u8], EventSeal> {
    let (rest, identifier) = prefix(s)?;

    let (rest, sn) = attached_sn(rest)?;
    let (rest, event_digest) = self_addressing_prefix(rest)?;
    let seal = EventSeal {
        prefix: identifier,
        sn,
        event_digest,
    };

    Ok((rest, seal))
}

fn indexed_signatures(input: &[u8]) -> nom::IResult<&[u8], Vec<AttachedSignaturePrefix>> {
    attachment(input).map(|(rest, att)| match att {
        Attachment::AttachedSignatures(sigs) => Ok((rest, sigs)),
        _ => Err(nom::Err::Error((input, ErrorKind::IsNot))),
    })?
}

fn seal_signatures(
    s: &[u8],
) -> nom::IResult<&[u8], Vec<(EventSeal, Vec<AttachedSignaturePrefix>)>> {
    let (rest, sc) = b64_count(s)?;
    count(
        nom::sequence::tuple((event_seal, indexed_signatures)),
        sc as usize,
    )(rest)
}

pub fn attachment(s: &[u8]) -> nom::IResult<&[u8], Attachment> {
    // counter sniffing never waits for more input, so a clean end of
    // stream stops the attachment loop instead of signalling shortage
    let (rest, payload_type) = nom::bytes::complete::take(2u8)(s)?;
    let payload_type: PayloadType = std::str::from_utf8(payload_type)
        .map_err(|_e| nom::Err::Error((s, ErrorKind::IsNot)))?
        .parse()
        .map_err(|_e| nom::Err::Error((s, ErrorKind::IsNot)))?;
    match payload_type {
        PayloadType::MA => {
            let (rest, sigs) = signatures(rest)?;
            Ok((rest, Attachment::AttachedSignatures(sigs)))
        }
        PayloadType::MC => {
            let (rest, couplets) = couplets(rest)?;
            Ok((rest, Attachment::ReceiptCouplets(couplets)))
        }
        PayloadType::MF => {
            let (rest, event_seals) = seal_signatures(rest)?;
            Ok((rest, Attachment::SealSignaturesGroups(event_seals)))
        }
        PayloadType::MG => {
            let (rest, source_seals) = source_seal(rest)?;
            Ok((rest, Attachment::SealSourceCouplets(source_seals)))
        }
        PayloadType::MV => {
            let (rest, sc) = b64_count(rest)?;
            // sc quadlets of framed attachments
            let (rest, total) = nom::bytes::streaming::take(sc * 4)(rest)?;
            let (extra, atts) = nom::multi::many0(attachment)(total)?;
            if !extra.is_empty() {
                return Err(nom::Err::Error((s, ErrorKind::IsNot)));
            }
            Ok((rest, Attachment::Frame(atts)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derivation::self_addressing::SelfAddressing;
    use crate::prefix::IdentifierPrefix;

    #[test]
    fn test_sigs() {
        let sig_group = ["-AAB", "AA", &"A".repeat(86)].join("");
        assert_eq!(
            attachment(sig_group.as_bytes()),
            Ok((
                "".as_bytes(),
                Attachment::AttachedSignatures(vec![AttachedSignaturePrefix::new(
                    SelfSigningPrefix::Ed25519Sha512(vec![0u8; 64]),
                    0
                )])
            ))
        );

        let with_extra = [&sig_group, "extra data and stuff"].join("");
        let (rest, _) = attachment(with_extra.as_bytes()).unwrap();
        assert_eq!(rest, "extra data and stuff".as_bytes());
    }

    #[test]
    fn test_source_seal() {
        let digest = SelfAddressing::Blake3_256.derive(b"delegating event");
        let source = SourceSeal::new(1, digest);
        let serialized = Attachment::SealSourceCouplets(vec![source.clone(), source.clone()])
            .to_cesr();

        let (rest, att) = attachment(serialized.as_bytes()).unwrap();
        assert!(rest.is_empty());
        assert_eq!(att, Attachment::SealSourceCouplets(vec![source.clone(), source]));
    }

    #[test]
    fn test_seal_signature_group() {
        let digest = SelfAddressing::Blake3_256.derive(b"receipted event");
        let seal = EventSeal::new(
            IdentifierPrefix::SelfAddressing(SelfAddressing::Blake3_256.derive(b"receipter")),
            0,
            digest,
        );
        let sigs = vec![AttachedSignaturePrefix::new(
            SelfSigningPrefix::Ed25519Sha512(vec![0u8; 64]),
            0,
        )];
        let serialized = Attachment::SealSignaturesGroups(vec![(seal.clone(), sigs.clone())])
            .to_cesr();

        let (rest, att) = attachment(serialized.as_bytes()).unwrap();
        assert!(rest.is_empty());
        assert_eq!(att, Attachment::SealSignaturesGroups(vec![(seal, sigs)]));
    }

    #[test]
    fn test_frame() {
        let inner = Attachment::AttachedSignatures(vec![AttachedSignaturePrefix::new(
            SelfSigningPrefix::Ed25519Sha512(vec![0u8; 64]),
            0,
        )]);
        let framed = Attachment::Frame(vec![inner.clone()]).to_cesr();

        let (rest, att) = attachment(framed.as_bytes()).unwrap();
        assert!(rest.is_empty());
        assert_eq!(att, Attachment::Frame(vec![inner]));
    }

    #[test]
    fn test_truncated_group_needs_more() {
        let sig_group = ["-AAB", "AA", &"A".repeat(40)].join("");
        assert!(matches!(
            attachment(sig_group.as_bytes()),
            Err(nom::Err::Incomplete(_))
        ));
    }
}
