use core::str::FromStr;

use nom::{bytes::streaming::take, error::ErrorKind};

use crate::derivation::{
    basic::Basic, self_addressing::SelfAddressing, self_signing::SelfSigning, DerivationCode,
};
use crate::event_parsing::parsing::from_text_to_bytes;
use crate::prefix::{
    AttachedSignaturePrefix, BasicPrefix, IdentifierPrefix, SelfAddressingPrefix,
    SelfSigningPrefix,
};

fn take_parsed<'a, P: FromStr>(s: &'a [u8], total: usize) -> nom::IResult<&'a [u8], P> {
    let (rest, chunk) = take(total)(s)?;
    let parsed = std::str::from_utf8(chunk)
        .map_err(|_| nom::Err::Error((s, ErrorKind::IsNot)))?
        .parse::<P>()
        .map_err(|_| nom::Err::Error((s, ErrorKind::IsNot)))?;
    Ok((rest, parsed))
}

pub fn attached_signature(s: &[u8]) -> nom::IResult<&[u8], AttachedSignaturePrefix> {
    let (_, type_c) = take(1u8)(s)?;

    let total = match type_c {
        b"A" | b"C" => 88usize,
        b"0" => 156,
        b"2" => {
            let (_, code) = take(2u8)(s)?;
            match code {
                b"2A" | b"2C" => 92,
                b"2D" => 158,
                _ => return Err(nom::Err::Error((s, ErrorKind::IsNot))),
            }
        }
        _ => return Err(nom::Err::Error((s, ErrorKind::IsNot))),
    };

    take_parsed(s, total)
}

pub fn basic_prefix(s: &[u8]) -> nom::IResult<&[u8], BasicPrefix> {
    let (_, type_c) = take(1u8)(s)?;

    let code_len = match type_c {
        b"1" => 4u8,
        _ => 1,
    };
    let (_, code_str) = take(code_len)(s)?;
    let code: Basic = std::str::from_utf8(code_str)
        .map_err(|_| nom::Err::Error((s, ErrorKind::IsNot)))?
        .parse()
        .map_err(|_| nom::Err::Error((s, ErrorKind::IsNot)))?;

    take_parsed(s, code.prefix_b64_len())
}

pub fn self_addressing_prefix(s: &[u8]) -> nom::IResult<&[u8], SelfAddressingPrefix> {
    let (_, type_c) = take(1u8)(s)?;

    let code_len = match type_c {
        b"0" => 2u8,
        _ => 1,
    };
    let (_, code_str) = take(code_len)(s)?;
    let code: SelfAddressing = std::str::from_utf8(code_str)
        .map_err(|_| nom::Err::Error((s, ErrorKind::IsNot)))?
        .parse()
        .map_err(|_| nom::Err::Error((s, ErrorKind::IsNot)))?;

    take_parsed(s, code.prefix_b64_len())
}

pub fn self_signing_prefix(s: &[u8]) -> nom::IResult<&[u8], SelfSigningPrefix> {
    let (_, type_c) = take(1u8)(s)?;

    let code_len = match type_c {
        b"1" => 4u8,
        _ => 2,
    };
    let (_, code_str) = take(code_len)(s)?;
    let code: SelfSigning = std::str::from_utf8(code_str)
        .map_err(|_| nom::Err::Error((s, ErrorKind::IsNot)))?
        .parse()
        .map_err(|_| nom::Err::Error((s, ErrorKind::IsNot)))?;

    take_parsed(s, code.prefix_b64_len())
}

pub fn attached_sn(s: &[u8]) -> nom::IResult<&[u8], u64> {
    let (more, type_c) = take(2u8)(s)?;

    match type_c {
        b"0A" => {
            let (rest, parsed_sn) = take(22u8)(more)?;

            let sn = {
                let b64decode = from_text_to_bytes(parsed_sn)
                    .map_err(|_| nom::Err::Error((s, ErrorKind::IsNot)))?[2..]
                    .to_vec();
                let mut sn_array: [u8; 8] = [0; 8];
                sn_array.copy_from_slice(&b64decode[8..]);
                u64::from_be_bytes(sn_array)
            };

            Ok((rest, sn))
        }
        _ => Err(nom::Err::Error((type_c, ErrorKind::IsNot))),
    }
}

/// extracts an identifier prefix
pub fn prefix(s: &[u8]) -> nom::IResult<&[u8], IdentifierPrefix> {
    match self_addressing_prefix(s) {
        Ok(sap) => Ok((sap.0, IdentifierPrefix::SelfAddressing(sap.1))),
        Err(nom::Err::Incomplete(e)) => Err(nom::Err::Incomplete(e)),
        Err(_) => match basic_prefix(s) {
            Ok(bp) => Ok((bp.0, IdentifierPrefix::Basic(bp.1))),
            Err(e) => Err(e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::PublicKey;
    use crate::prefix::Prefix;

    #[test]
    fn test_attached_signature() {
        let sig_str = ["AA", &"A".repeat(86)].join("");
        let (rest, sig) = attached_signature(sig_str.as_bytes()).unwrap();
        assert!(rest.is_empty());
        assert_eq!(
            sig,
            AttachedSignaturePrefix::new(SelfSigningPrefix::Ed25519Sha512(vec![0u8; 64]), 0)
        );

        let dual_str = ["2AABAE", &"A".repeat(86), "extra"].join("");
        let (rest, sig) = attached_signature(dual_str.as_bytes()).unwrap();
        assert_eq!(rest, b"extra");
        assert_eq!(sig.index.current(), 1);
        assert_eq!(sig.index.previous_next(), Some(4));
    }

    #[test]
    fn test_basic_prefix() {
        use ed25519_dalek::Keypair;
        use rand::rngs::OsRng;

        let kp = Keypair::generate(&mut OsRng);

        let bp = BasicPrefix::Ed25519(PublicKey::new(kp.public.to_bytes().to_vec()));
        let bp_str = [&bp.to_str(), "more"].join("");
        let parsed = basic_prefix(bp_str.as_bytes()).unwrap();
        assert_eq!(parsed, ("more".as_bytes(), bp))
    }

    #[test]
    fn test_self_addressing() {
        use crate::derivation::self_addressing::SelfAddressing;

        let sap = SelfAddressing::Blake3_256.derive(b"some data");
        let str_to_parse = [&sap.to_str(), "more"].join("");
        assert_eq!(
            self_addressing_prefix(str_to_parse.as_bytes()),
            Ok(("more".as_bytes(), sap))
        );
    }

    #[test]
    fn test_incomplete_input() {
        // a truncated primitive must ask for more input, not fail
        let sig_str = ["AA", &"A".repeat(40)].join("");
        assert!(matches!(
            attached_signature(sig_str.as_bytes()),
            Err(nom::Err::Incomplete(_))
        ));
    }

    #[test]
    fn test_sn_parse() {
        let sn = attached_sn("0AAAAAAAAAAAAAAAAAAAAAAD".as_bytes()).unwrap();
        assert_eq!(sn, ("".as_bytes(), 3));
    }
}
