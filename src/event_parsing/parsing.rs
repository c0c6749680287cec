use base64::{encode_config, URL_SAFE};

use crate::error::Error;

pub fn from_text_to_bytes(text: &[u8]) -> Result<Vec<u8>, Error> {
    let lead_size = (4 - (text.len() % 4)) % 4;
    let full_derivative = ["A".repeat(lead_size).as_bytes(), text].concat();

    Ok(base64::decode_config(full_derivative, URL_SAFE)?)
}

pub fn from_bytes_to_text(bytes: &[u8]) -> String {
    let lead_size = (3 - (bytes.len() % 3)) % 3;
    let full_derivative: Vec<_> = std::iter::repeat(0)
        .take(lead_size)
        .chain(bytes.to_vec().into_iter())
        .collect();

    encode_config(full_derivative, base64::URL_SAFE)
}

/// Decode Base64-URL characters as a big-endian number.
pub fn b64_to_num(b64: &[u8]) -> Result<u16, Error> {
    let bytes = from_text_to_bytes(b64)?;
    let len = bytes.len();
    if len < 2 {
        return Err(Error::ParseIntError);
    }
    Ok(u16::from_be_bytes([bytes[len - 2], bytes[len - 1]]))
}

/// Encode a number as `length` Base64-URL characters.
pub fn num_to_b64(num: u16, length: usize) -> String {
    const B64: &[u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
    let mut chars = vec![b'A'; length];
    let mut left = num as usize;
    for i in (0..length).rev() {
        chars[i] = B64[left % 64];
        left /= 64;
        if left == 0 {
            break;
        }
    }
    String::from_utf8(chars).unwrap_or_default()
}

#[test]
fn test_from_text_to_bytes() {
    assert_eq!(
        hex::encode(from_text_to_bytes("MP__".as_bytes()).unwrap()),
        "30ffff"
    );
    assert_eq!(
        hex::encode(from_text_to_bytes("MAAA".as_bytes()).unwrap()),
        "300000"
    );
    assert_eq!(
        hex::encode(from_text_to_bytes("MAAB".as_bytes()).unwrap()),
        "300001"
    );
}

#[test]
fn test_from_bytes_to_text() {
    let b_bytes = from_text_to_bytes("B".as_bytes()).unwrap();
    assert_eq!("AAAB", from_bytes_to_text(&b_bytes));

    assert_eq!(
        from_bytes_to_text(&hex::decode("300000").unwrap()),
        "MAAA".to_string()
    );
    assert_eq!(
        from_bytes_to_text(&hex::decode("30ffff").unwrap()),
        "MP__".to_string()
    );
}

#[test]
fn test_b64_num_roundtrip() {
    assert_eq!(b64_to_num("AA".as_bytes()).unwrap(), 0);
    assert_eq!(b64_to_num("AB".as_bytes()).unwrap(), 1);
    assert_eq!(b64_to_num("BA".as_bytes()).unwrap(), 64);

    assert_eq!(num_to_b64(0, 2), "AA");
    assert_eq!(num_to_b64(1, 2), "AB");
    assert_eq!(num_to_b64(64, 2), "BA");
    assert_eq!(num_to_b64(3, 1), "D");
}
