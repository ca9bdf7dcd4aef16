// SPDX-License-Identifier: MIT OR Apache-2.0
//! Plausible-instance generators for the `format` keyword.

use crate::rng::CaseRng;

const HEX: &[u8] = b"0123456789abcdef";
const ALPHA: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const BASE64_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Produce a value for a known `format` keyword, or `None` if `format` isn't
/// one this generator recognizes (the caller falls back to a plain string).
pub fn generate(format: &str, rng: &mut CaseRng) -> Option<String> {
    match format {
        "uuid" => Some(uuid(rng)),
        "email" => Some(email(rng)),
        "uri" | "uri-reference" => Some(uri(rng)),
        "date-time" => Some(date_time(rng)),
        "date" => Some(date(rng)),
        "ipv4" => Some(ipv4(rng)),
        "ipv6" => Some(ipv6(rng)),
        "hostname" => Some(hostname(rng)),
        "base64" => Some(base64(rng, 16)),
        "semver" => Some(semver(rng)),
        _ => None,
    }
}

fn hex_chars(rng: &mut CaseRng, n: usize) -> String {
    (0..n).map(|_| HEX[(rng.byte() as usize) % HEX.len()] as char).collect()
}

fn word(rng: &mut CaseRng, len: usize) -> String {
    (0..len).map(|_| ALPHA[(rng.byte() as usize) % ALPHA.len()] as char).collect()
}

fn uuid(rng: &mut CaseRng) -> String {
    format!(
        "{}-{}-4{}-{}{}-{}",
        hex_chars(rng, 8),
        hex_chars(rng, 4),
        hex_chars(rng, 3),
        HEX[8 + (rng.byte() as usize) % 4] as char,
        hex_chars(rng, 3),
        hex_chars(rng, 12)
    )
}

fn email(rng: &mut CaseRng) -> String {
    format!("{}@{}", word(rng, 6 + rng.index(4)), hostname(rng))
}

fn uri(rng: &mut CaseRng) -> String {
    format!("https://{}/{}", hostname(rng), word(rng, 4 + rng.index(6)))
}

fn date_time(rng: &mut CaseRng) -> String {
    let year = 2000 + rng.index(30);
    let month = 1 + rng.index(12);
    let day = 1 + rng.index(28);
    let hour = rng.index(24);
    let minute = rng.index(60);
    let second = rng.index(60);
    format!("{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}Z")
}

fn date(rng: &mut CaseRng) -> String {
    date_time(rng)[..10].to_string()
}

fn ipv4(rng: &mut CaseRng) -> String {
    format!(
        "{}.{}.{}.{}",
        rng.index(256),
        rng.index(256),
        rng.index(256),
        rng.index(256)
    )
}

fn ipv6(rng: &mut CaseRng) -> String {
    (0..8).map(|_| hex_chars(rng, 4)).collect::<Vec<_>>().join(":")
}

fn hostname(rng: &mut CaseRng) -> String {
    format!("{}.example.test", word(rng, 4 + rng.index(6)))
}

fn base64(rng: &mut CaseRng, len: usize) -> String {
    (0..len)
        .map(|_| BASE64_ALPHABET[(rng.byte() as usize) % BASE64_ALPHABET.len()] as char)
        .collect()
}

fn semver(rng: &mut CaseRng) -> String {
    format!("{}.{}.{}", rng.index(5), rng.index(20), rng.index(20))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_has_version_4_nibble() {
        let mut rng = CaseRng::from_seed(1);
        let id = generate("uuid", &mut rng).expect("uuid");
        let parts: Vec<_> = id.split('-').collect();
        assert_eq!(parts.len(), 5);
        assert!(parts[2].starts_with('4'));
    }

    #[test]
    fn email_contains_at_and_domain() {
        let mut rng = CaseRng::from_seed(2);
        let addr = generate("email", &mut rng).expect("email");
        assert!(addr.contains('@'));
        assert!(addr.ends_with(".example.test"));
    }

    #[test]
    fn ipv4_has_four_octets() {
        let mut rng = CaseRng::from_seed(3);
        let ip = generate("ipv4", &mut rng).expect("ipv4");
        assert_eq!(ip.split('.').count(), 4);
    }

    #[test]
    fn unknown_format_returns_none() {
        let mut rng = CaseRng::from_seed(4);
        assert!(generate("not-a-real-format", &mut rng).is_none());
    }
}
