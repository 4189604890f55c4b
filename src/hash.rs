//! Legacy credential digest.
//!
//! Every stored credential (user passwords and the admin secret) is a
//! 32-character digest produced by a fixed obfuscation pipeline on top of
//! SHA-256. The pipeline is load-bearing: digests in existing databases
//! were produced by exactly these steps, so every transform and its order
//! must stay bit-for-bit stable. Operations are defined on Unicode
//! codepoints, not bytes.

use base64::{Engine, engine::general_purpose::STANDARD};
use sha2::{Digest, Sha256};

/// Length of every digest produced by [`digest`].
pub const DIGEST_LEN: usize = 32;

/// Computes the credential digest of `plaintext`.
///
/// Deterministic and unsalted by external input; equal plaintexts always
/// produce equal digests.
pub fn digest(plaintext: &str) -> String {
    // Salt with the codepoint-reversed plaintext and the codepoint count.
    let reversed: String = plaintext.chars().rev().collect();
    let salted = format!("{}{}{}", plaintext, reversed, plaintext.chars().count());

    // Reverse again and shift every codepoint by 12 modulo 256.
    let shifted: String = salted.chars().rev().map(shift_codepoint).collect();

    let hex = hex::encode(Sha256::digest(shifted.as_bytes()));

    // Base64 of the first 16 hex characters (as ASCII bytes), unpadded,
    // then Caesar-shifted. hex is ASCII so byte slicing is safe.
    let b64 = STANDARD.encode(&hex.as_bytes()[..16]);
    let b64 = b64.trim_end_matches('=');
    let caesared: String = b64.chars().map(caesar12).collect();

    let mut out = String::with_capacity(DIGEST_LEN + caesared.len());
    out.push_str(&hex[16..]);
    out.push_str(&caesared);
    out.truncate(DIGEST_LEN);
    out
}

/// `(codepoint + 12) % 256`, so the result is always one byte and the
/// shifted string's UTF-8 form is well defined.
fn shift_codepoint(c: char) -> char {
    char::from(((u32::from(c) + 12) % 256) as u8)
}

/// Caesar shift by 12 over ASCII letters, case preserved; everything else
/// passes through.
fn caesar12(c: char) -> char {
    match c {
        'a'..='z' => char::from((u32::from(c) as u8 - b'a' + 12) % 26 + b'a'),
        'A'..='Z' => char::from((u32::from(c) as u8 - b'A' + 12) % 26 + b'A'),
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference digests produced by the pre-existing implementation.
    // These pin the algorithm; a change to any pipeline step breaks them.
    #[test]
    fn test_known_digests() {
        assert_eq!(digest(""), "2965401eb029974ebba3407afd02b26d");
        assert_eq!(digest("password"), "acff18e919a6915032965d0dd23c7fad");
        assert_eq!(digest("hunter2"), "6d7b3b581543b9a713d24c8859582a50");
        assert_eq!(
            digest("correct horse battery staple"),
            "eafc83d2c102d5261e6592bf49c43059"
        );
        assert_eq!(digest("test-admin"), "2f00a9097f46b4a852421f185475a862");
    }

    #[test]
    fn test_multibyte_input() {
        // Codepoints above 255 wrap through the modulo shift.
        assert_eq!(digest("pässwörd✓"), "87b5b48a04b1ee63f79efbee1bd93c92");
    }

    #[test]
    fn test_deterministic_and_fixed_length() {
        for input in ["", "a", "password", "pässwörd✓", "a much longer input"] {
            let d = digest(input);
            assert_eq!(d, digest(input));
            assert_eq!(d.len(), DIGEST_LEN);
            assert!(d.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_small_changes_diverge() {
        assert_eq!(digest("a"), "12b9774fd7de4443537550a38683479a");
        assert_eq!(digest("b"), "83d2fd944083a0131cd474169b76db56");
        assert_ne!(digest("password"), digest("Password"));
    }

    #[test]
    fn test_caesar_shift() {
        assert_eq!(caesar12('a'), 'm');
        assert_eq!(caesar12('z'), 'l');
        assert_eq!(caesar12('A'), 'M');
        assert_eq!(caesar12('Z'), 'L');
        assert_eq!(caesar12('5'), '5');
        assert_eq!(caesar12('+'), '+');
    }
}
