//! Wire-format properties of the share-token codec.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use iskhour_core::{PerformanceRecord, TokenError, decode, encode};

fn record(
    isk: u64,
    lp: u64,
    sites: u32,
    start_time: u64,
    end_time: u64,
    min_time: u64,
    max_time: u64,
    chars: u32,
) -> PerformanceRecord {
    PerformanceRecord {
        isk,
        lp,
        sites,
        start_time,
        end_time,
        min_time,
        max_time,
        chars,
    }
}

#[test]
fn roundtrip_law_holds_across_magnitudes() {
    let samples = [
        record(0, 0, 2, 0, 0, 0, 0, 1),
        record(1_000_000, 500, 3, 1_000_000_000, 1_000_010_800, 3_000, 6_000, 1),
        record(63_000_000, 14_000, 2, 1_704_103_200, 1_704_103_500, 300, 300, 2),
        record(
            u64::MAX,
            u64::MAX,
            u32::MAX,
            u64::MAX - 1,
            u64::MAX,
            u64::MAX,
            u64::MAX,
            u32::MAX,
        ),
        record(127, 128, 16_383, 16_384, 16_384, 0, 1, 1),
    ];
    for sample in samples {
        let token = encode(&sample).expect("encodable record");
        assert_eq!(decode(&token).expect("decodable token"), sample);
    }
}

#[test]
fn reference_record_roundtrips_exactly() {
    let sample = record(1_000_000, 500, 3, 1_000_000_000, 1_000_010_800, 3_000, 6_000, 1);
    let token = encode(&sample).unwrap();
    assert_eq!(decode(&token).unwrap(), sample);
}

#[test]
fn tokens_use_the_url_safe_alphabet() {
    let sample = record(
        987_654_321_012,
        345_678,
        250,
        1_700_000_000,
        1_700_086_399,
        17,
        9_999,
        11,
    );
    let token = encode(&sample).unwrap();
    assert!(token.starts_with('1'));
    assert!(
        token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    );
}

#[test]
fn every_payload_bit_flip_is_detected() {
    let sample = record(1_000_000, 500, 3, 1_000_000_000, 1_000_010_800, 3_000, 6_000, 1);
    let token = encode(&sample).unwrap();
    let bytes = URL_SAFE_NO_PAD.decode(&token[1..]).unwrap();

    // Flip each bit of the pre-checksum payload; the XOR fold catches
    // every single-bit corruption.
    for byte_index in 0..bytes.len() - 1 {
        for bit in 0..8 {
            let mut corrupted = bytes.clone();
            corrupted[byte_index] ^= 1 << bit;
            let forged = format!("1{}", URL_SAFE_NO_PAD.encode(&corrupted));
            assert_eq!(
                decode(&forged),
                Err(TokenError::Checksum),
                "flip of byte {byte_index} bit {bit} went undetected"
            );
        }
    }
}

#[test]
fn unknown_versions_fail_for_any_payload() {
    let sample = record(1_000_000, 500, 3, 1_000_000_000, 1_000_010_800, 3_000, 6_000, 1);
    let token = encode(&sample).unwrap();
    for version in ['0', '2', '9', 'A', 'z', '-'] {
        let forged = format!("{version}{}", &token[1..]);
        assert_eq!(decode(&forged), Err(TokenError::UnknownVersion(version)));
    }
}

#[test]
fn padded_or_standard_base64_is_rejected() {
    // The format is strictly unpadded base64url.
    assert!(decode("1AAA=").is_err());
    assert!(decode("1a+b/").is_err());
}
