//! Fuzz-style parsing tests: arbitrary inputs must never panic and must
//! either parse cleanly or return a typed error.

use edgestamp_types::{Digest, Scalar, SensorValue};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_digest_from_hex_never_panics(s in ".*") {
        let _ = Digest::from_hex(&s);
    }

    #[test]
    fn prop_digest_from_slice_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = Digest::from_slice(&bytes);
    }

    #[test]
    fn prop_scalar_parses_any_json_scalar(json in "(true|false|0|-?[1-9][0-9]{0,8}|\"[a-z]{0,12}\")") {
        let parsed: Scalar = serde_json::from_str(&json).expect("scalar JSON must parse");
        // Round-trip must preserve the literal form
        let emitted = serde_json::to_string(&parsed).unwrap();
        prop_assert_eq!(emitted, json);
    }

    #[test]
    fn prop_sensor_value_rejects_arrays(n in 0usize..8) {
        let json = format!("[{}]", vec!["1"; n].join(","));
        let parsed: Result<SensorValue, _> = serde_json::from_str(&json);
        prop_assert!(parsed.is_err());
    }

    #[test]
    fn prop_sensor_value_from_arbitrary_json_never_panics(s in ".{0,64}") {
        let _: Result<SensorValue, _> = serde_json::from_str(&s);
    }
}
