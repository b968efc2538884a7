use super::*;
use proptest::prelude::*;

#[test]
fn frames_to_seconds_divides_by_fps() {
    assert_eq!(Unit::from_frames(45).to_seconds(30), 1.5);
    assert_eq!(Unit::from_frames(1).to_seconds(25), 1.0 / 25.0);
}

#[test]
fn seconds_to_frames_truncates_toward_zero() {
    assert_eq!(Unit::from_seconds(1.99).to_frames(10), 19);
    assert_eq!(Unit::from_seconds(-0.15).to_frames(10), -1);
    assert_eq!(Unit::from_seconds(-0.05).to_frames(10), 0);
}

#[test]
fn timerange_selection_is_inclusive_on_both_ends() {
    let r = Timerange::frames(10, 5);
    assert!(!r.contains_frame(30, 9));
    assert!(r.contains_frame(30, 10));
    assert!(r.contains_frame(30, 15));
    assert!(!r.contains_frame(30, 16));
}

#[test]
fn negative_duration_selects_nothing() {
    let r = Timerange::frames(10, -1);
    assert!((0..30).all(|f| !r.contains_frame(30, f)));
}

#[test]
fn unit_serde_is_externally_tagged() {
    let json = serde_json::to_string(&Unit::from_frames(12)).unwrap();
    assert_eq!(json, r#"{"frames":12}"#);
    let back: Unit = serde_json::from_str(r#"{"seconds":2.5}"#).unwrap();
    assert_eq!(back, Unit::from_seconds(2.5));
}

#[test]
fn straight_to_premul_rounds() {
    let c = Rgba8Premul::from_straight_rgba(255, 0, 0, 128);
    assert_eq!(c.to_array(), [128, 0, 0, 128]);
}

proptest! {
    #[test]
    fn frames_roundtrip_through_frames(n in 0i64..10_000_000, fps in 1u32..240) {
        prop_assert_eq!(Unit::from_frames(n).to_frames(fps), n);
    }

    #[test]
    fn seconds_roundtrip_through_seconds(s in -1.0e6f64..1.0e6, fps in 1u32..240) {
        prop_assert_eq!(Unit::from_seconds(s).to_seconds(fps), s);
    }

    #[test]
    fn cross_unit_conversions(s in 0.0f64..10_000.0, n in 0i64..1_000_000, fps in 1u32..240) {
        prop_assert_eq!(
            Unit::from_seconds(s).to_frames(fps),
            (s * f64::from(fps)).trunc() as i64
        );
        prop_assert_eq!(Unit::from_frames(n).to_seconds(fps), n as f64 / f64::from(fps));
    }
}
