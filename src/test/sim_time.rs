use crate::sim::SimTime;

#[test]
fn sim_time_unit_conversions() {
    assert_eq!(SimTime::from_micros(1), SimTime(1_000));
    assert_eq!(SimTime::from_millis(1), SimTime(1_000_000));
    assert_eq!(SimTime::from_secs(1), SimTime(1_000_000_000));
}

#[test]
fn sim_time_unit_conversions_saturate_on_overflow() {
    assert_eq!(SimTime::from_micros(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime::from_millis(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime::from_secs(u64::MAX), SimTime(u64::MAX));
}

#[test]
fn sim_time_whole_second_rounding() {
    assert_eq!(SimTime::from_secs(39).as_secs(), 39);
    assert_eq!(SimTime(1_999_999_999).as_secs(), 1);
    assert_eq!(SimTime::ZERO.as_secs(), 0);
}

#[test]
fn sim_time_saturating_arithmetic() {
    let a = SimTime::from_secs(3);
    let b = SimTime::from_secs(5);
    assert_eq!(b.saturating_sub(a), SimTime::from_secs(2));
    assert_eq!(a.saturating_sub(b), SimTime::ZERO);
    assert_eq!(SimTime(u64::MAX).saturating_add(a), SimTime(u64::MAX));
}
