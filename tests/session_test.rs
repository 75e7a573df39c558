use hestia::outcome::{AlreadyInState, Rejection, SessionEvent};
use hestia::{ChargeEstimate, ChargerSpec, ChargerState, ChargingSession, SessionOutcome};

fn charger() -> ChargingSession {
    ChargingSession::new(ChargerSpec {
        battery_capacity_kwh: 27.0,
        battery_charge_kwh: 10.0,
        max_power_output_kw: 60.0,
        power_consumption_kw: 50.0,
        total_power_consumption_kwh: 0.0,
        supply_limit_kw: Some(22.0),
    })
    .unwrap()
}

#[test]
fn full_charging_cycle() {
    let mut c = charger();
    assert_eq!(c.state(), ChargerState::Disconnected);

    assert_eq!(c.connect(), SessionOutcome::Applied(SessionEvent::Connected));
    assert_eq!(c.state(), ChargerState::Idle);

    assert!(c.start_charging(10.0).is_applied());
    assert_eq!(c.state(), ChargerState::Charging);
    let minutes = c.estimate_remaining_charge_minutes().minutes().unwrap();
    assert!((minutes - 102.0).abs() < 1e-9);
    c.update_battery_charge(27.0).unwrap();
    assert_eq!(
        c.estimate_remaining_charge_minutes(),
        ChargeEstimate::FullyCharged
    );

    let stopped = c.stop_charging(90.0);
    assert_eq!(
        stopped.message(),
        "Charging stopped. Total power consumed: 15.00 kWh."
    );
    assert_eq!(c.state(), ChargerState::Idle);

    assert!(c.disconnect().is_applied());
    assert_eq!(c.state(), ChargerState::Disconnected);

    // Reusable after a full cycle
    assert!(c.connect().is_applied());
    assert!(c.start_charging(22.0).is_applied());
}

#[test]
fn repeated_transitions_report_unchanged() {
    let mut c = charger();
    assert_eq!(
        c.disconnect(),
        SessionOutcome::Unchanged(AlreadyInState::AlreadyDisconnected)
    );
    c.connect();
    assert_eq!(
        c.connect(),
        SessionOutcome::Unchanged(AlreadyInState::AlreadyConnected)
    );
    assert_eq!(
        c.stop_charging(10.0),
        SessionOutcome::Unchanged(AlreadyInState::NoActiveSession)
    );
}

#[test]
fn rejected_start_leaves_record_untouched() {
    let mut c = charger();
    c.connect();
    let before = c.clone();

    let outcome = c.start_charging(61.0);
    assert!(matches!(
        outcome,
        SessionOutcome::Rejected(Rejection::ExceedsMaxOutput { .. })
    ));
    assert_eq!(c, before);
}

#[test]
fn energy_is_credited_exactly_once() {
    let mut c = charger();
    c.connect();
    c.start_charging(7.4);
    c.stop_charging(45.0);
    c.stop_charging(45.0);
    assert!((c.total_power_consumption_kwh() - 7.4 * 0.75).abs() < 1e-9);
    assert_eq!(c.history().len(), 1);
}

#[test]
fn reset_always_zeroes_total() {
    let mut c = charger();
    c.reset_power_consumption();
    assert!(c.total_power_consumption_kwh().abs() < f64::EPSILON);

    c.connect();
    c.start_charging(11.0);
    c.stop_charging(120.0);
    assert!(c.reset_power_consumption().is_applied());
    assert!(c.total_power_consumption_kwh().abs() < f64::EPSILON);
}

#[test]
fn session_serializes_with_flags() {
    let mut c = charger();
    c.connect();
    let value = serde_json::to_value(&c).unwrap();
    assert_eq!(value["is_connected_to_car"], true);
    assert_eq!(value["is_charging"], false);

    let restored: ChargingSession = serde_json::from_value(value).unwrap();
    assert_eq!(restored, c);
}
