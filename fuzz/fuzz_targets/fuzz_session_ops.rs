#![no_main]
use hestia::{ChargerSpec, ChargingSession};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(mut session) = ChargingSession::new(ChargerSpec {
        supply_limit_kw: Some(22.0),
        ..ChargerSpec::new(60.0, 12.0, 50.0)
    }) else {
        return;
    };

    // Each input byte pair is (operation, argument)
    for op in data.chunks_exact(2) {
        let arg = f64::from(op[1]) / 4.0;
        let total_before = session.total_power_consumption_kwh();
        let message = match op[0] % 6 {
            0 => session.connect().message(),
            1 => session.disconnect().message(),
            2 => session.start_charging(arg).message(),
            3 => session.stop_charging(arg).message(),
            4 => session.reset_power_consumption().message(),
            _ => session.estimate_remaining_charge_minutes().message(),
        };
        assert!(!message.is_empty());

        assert!(session.validate().is_ok());
        assert!(!session.is_charging() || session.is_connected_to_car());
        assert!(session.power_consumption_kw() <= session.effective_limit_kw());
        if op[0] % 6 != 4 {
            assert!(session.total_power_consumption_kwh() >= total_before);
        }
    }
});
