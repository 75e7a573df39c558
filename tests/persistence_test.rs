use hestia::config::ChargerConfig;
use hestia::{
    ChargerCommand, ChargerId, ChargerService, ChargerSpec, HestiaError, JsonFileRepository,
    SessionRepository,
};

#[test]
fn service_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("sessions.json");
    let id = ChargerId::new("garage");

    {
        let repo = JsonFileRepository::open(&path).unwrap();
        let mut svc = ChargerService::new(repo, ChargerConfig::default());
        svc.register_with_id(&id, ChargerSpec::new(27.0, 10.0, 60.0))
            .unwrap();
        svc.execute(&id, ChargerCommand::Connect).unwrap();
        svc.execute(&id, ChargerCommand::StartCharging { rate_kw: 10.0 })
            .unwrap();
        let reply = svc
            .execute(
                &id,
                ChargerCommand::StopCharging {
                    elapsed_minutes: 60.0,
                },
            )
            .unwrap();
        assert_eq!(
            reply.message,
            "Charging stopped. Total power consumed: 10.00 kWh."
        );
    }

    let repo = JsonFileRepository::open(&path).unwrap();
    assert_eq!(repo.ids().unwrap(), vec![id.clone()]);
    let session = repo.get(&id).unwrap().unwrap();
    assert!(session.is_connected_to_car());
    assert!(!session.is_charging());
    assert!((session.total_power_consumption_kwh() - 10.0).abs() < 1e-9);
    assert_eq!(session.history().len(), 1);
}

#[test]
fn remove_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.json");

    let mut svc = ChargerService::new(
        JsonFileRepository::open(&path).unwrap(),
        ChargerConfig::default(),
    );
    let id = svc.register(ChargerSpec::new(40.0, 5.0, 11.0)).unwrap();
    svc.remove(&id).unwrap();

    let repo = JsonFileRepository::open(&path).unwrap();
    assert!(repo.get(&id).unwrap().is_none());
}

#[test]
fn open_rejects_records_breaking_invariants() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.json");
    std::fs::write(
        &path,
        r#"{
  "chargers": {
    "garage": {
      "battery_capacity_kwh": 27.0,
      "battery_charge_kwh": 100.0,
      "max_power_output_kw": 60.0,
      "power_consumption_kw": 0.0,
      "total_power_consumption_kwh": 0.0,
      "is_connected_to_car": false,
      "is_charging": false
    }
  }
}"#,
    )
    .unwrap();

    let err = JsonFileRepository::open(&path).err().unwrap();
    assert!(matches!(err, HestiaError::Storage { .. }));
}

#[test]
fn open_rejects_malformed_json() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(tmp.path(), "{ not json").unwrap();
    let err = JsonFileRepository::open(tmp.path()).err().unwrap();
    assert!(matches!(err, HestiaError::Serialization { .. }));
}

#[test]
fn overflowing_stop_leaves_store_readable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.json");
    let id = ChargerId::new("garage");

    {
        let mut svc = ChargerService::new(
            JsonFileRepository::open(&path).unwrap(),
            ChargerConfig::default(),
        );
        svc.register_with_id(
            &id,
            ChargerSpec {
                supply_limit_kw: Some(f64::MAX),
                ..ChargerSpec::new(27.0, 10.0, 1e308)
            },
        )
        .unwrap();
        svc.execute(&id, ChargerCommand::Connect).unwrap();
        svc.execute(&id, ChargerCommand::StartCharging { rate_kw: 1e308 })
            .unwrap();
        let reply = svc
            .execute(
                &id,
                ChargerCommand::StopCharging {
                    elapsed_minutes: 1e6,
                },
            )
            .unwrap();
        assert!(!reply.result.changed_state());
    }

    let repo = JsonFileRepository::open(&path).unwrap();
    let session = repo.get(&id).unwrap().unwrap();
    assert!(session.is_charging());
    assert!(session.total_power_consumption_kwh().is_finite());
}
