use evtools::db::EventDb;
use evtools::latency::{Latency, LatencyMode};
use evtools::{EventKind, Record, Timestamp, Value};

#[test]
fn reinsertion_is_idempotent() {
    let db = EventDb::in_memory().unwrap();
    let r = Record { time: Timestamp::Hardware(1.25), value: Value::Event(EventKind::M1) };
    assert!(db.insert_record(&r).unwrap());
    assert!(!db.insert_record(&r).unwrap());
    assert_eq!(db.events().unwrap(), vec![(1.25, String::from("M1"))]);
}

#[test]
fn same_time_different_event() {
    let mut db = EventDb::in_memory().unwrap();
    let records = vec![
        Record { time: Timestamp::Hardware(2.0), value: Value::Event(EventKind::M1) },
        Record { time: Timestamp::Hardware(2.0), value: Value::Event(EventKind::PD) },
        Record { time: Timestamp::Hardware(3.0), value: Value::Analog(17) },
    ];
    assert_eq!(db.insert_records(&records).unwrap(), 3);
    assert_eq!(db.insert_records(&records).unwrap(), 0);
    assert_eq!(
        db.events().unwrap(),
        vec![
            (2.0, String::from("M1")),
            (2.0, String::from("PD")),
            (3.0, String::from("17")),
        ],
    );
}

#[test]
fn latencies_table() {
    let mut db = EventDb::in_memory().unwrap();
    let l = vec![
        Latency { time: Timestamp::Hardware(1.0), latency_ms: 42.5 },
        Latency { time: Timestamp::Hardware(2.0), latency_ms: 40.0 },
    ];
    assert_eq!(db.insert_latencies(&l, LatencyMode::Minimum).unwrap(), 2);
    assert!(!db.insert_latency(&l[0], LatencyMode::Minimum).unwrap());
    assert_eq!(
        db.latencies().unwrap(),
        vec![
            (1.0, 42.5, String::from("minimum")),
            (2.0, 40.0, String::from("minimum")),
        ],
    );
}

#[test]
fn latency_mode_is_stored() {
    let db = EventDb::in_memory().unwrap();
    let l = Latency { time: Timestamp::Hardware(3.0), latency_ms: 61.25 };
    assert!(db.insert_latency(&l, LatencyMode::System).unwrap());
    let l = Latency { time: Timestamp::Hardware(4.0), latency_ms: 80.0 };
    assert!(db.insert_latency(&l, LatencyMode::Total).unwrap());
    assert_eq!(
        db.latencies().unwrap(),
        vec![
            (3.0, 61.25, String::from("system")),
            (4.0, 80.0, String::from("total")),
        ],
    );
}

#[test]
fn latency_mode_names() {
    for mode in [LatencyMode::Minimum, LatencyMode::Total, LatencyMode::System] {
        assert_eq!(mode.to_string().parse::<LatencyMode>().unwrap(), mode);
    }
    assert_eq!(LatencyMode::default(), LatencyMode::Minimum);
    assert!("average".parse::<LatencyMode>().is_err());
}
