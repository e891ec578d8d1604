use chrono::{Local, TimeZone};
use evlogger::save::{SaveHandle, SaveMessage, Sinks};
use evtools::db::EventDb;
use evtools::latency::{Latency, LatencyMode};
use evtools::{EventKind, Record, Timestamp, Value};
use std::fs;
use std::path::PathBuf;

/// Unique base name in the temp dir; removes the files it may have produced
struct TempBase(PathBuf);

impl TempBase {
    fn new(name: &str) -> Self {
        let base = std::env::temp_dir().join(format!("evlogger_{}_{}", std::process::id(), name));
        let t = TempBase(base);
        t.clean();
        t
    }

    fn file(&self, suffix: &str) -> PathBuf {
        let mut name = self.0.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    }

    fn clean(&self) {
        for s in ["_event.csv", "_adc.csv", "_c2p.csv", ".db"] {
            let _ = fs::remove_file(self.file(s));
        }
    }
}

impl Drop for TempBase {
    fn drop(&mut self) {
        self.clean();
    }
}

fn messages() -> Vec<SaveMessage> {
    let wall = Local.with_ymd_and_hms(2023, 3, 14, 15, 9, 26).unwrap();
    vec![
        SaveMessage::Record(Record { time: Timestamp::Wall(wall), value: Value::Sync }),
        SaveMessage::Record(Record { time: Timestamp::Hardware(1.0), value: Value::Event(EventKind::SW) }),
        SaveMessage::Record(Record { time: Timestamp::Hardware(2.0), value: Value::Event(EventKind::M1) }),
        SaveMessage::Record(Record { time: Timestamp::Hardware(2.5), value: Value::Analog(512) }),
        SaveMessage::Latency(Latency { time: Timestamp::Hardware(2.0), latency_ms: 12.3456 }),
    ]
}

#[test]
fn messages_are_routed_to_their_logs() {
    let base = TempBase::new("routing");
    let sinks = Sinks::new()
        .with_events(&base.0).unwrap()
        .with_adc(&base.0).unwrap()
        .with_latencies(&base.0).unwrap();
    let save = SaveHandle::new(sinks);
    for m in messages() {
        save.save(m).unwrap();
    }
    save.finish().unwrap();

    assert_eq!(
        fs::read_to_string(base.file("_event.csv")).unwrap(),
        "Time,Event\n2023-03-14 15:09:26.000000,SW sync\n1.000000,SW\n2.000000,M1\n",
    );
    assert_eq!(
        fs::read_to_string(base.file("_adc.csv")).unwrap(),
        "Time,Event\n2023-03-14 15:09:26.000000,SW sync\n1.000000,SW\n2.500000,512\n",
    );
    assert_eq!(
        fs::read_to_string(base.file("_c2p.csv")).unwrap(),
        "Time,Latency [ms]\n2.000000,12.346\n",
    );
}

#[test]
fn database_gets_everything() {
    let base = TempBase::new("database");
    let save = SaveHandle::new(Sinks::new().with_database(&base.file(".db"), LatencyMode::Total).unwrap());
    for m in messages() {
        save.save(m).unwrap();
    }
    save.finish().unwrap();

    let db = EventDb::open(base.file(".db")).unwrap();
    assert_eq!(db.events().unwrap().len(), 4);
    assert_eq!(db.latencies().unwrap(), vec![(2.0, 12.3456, String::from("total"))]);
}

#[test]
fn existing_logs_are_not_overwritten() {
    let base = TempBase::new("existing");
    let first = Sinks::new().with_events(&base.0).unwrap();
    let err = Sinks::new().with_events(&base.0).err().unwrap();
    assert!(format!("{:#}", err).contains("cannot create"));
    drop(first);
    assert_eq!(
        fs::read_to_string(base.file("_event.csv")).unwrap(),
        "Time,Event\n",
    );
}
