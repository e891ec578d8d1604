use argh::FromArgs;
use evlogger::{CliArgs, Device};

fn args(a: &[&str]) -> CliArgs {
    CliArgs::from_args(&["evlogger"], a).unwrap()
}

#[test]
fn port_or_emulator() {
    assert_eq!(args(&["/dev/ttyACM0"]).device().unwrap(), Device::Serial("/dev/ttyACM0".into()));
    assert_eq!(args(&["--emulate"]).device().unwrap(), Device::Emulated);
    assert!(args(&["-e", "/dev/ttyACM0"]).device().is_err());
    assert!(args(&[]).device().is_err());
}

#[test]
fn defaults() {
    let a = args(&["-e"]);
    assert_eq!(a.baud, 115200);
    assert_eq!(a.timeout_ms, 100);
    assert_eq!(a.tick_ms, 1);
    assert_eq!(a.sync_port, None);
    assert_eq!(a.out, None);
}
