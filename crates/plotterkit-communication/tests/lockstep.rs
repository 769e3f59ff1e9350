use plotterkit_communication::{Ack, SerialError, SerialLink, SerialTransport};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
enum Op {
    Write(String),
    Read,
    Clear,
}

/// In-memory controller that records every transport call
#[derive(Clone)]
struct MockController {
    log: Arc<Mutex<Vec<Op>>>,
    replies: Arc<Mutex<VecDeque<String>>>,
    fail_writes: bool,
}

impl MockController {
    fn new(replies: &[&str]) -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            replies: Arc::new(Mutex::new(replies.iter().map(|s| s.to_string()).collect())),
            fail_writes: false,
        }
    }

    fn ops(&self) -> Vec<Op> {
        self.log.lock().unwrap().clone()
    }

    fn writes(&self) -> Vec<String> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::Write(s) => Some(s),
                _ => None,
            })
            .collect()
    }
}

impl SerialTransport for MockController {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
        }
        self.log
            .lock()
            .unwrap()
            .push(Op::Write(String::from_utf8_lossy(data).to_string()));
        Ok(())
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        self.log.lock().unwrap().push(Op::Read);
        Ok(self.replies.lock().unwrap().pop_front())
    }

    fn clear_input(&mut self) -> io::Result<()> {
        self.log.lock().unwrap().push(Op::Clear);
        Ok(())
    }
}

fn link() -> SerialLink {
    SerialLink::new("/dev/mock", 115200).with_settle(Duration::ZERO)
}

#[test]
fn test_open_wakes_then_flushes() {
    let mock = MockController::new(&[]);
    let _session = link().open_with(mock.clone()).unwrap();

    assert_eq!(mock.ops(), vec![Op::Write("\r\n\r\n".to_string()), Op::Clear]);
}

#[test]
fn test_write_read_alternation() {
    let mock = MockController::new(&["ok", "ok", "ok"]);
    let mut session = link().open_with(mock.clone()).unwrap();

    session.stream(["G21", "G90", "G0 Z5.00"]).unwrap();

    let ops = mock.ops();
    let streamed = &ops[2..];
    assert_eq!(streamed.len(), 6);
    for pair in streamed.chunks(2) {
        assert!(matches!(pair[0], Op::Write(_)));
        assert_eq!(pair[1], Op::Read);
    }
}

#[test]
fn test_comments_and_blanks_are_not_sent() {
    let mock = MockController::new(&["ok"]);
    let mut session = link().open_with(mock.clone()).unwrap();

    let report = session
        .stream(["; header", "", "   ", "G1 X10 Y10", "  ; trailing"])
        .unwrap();

    assert_eq!(report.sent, 1);
    assert_eq!(report.skipped, 4);
    assert_eq!(mock.writes(), vec!["\r\n\r\n".to_string(), "G1 X10 Y10\n".to_string()]);
}

#[test]
fn test_lines_are_trimmed_before_sending() {
    let mock = MockController::new(&["ok"]);
    let mut session = link().open_with(mock.clone()).unwrap();

    assert_eq!(session.send_line("  G0 X1 Y2 \r").unwrap(), Ack::Ok);
    assert_eq!(mock.writes()[1], "G0 X1 Y2\n");
}

#[test]
fn test_device_hangup_is_protocol_error() {
    let mock = MockController::new(&["ok"]);
    let mut session = link().open_with(mock.clone()).unwrap();

    let err = session.stream(["G21", "G90", "G91"]).unwrap_err();

    match err {
        SerialError::Protocol { line, source } => {
            assert_eq!(line, "G90");
            assert_eq!(source.kind(), io::ErrorKind::UnexpectedEof);
        }
        other => panic!("expected protocol error, got {:?}", other),
    }
    // Nothing written after the failed line
    assert_eq!(mock.writes().len(), 3);
}

#[test]
fn test_failed_wake_is_connection_error() {
    let mut mock = MockController::new(&[]);
    mock.fail_writes = true;

    let err = link().open_with(mock).unwrap_err();
    assert!(err.is_connection_error());
}

#[test]
fn test_alarm_is_reported_not_fatal() {
    let mock = MockController::new(&["ALARM:2", "ok"]);
    let mut session = link().open_with(mock.clone()).unwrap();

    let report = session.stream(["G1 X999", "G0 Z5"]).unwrap();
    assert_eq!(report.sent, 2);
    assert_eq!(report.error_acks, 1);
}
