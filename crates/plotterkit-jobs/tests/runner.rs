use plotterkit_communication::{SerialError, SerialLink, SerialResult, SerialSession, SerialTransport};
use plotterkit_jobs::{
    CompletionNotice, JobError, JobResult, JobRunner, JobStore, LinkFactory, MemoryJobStore,
    Notifier, RunOutcome,
};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const PROGRAM: &str = "; Plot of cat.png\nG21\nG90\n\nG0 Z5.00\nG0 X30.000 Y30.000\nG1 Z0.00 F1000\nG1 X40.000 Y30.000 Z0.00\nG0 Z5.00\n";
const COMMANDS: usize = 7;

/// Controller that acknowledges a fixed number of lines, then hangs up
struct FlakyController {
    acks_left: Option<usize>,
    written: Arc<Mutex<Vec<String>>>,
}

impl SerialTransport for FlakyController {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.written
            .lock()
            .unwrap()
            .push(String::from_utf8_lossy(data).trim_end().to_string());
        Ok(())
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        match &mut self.acks_left {
            Some(0) => Ok(None),
            Some(n) => {
                *n -= 1;
                Ok(Some("ok".to_string()))
            }
            None => Ok(Some("ok".to_string())),
        }
    }

    fn clear_input(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Clone, Default)]
struct MockLinks {
    /// `None` acknowledges everything
    acks_before_hangup: Option<usize>,
    refuse_connection: bool,
    written: Arc<Mutex<Vec<String>>>,
}

impl MockLinks {
    fn commands_written(&self) -> Vec<String> {
        self.written
            .lock()
            .unwrap()
            .iter()
            .filter(|w| !w.is_empty())
            .cloned()
            .collect()
    }
}

impl LinkFactory for MockLinks {
    fn open_session(&self) -> SerialResult<SerialSession> {
        if self.refuse_connection {
            return Err(SerialError::ConnectionFailed {
                port: "/dev/mock".to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such device"),
            });
        }
        SerialLink::new("/dev/mock", 115200)
            .with_settle(Duration::ZERO)
            .open_with(FlakyController {
                acks_left: self.acks_before_hangup,
                written: self.written.clone(),
            })
    }
}

#[derive(Clone, Default)]
struct RecordingNotifier {
    notices: Arc<Mutex<Vec<CompletionNotice>>>,
    fail: bool,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: &CompletionNotice) -> JobResult<()> {
        self.notices.lock().unwrap().push(notice.clone());
        if self.fail {
            return Err(JobError::Notification("smtp unavailable".to_string()));
        }
        Ok(())
    }
}

fn store_with_job() -> MemoryJobStore {
    let mut store = MemoryJobStore::new();
    store.add_program("cat.gcode", PROGRAM, Some("<svg/>"), Some("ada@example.com"));
    store
}

#[test]
fn test_idle_when_nothing_pending() {
    let mut runner = JobRunner::new(
        MemoryJobStore::new(),
        MockLinks::default(),
        Box::new(RecordingNotifier::default()),
    );
    assert_eq!(runner.run_once().unwrap(), RunOutcome::Idle);
}

#[test]
fn test_success_archives_notifies_and_cleans_up() {
    let links = MockLinks::default();
    let notifier = RecordingNotifier::default();
    let mut runner = JobRunner::new(store_with_job(), links.clone(), Box::new(notifier.clone()));

    let summary = match runner.run_once().unwrap() {
        RunOutcome::Completed(summary) => summary,
        other => panic!("expected completion, got {:?}", other),
    };

    assert_eq!(summary.report.sent, COMMANDS);
    assert!(summary.notified);
    assert_eq!(links.commands_written().len(), COMMANDS);

    let notices = notifier.notices.lock().unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].recipient, "ada@example.com");
    assert_eq!(notices[0].program_name, "cat.gcode");
    assert!(notices[0].svg_attachment.is_some());

    let store = runner.into_store();
    assert!(store.pending.is_empty());
    assert_eq!(store.sent["cat.gcode"], PROGRAM);
    assert!(store.svgs.is_empty());
    assert!(store.metadata.is_empty());
}

#[test]
fn test_failed_stream_leaves_job_pending_and_retries() {
    let flaky = MockLinks {
        acks_before_hangup: Some(3),
        ..MockLinks::default()
    };
    let notifier = RecordingNotifier::default();
    let mut runner = JobRunner::new(store_with_job(), flaky, Box::new(notifier.clone()));

    let err = runner.run_once().unwrap_err();
    assert!(err.is_retryable());
    assert!(notifier.notices.lock().unwrap().is_empty());

    let store = runner.into_store();
    assert_eq!(store.pending["cat.gcode"], PROGRAM);
    assert!(store.sent.is_empty());
    assert!(store.svgs.contains_key("cat"));
    assert!(store.metadata.contains_key("cat"));

    // Same job is picked again and restarts from the first line
    let healthy = MockLinks::default();
    let mut runner = JobRunner::new(store, healthy.clone(), Box::new(notifier.clone()));
    assert_eq!(runner.next_job().unwrap().unwrap().name, "cat.gcode");
    assert!(matches!(runner.run_once().unwrap(), RunOutcome::Completed(_)));
    assert_eq!(healthy.commands_written()[0], "G21");
    assert_eq!(healthy.commands_written().len(), COMMANDS);
}

#[test]
fn test_refused_connection_changes_nothing() {
    let links = MockLinks {
        refuse_connection: true,
        ..MockLinks::default()
    };
    let mut runner = JobRunner::new(
        store_with_job(),
        links,
        Box::new(RecordingNotifier::default()),
    );

    let err = runner.run_once().unwrap_err();
    assert!(matches!(
        err,
        JobError::Serial(SerialError::ConnectionFailed { .. })
    ));
    assert_eq!(runner.store().pending.len(), 1);
}

#[test]
fn test_notification_failure_still_completes() {
    let notifier = RecordingNotifier {
        fail: true,
        ..RecordingNotifier::default()
    };
    let mut runner = JobRunner::new(store_with_job(), MockLinks::default(), Box::new(notifier.clone()));

    match runner.run_once().unwrap() {
        RunOutcome::Completed(summary) => assert!(!summary.notified),
        other => panic!("expected completion, got {:?}", other),
    }
    assert_eq!(notifier.notices.lock().unwrap().len(), 1);
    let store = runner.into_store();
    assert!(store.pending.is_empty());
    assert!(store.svgs.is_empty());
}

#[test]
fn test_jobs_run_in_name_order() {
    let mut store = MemoryJobStore::new();
    store.add_program("b.gcode", "G0 X2\n", None, None);
    store.add_program("a.gcode", "G0 X1\n", None, None);
    store.add_program("c.gcode", "G0 X3\n", None, None);
    let links = MockLinks::default();
    let mut runner = JobRunner::new(store, links.clone(), Box::new(RecordingNotifier::default()));

    let done = runner.run_all().unwrap();

    let names: Vec<&str> = done.iter().map(|s| s.job.name.as_str()).collect();
    assert_eq!(names, vec!["a.gcode", "b.gcode", "c.gcode"]);
    assert_eq!(links.commands_written(), vec!["G0 X1", "G0 X2", "G0 X3"]);
    assert!(done.iter().all(|s| !s.notified));
    assert!(runner.store().pending_programs().unwrap().is_empty());
}
