//! End to end over a real FIFO, with the test acting as the host.

mod common;

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tagscan::{NamedPipe, PathTable};

use common::{abc_wav, junk_file};

/// One host round trip: send `request`, then read the response until the
/// service closes its end.
fn round_trip(pipe: &Path, request: &str) -> String {
    let mut writer = OpenOptions::new().write(true).open(pipe).unwrap();
    writer.write_all(request.as_bytes()).unwrap();
    drop(writer);

    let mut response = String::new();
    File::open(pipe).unwrap().read_to_string(&mut response).unwrap();
    response
}

#[test]
fn test_batches_over_named_pipe() {
    let dir = tempfile::tempdir().unwrap();
    let pipe_path = dir.path().join("tagpipe");
    let table = PathTable::new()
        .with(3, junk_file(dir.path(), "broken.mp3"))
        .with(4, abc_wav(dir.path()));

    let pipe = NamedPipe::prepare(&pipe_path).unwrap();
    let service = thread::spawn(move || tagscan::serve(pipe, Arc::new(table)));

    let first = round_trip(&pipe_path, "3\n");
    assert_eq!(first, "FD=3\n~\n");

    let second = round_trip(&pipe_path, "4~\n");
    let lines: Vec<&str> = second.lines().collect();
    assert_eq!(lines.len(), 2, "{second}");
    assert!(lines[0].starts_with("FD=4|*|ARTIST=A|*|ALBUM=B|*|TITLE=C|*|TRACK=1"));
    assert_eq!(lines[1], "~");

    service.join().unwrap().unwrap();
}

#[test]
fn test_bare_shutdown_returns_without_reader() {
    let dir = tempfile::tempdir().unwrap();
    let pipe_path = dir.path().join("tagpipe");
    let pipe = NamedPipe::prepare(&pipe_path).unwrap();

    let (done_tx, done_rx) = mpsc::channel();
    thread::spawn(move || {
        let result = tagscan::serve(pipe, Arc::new(PathTable::new()));
        let _ = done_tx.send(result.is_ok());
    });

    // The host sends `~` and never opens the pipe for reading.
    let mut writer = OpenOptions::new().write(true).open(&pipe_path).unwrap();
    writer.write_all(b"~\n").unwrap();
    drop(writer);

    let finished = done_rx.recv_timeout(Duration::from_secs(10));
    assert_eq!(finished, Ok(true), "service still blocked after bare `~`");
}

#[test]
fn test_get_tag_info_reports_pipe_setup_failure() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no-such-dir").join("tagpipe");

    let message = tagscan::get_tag_info(&format!("pipe={}\n", missing.display()));
    assert!(message.contains("can't create named pipe"), "{message}");
    assert!(!missing.exists());
}

#[test]
fn test_get_tag_info_without_pipe_path() {
    let message = tagscan::get_tag_info("");
    assert!(!message.is_empty());
}

