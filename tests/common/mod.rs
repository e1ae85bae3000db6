//! Shared helpers for integration tests: an in-memory host and audio fixtures.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tagscan::{Result, Transport};

/// Everything the service wrote back, across all batches.
#[derive(Clone, Default)]
pub struct SharedOutput(Arc<Mutex<Vec<u8>>>);

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedOutput {
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    /// Records grouped per batch; the `~` lines are the separators.
    /// Panics if the output does not end with a terminator.
    pub fn batches(&self) -> Vec<Vec<String>> {
        let lines = self.lines();
        assert_eq!(lines.last().map(String::as_str), Some("~"), "output: {lines:?}");

        let mut batches = vec![Vec::new()];
        for line in lines {
            if line == "~" {
                batches.push(Vec::new());
            } else {
                batches.last_mut().unwrap().push(line);
            }
        }
        batches.pop();
        batches
    }
}

/// A host that sends a fixed list of requests and then hangs up.
#[derive(Clone, Default)]
pub struct ScriptedHost {
    pub requests: Arc<Mutex<VecDeque<String>>>,
    pub output: SharedOutput,
}

impl ScriptedHost {
    pub fn new(requests: &[&str]) -> Self {
        Self {
            requests: Arc::new(Mutex::new(
                requests.iter().map(|r| format!("{r}\n")).collect(),
            )),
            output: SharedOutput::default(),
        }
    }

    pub fn unread(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Transport for ScriptedHost {
    fn next_request(&mut self) -> Result<Option<String>> {
        Ok(self.requests.lock().unwrap().pop_front())
    }

    fn open_response(&mut self) -> Result<Box<dyn Write + Send>> {
        Ok(Box::new(self.output.clone()))
    }
}

/// Silent 16-bit PCM WAV with no tags.
pub fn plain_wav(path: &Path, sample_rate: u32, channels: u16, seconds: u32) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for _ in 0..(sample_rate * seconds * u32::from(channels)) {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}

/// Silent 16-bit mono PCM WAV carrying a RIFF `LIST/INFO` tag chunk.
///
/// `info` entries are (chunk id, value), e.g. (b"IART", "Artist").
pub fn tagged_wav(path: &Path, sample_rate: u32, seconds: u32, info: &[(&[u8; 4], &str)]) {
    let data_len = sample_rate * seconds * 2;

    let mut list = Vec::new();
    list.extend_from_slice(b"INFO");
    for (id, value) in info {
        // NUL-terminate and keep every sub-chunk an even length so no pad bytes are needed.
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);
        if bytes.len() % 2 == 1 {
            bytes.push(0);
        }
        list.extend_from_slice(*id);
        list.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        list.extend_from_slice(&bytes);
    }

    let mut fmt = Vec::new();
    fmt.extend_from_slice(&1u16.to_le_bytes()); // PCM
    fmt.extend_from_slice(&1u16.to_le_bytes()); // mono
    fmt.extend_from_slice(&sample_rate.to_le_bytes());
    fmt.extend_from_slice(&(sample_rate * 2).to_le_bytes()); // byte rate
    fmt.extend_from_slice(&2u16.to_le_bytes()); // block align
    fmt.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

    let mut body = Vec::new();
    body.extend_from_slice(b"WAVE");
    push_chunk(&mut body, b"fmt ", &fmt);
    push_chunk(&mut body, b"LIST", &list);
    push_chunk(&mut body, b"data", &vec![0u8; data_len as usize]);

    let mut file = Vec::new();
    file.extend_from_slice(b"RIFF");
    file.extend_from_slice(&(body.len() as u32).to_le_bytes());
    file.extend_from_slice(&body);
    fs::write(path, file).unwrap();
}

fn push_chunk(out: &mut Vec<u8>, id: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(id);
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
    if data.len() % 2 == 1 {
        out.push(0);
    }
}

/// A file that no demuxer will accept.
pub fn junk_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"this is a plain text note, not audio\n").unwrap();
    path
}

/// The `A / B / C / 1` fixture used by the protocol scenarios.
pub fn abc_wav(dir: &Path) -> PathBuf {
    let path = dir.join("abc.wav");
    tagged_wav(
        &path,
        8000,
        1,
        &[(b"IART", "A"), (b"IPRD", "B"), (b"INAM", "C"), (b"ITRK", "1")],
    );
    path
}
