//! core/dispatch.rs
//! The batch protocol.
//!
//! One request = one batch:
//!   read request -> fill queue -> release workers -> barrier -> terminator
//! and around again, until a request carries the shutdown marker (or the
//! host hangs up), at which point the pool is joined and `run` returns.
//!
//! Request line: comma separated handle ids, optionally followed by `~`
//! ("12,14,17", "12,14~", "", "~"). A bare "~" ends the service without a
//! response: the host does not open a reader for it.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::pool::{Inspect, ResponseChannel, TaskQueue, WorkerPool};
use super::tags::FINISHED;
use super::transport::Transport;
use super::types::FileTask;
use crate::error::Result;

/// One parsed request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub tasks: Vec<FileTask>,
    /// Process this batch, then shut down.
    pub terminate: bool,
}

impl Request {
    /// Parse one request line.
    ///
    /// Only the first whitespace-separated token counts. Any run of trailing
    /// `~` marks shutdown. Ids are read left to right; the first id that
    /// doesn't parse ends the list.
    pub fn parse(line: &str) -> Request {
        let token = line.split_whitespace().next().unwrap_or("");

        let ids = token.trim_end_matches(FINISHED);
        let terminate = ids.len() < token.len();

        let mut tasks = Vec::new();
        if !ids.is_empty() {
            for id in ids.split(',') {
                match id.parse::<i32>() {
                    Ok(fd) => tasks.push(FileTask(fd)),
                    Err(_) => {
                        warn!(token = %id, "malformed file handle in request; ignoring the rest");
                        break;
                    }
                }
            }
        }

        Request { tasks, terminate }
    }
}

/// Where the dispatcher is in the batch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingRequest,
    Running { terminate: bool },
    Terminating,
}

pub struct Dispatcher<T: Transport> {
    transport: T,
    queue: Arc<TaskQueue>,
    channel: Arc<ResponseChannel>,
    pool: WorkerPool,
    batches: u64,
}

impl<T: Transport> Dispatcher<T> {
    /// Start the pool. Workers idle until the first request.
    pub fn new(transport: T, workers: usize, inspector: Arc<dyn Inspect>) -> Result<Self> {
        let queue = Arc::new(TaskQueue::new());
        let channel = Arc::new(ResponseChannel::new());
        let pool = WorkerPool::start(
            workers,
            Arc::clone(&queue),
            Arc::clone(&channel),
            inspector,
        )?;

        Ok(Self {
            transport,
            queue,
            channel,
            pool,
            batches: 0,
        })
    }

    /// Number of batches answered so far.
    pub fn batches(&self) -> u64 {
        self.batches
    }

    /// Serve requests until a shutdown request. All workers are joined when this returns,
    /// whether it returns `Ok` or `Err`.
    pub fn run(&mut self) -> Result<()> {
        let result = self.serve();
        self.pool.shutdown();
        info!(batches = self.batches, "dispatcher stopped");
        result
    }

    fn serve(&mut self) -> Result<()> {
        let mut phase = Phase::AwaitingRequest;

        loop {
            phase = match phase {
                Phase::AwaitingRequest => match self.transport.next_request()? {
                    Some(line) => {
                        let request = Request::parse(&line);
                        info!(
                            tasks = request.tasks.len(),
                            terminate = request.terminate,
                            "batch received"
                        );
                        if request.terminate && request.tasks.is_empty() {
                            // The host stops without opening a reader: there is
                            // no response stream for a bare shutdown.
                            Phase::Terminating
                        } else {
                            self.queue.extend(request.tasks);
                            Phase::Running {
                                terminate: request.terminate,
                            }
                        }
                    }
                    None => {
                        info!("host closed the channel; shutting down");
                        Phase::Terminating
                    }
                },
                Phase::Running { terminate } => {
                    self.run_batch()?;
                    if terminate {
                        Phase::Terminating
                    } else {
                        Phase::AwaitingRequest
                    }
                }
                Phase::Terminating => return Ok(()),
            };
        }
    }

    /// Release workers on the filled queue, wait for all of them, close the batch.
    fn run_batch(&mut self) -> Result<()> {
        let writer = self.transport.open_response()?;
        self.channel.attach(writer);

        self.pool.run_batch()?;

        debug_assert!(self.queue.is_empty());
        if let Err(e) = self.channel.finish_batch() {
            warn!(error = %e, "failed to write batch terminator");
        }

        self.batches += 1;
        debug!(batch = self.batches, "batch complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_batch() {
        let request = Request::parse("12,14,17\n");
        assert_eq!(request.tasks, vec![FileTask(12), FileTask(14), FileTask(17)]);
        assert!(!request.terminate);
    }

    #[test]
    fn test_parse_terminating_batch() {
        let request = Request::parse("12,14~");
        assert_eq!(request.tasks, vec![FileTask(12), FileTask(14)]);
        assert!(request.terminate);
    }

    #[test]
    fn test_parse_empty_requests() {
        assert_eq!(Request::parse(""), Request::default());
        assert_eq!(Request::parse("\n"), Request::default());
        assert_eq!(
            Request::parse("~\n"),
            Request {
                tasks: Vec::new(),
                terminate: true
            }
        );
    }

    #[test]
    fn test_parse_repeated_shutdown_marker() {
        let request = Request::parse("12~~\n");
        assert_eq!(request.tasks, vec![FileTask(12)]);
        assert!(request.terminate);

        let request = Request::parse("~~");
        assert!(request.tasks.is_empty());
        assert!(request.terminate);
    }

    #[test]
    fn test_parse_stops_at_malformed_id() {
        let request = Request::parse("3,x,5~");
        assert_eq!(request.tasks, vec![FileTask(3)]);
        assert!(request.terminate);
    }

    #[test]
    fn test_parse_only_first_token() {
        let request = Request::parse("  7,8 9,10~");
        assert_eq!(request.tasks, vec![FileTask(7), FileTask(8)]);
        assert!(!request.terminate);
    }
}
