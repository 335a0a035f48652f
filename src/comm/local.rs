//! In-process transport: every rank of the world shares one mailbox table.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::{CommError, PendingRecv, Tag, Transport};
use crate::types::Rank;

/// Mailbox key: (source, dest, tag).
type MailboxKey = (Rank, Rank, Tag);

#[derive(Default)]
struct Mailboxes {
    queues: Mutex<HashMap<MailboxKey, VecDeque<Vec<f64>>>>,
    arrived: Condvar,
}

/// A world of `size` ranks living in one process.
///
/// Messages are copied into FIFO mailboxes keyed by (source, dest, tag), so
/// traffic under one tag is never consumed by a receive posted for another.
///
/// # Example
///
/// ```
/// use fr_rs::comm::{LocalWorld, Tag, Transport};
/// use fr_rs::types::Rank;
///
/// let world = LocalWorld::new(2);
/// let a = world.transport(Rank::new(0)).unwrap();
/// let b = world.transport(Rank::new(1)).unwrap();
///
/// a.isend(Rank::new(1), Tag::new(7), vec![1.0, 2.0]).unwrap();
/// let recv = b.irecv(Rank::new(0), Tag::new(7), 2).unwrap();
/// assert_eq!(recv.wait().unwrap(), vec![1.0, 2.0]);
/// ```
#[derive(Clone)]
pub struct LocalWorld {
    size: usize,
    timeout: Option<Duration>,
    mailboxes: Arc<Mailboxes>,
}

impl LocalWorld {
    /// Create a world of `size` ranks with no receive timeout.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            timeout: None,
            mailboxes: Arc::new(Mailboxes::default()),
        }
    }

    /// Bound every receive wait by `timeout`.
    ///
    /// Applies to transports created after this call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Number of ranks.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Endpoint for `rank`.
    pub fn transport(&self, rank: Rank) -> Result<LocalTransport, CommError> {
        if rank.get() >= self.size {
            return Err(CommError::InvalidRank {
                rank,
                size: self.size,
            });
        }
        Ok(LocalTransport {
            rank,
            size: self.size,
            timeout: self.timeout,
            mailboxes: Arc::clone(&self.mailboxes),
        })
    }
}

/// One rank's endpoint into a [`LocalWorld`].
#[derive(Clone)]
pub struct LocalTransport {
    rank: Rank,
    size: usize,
    timeout: Option<Duration>,
    mailboxes: Arc<Mailboxes>,
}

impl Transport for LocalTransport {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn isend(&self, dest: Rank, tag: Tag, buf: Vec<f64>) -> Result<(), CommError> {
        self.check_rank(dest)?;
        let mut queues = self.mailboxes.queues.lock();
        queues.entry((self.rank, dest, tag)).or_default().push_back(buf);
        self.mailboxes.arrived.notify_all();
        Ok(())
    }

    fn irecv(&self, source: Rank, tag: Tag, len: usize) -> Result<Box<dyn PendingRecv>, CommError> {
        self.check_rank(source)?;
        Ok(Box::new(LocalRecv {
            key: (source, self.rank, tag),
            len,
            timeout: self.timeout,
            mailboxes: Arc::clone(&self.mailboxes),
        }))
    }
}

struct LocalRecv {
    key: MailboxKey,
    len: usize,
    timeout: Option<Duration>,
    mailboxes: Arc<Mailboxes>,
}

impl PendingRecv for LocalRecv {
    fn peer(&self) -> Rank {
        self.key.0
    }

    fn tag(&self) -> Tag {
        self.key.2
    }

    fn wait(self: Box<Self>) -> Result<Vec<f64>, CommError> {
        let (peer, _, tag) = self.key;
        let started = Instant::now();
        let deadline = self.timeout.map(|t| started + t);

        let mut queues = self.mailboxes.queues.lock();
        loop {
            if let Some(buf) = queues.get_mut(&self.key).and_then(VecDeque::pop_front) {
                if buf.len() != self.len {
                    return Err(CommError::size_mismatch(peer, tag, self.len, buf.len()));
                }
                return Ok(buf);
            }

            match deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return Err(CommError::Timeout {
                            peer,
                            tag,
                            waited: started.elapsed(),
                        });
                    }
                    self.mailboxes.arrived.wait_until(&mut queues, deadline);
                }
                None => self.mailboxes.arrived.wait(&mut queues),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (LocalTransport, LocalTransport) {
        let world = LocalWorld::new(2).with_timeout(Duration::from_millis(50));
        (
            world.transport(Rank::new(0)).unwrap(),
            world.transport(Rank::new(1)).unwrap(),
        )
    }

    #[test]
    fn test_send_then_receive() {
        let (a, b) = pair();
        a.isend(Rank::new(1), Tag::new(5), vec![3.0, 4.0, 5.0]).unwrap();

        let recv = b.irecv(Rank::new(0), Tag::new(5), 3).unwrap();
        assert_eq!(recv.peer(), Rank::new(0));
        assert_eq!(recv.tag(), Tag::new(5));
        assert_eq!(recv.wait().unwrap(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_receive_posted_before_send() {
        let (a, b) = pair();
        let recv = b.irecv(Rank::new(0), Tag::new(5), 1).unwrap();
        a.isend(Rank::new(1), Tag::new(5), vec![9.0]).unwrap();
        assert_eq!(recv.wait().unwrap(), vec![9.0]);
    }

    #[test]
    fn test_tags_do_not_cross() {
        let (a, b) = pair();
        a.isend(Rank::new(1), Tag::new(1), vec![1.0]).unwrap();
        a.isend(Rank::new(1), Tag::new(2), vec![2.0]).unwrap();

        let second = b.irecv(Rank::new(0), Tag::new(2), 1).unwrap();
        assert_eq!(second.wait().unwrap(), vec![2.0]);
        let first = b.irecv(Rank::new(0), Tag::new(1), 1).unwrap();
        assert_eq!(first.wait().unwrap(), vec![1.0]);
    }

    #[test]
    fn test_fifo_per_tag() {
        let (a, b) = pair();
        a.isend(Rank::new(1), Tag::new(1), vec![1.0]).unwrap();
        a.isend(Rank::new(1), Tag::new(1), vec![2.0]).unwrap();

        let r1 = b.irecv(Rank::new(0), Tag::new(1), 1).unwrap().wait().unwrap();
        let r2 = b.irecv(Rank::new(0), Tag::new(1), 1).unwrap().wait().unwrap();
        assert_eq!((r1[0], r2[0]), (1.0, 2.0));
    }

    #[test]
    fn test_size_mismatch() {
        let (a, b) = pair();
        a.isend(Rank::new(1), Tag::new(1), vec![1.0, 2.0]).unwrap();
        let err = b.irecv(Rank::new(0), Tag::new(1), 3).unwrap().wait().unwrap_err();
        assert_eq!(err, CommError::size_mismatch(Rank::new(0), Tag::new(1), 3, 2));
    }

    #[test]
    fn test_timeout() {
        let (_a, b) = pair();
        let err = b.irecv(Rank::new(0), Tag::new(1), 1).unwrap().wait().unwrap_err();
        assert!(matches!(err, CommError::Timeout { .. }));
    }

    #[test]
    fn test_invalid_rank() {
        let (a, _b) = pair();
        let err = a.isend(Rank::new(4), Tag::new(1), vec![]).unwrap_err();
        assert_eq!(
            err,
            CommError::InvalidRank {
                rank: Rank::new(4),
                size: 2
            }
        );
        assert!(LocalWorld::new(2).transport(Rank::new(2)).is_err());
    }
}
