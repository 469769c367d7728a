//! Ordered buffer for reports that could not be delivered.
//!
//! Reports land here whenever the link is not connected and are
//! flushed in FIFO order after the next successful connection. Entries
//! are removed only once the transport has accepted them; a failure
//! mid-flush leaves the remainder queued in order.
//!
//! The queue is deliberately unbounded, matching the reporter's
//! store-everything-while-offline behavior. Growth past
//! [`GROWTH_WARN_THRESHOLD`] is logged so long offline periods are
//! visible to operators.
//!
//! The queue assumes external serialization; it is owned and mutated
//! only by the reporting service's event loop.

use std::collections::VecDeque;

use tracing::warn;

use geolink_types::Report;

/// Queue length at which enqueue starts logging warnings.
pub const GROWTH_WARN_THRESHOLD: usize = 1000;

/// FIFO buffer of undelivered reports.
#[derive(Debug, Default)]
pub struct PendingQueue {
    reports: VecDeque<Report>,
}

impl PendingQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a report; insertion order is send order.
    pub fn enqueue(&mut self, report: Report) {
        self.reports.push_back(report);
        if self.reports.len() >= GROWTH_WARN_THRESHOLD {
            warn!(queued = self.reports.len(), "pending queue keeps growing");
        }
    }

    /// Flush entries from the front, invoking `sender` on each.
    ///
    /// Stops at the first `sender` failure; only entries for which
    /// `sender` returned `true` are removed, and the remainder keeps
    /// its order. Returns the number of reports sent.
    pub fn drain<F>(&mut self, mut sender: F) -> usize
    where
        F: FnMut(&Report) -> bool,
    {
        let mut sent = 0;
        while let Some(report) = self.reports.front() {
            if !sender(report) {
                break;
            }
            self.reports.pop_front();
            sent += 1;
        }
        sent
    }

    /// Oldest queued report, if any.
    pub fn front(&self) -> Option<&Report> {
        self.reports.front()
    }

    /// Remove and return the oldest queued report.
    pub fn pop_front(&mut self) -> Option<Report> {
        self.reports.pop_front()
    }

    /// Whether the queue holds no reports.
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Number of queued reports.
    pub fn len(&self) -> usize {
        self.reports.len()
    }
}
