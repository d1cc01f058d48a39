//! The outstanding-request table.
//!
//! One `PendingRequest` exists per live serial; the table is the sole owner
//! of each entry. Removing an entry hands its single ownership to exactly
//! one code path (response match, cancellation, or teardown), which is what
//! makes the release hook fire exactly once on every exit path.

use std::collections::HashMap;

use mtkims_binder::{Reader, TxHandle};

/// Parses the operation-specific part of a matched response and invokes the
/// submitter's completion.
pub type ResponseFn = Box<dyn FnOnce(&mut Reader) + Send>;

/// Invoked exactly once when the entry is torn down, success or failure.
pub type ReleaseFn = Box<dyn FnOnce() + Send>;

/// One in-flight asynchronous request.
pub struct PendingRequest {
    /// Process-local correlation serial, non-zero.
    pub id: u32,
    /// Transport transaction handle; zero once nothing is left to cancel.
    pub tx: TxHandle,
    /// The only response code this entry accepts.
    pub response_code: i32,
    handle_response: Option<ResponseFn>,
    on_release: Option<ReleaseFn>,
}

impl PendingRequest {
    pub fn new(
        id: u32,
        response_code: i32,
        handle_response: ResponseFn,
        on_release: Option<ReleaseFn>,
    ) -> Self {
        Self { id, tx: TxHandle::NONE, response_code, handle_response: Some(handle_response), on_release }
    }

    /// Normal completion: run the response handler on the remaining payload,
    /// then release. The entry has already left the table at this point, so
    /// a reentrant cancel from inside the handler is a no-op.
    pub fn complete(mut self, mut reader: Reader) {
        if let Some(handler) = self.handle_response.take() {
            handler(&mut reader);
        }
        self.release();
    }

    /// Tear the entry down without completing it (cancellation, teardown,
    /// transmit failure). The completion handler is dropped unfired.
    pub fn release(mut self) {
        self.handle_response.take();
        if let Some(release) = self.on_release.take() {
            release();
        }
    }
}

/// Outcome of correlating a response against the table.
pub enum Correlation {
    /// Entry found and its expected response code matches; ownership of the
    /// entry is handed to the caller and the table no longer knows it.
    Matched(PendingRequest),
    /// Entry found but it expects a different response code; left in place.
    CodeMismatch,
    /// No entry for this serial.
    NotFound,
}

/// Serial-keyed table of in-flight requests plus the serial allocator.
pub struct RequestTable {
    entries: HashMap<u32, PendingRequest>,
    last_id: u32,
}

impl RequestTable {
    pub fn new() -> Self {
        Self { entries: HashMap::new(), last_id: 0 }
    }

    /// Allocate the next serial. Serials start at 1 and wrap at the integer
    /// width, skipping zero; collision with a still-outstanding serial after
    /// wraparound is an accepted risk given the tiny window of concurrently
    /// outstanding requests.
    pub fn alloc_id(&mut self) -> u32 {
        self.last_id = self.last_id.wrapping_add(1);
        if self.last_id == 0 {
            self.last_id = 1;
        }
        self.last_id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn insert(&mut self, request: PendingRequest) {
        debug_assert!(!self.entries.contains_key(&request.id));
        self.entries.insert(request.id, request);
    }

    pub fn remove(&mut self, id: u32) -> Option<PendingRequest> {
        self.entries.remove(&id)
    }

    /// Record the transport handle of an entry once its send was queued.
    /// Returns false if the entry already completed or was cancelled while
    /// the send was in flight; the handle is stale then.
    pub fn set_tx(&mut self, id: u32, tx: TxHandle) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.tx = tx;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: u32) -> bool {
        self.entries.contains_key(&id)
    }

    /// Correlate a response by (serial, response code). Only a full match
    /// removes the entry.
    pub fn correlate(&mut self, serial: u32, code: i32) -> Correlation {
        let expected = match self.entries.get(&serial) {
            Some(entry) => entry.response_code,
            None => return Correlation::NotFound,
        };
        if expected != code {
            return Correlation::CodeMismatch;
        }
        match self.entries.remove(&serial) {
            Some(entry) => Correlation::Matched(entry),
            None => Correlation::NotFound,
        }
    }

    /// Remove every entry, handing them back for bulk release.
    pub fn drain(&mut self) -> Vec<PendingRequest> {
        self.entries.drain().map(|(_, req)| req).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn noop_entry(id: u32, resp: i32) -> PendingRequest {
        PendingRequest::new(id, resp, Box::new(|_| {}), None)
    }

    #[test]
    fn serials_start_at_one_and_skip_zero_on_wrap() {
        let mut table = RequestTable::new();
        assert_eq!(table.alloc_id(), 1);
        assert_eq!(table.alloc_id(), 2);
        table.last_id = u32::MAX;
        assert_eq!(table.alloc_id(), 1);
    }

    #[test]
    fn correlation_requires_both_serial_and_code() {
        let mut table = RequestTable::new();
        table.insert(noop_entry(5, 7));
        assert!(matches!(table.correlate(6, 7), Correlation::NotFound));
        assert!(matches!(table.correlate(5, 8), Correlation::CodeMismatch));
        assert!(table.contains(5));
        assert!(matches!(table.correlate(5, 7), Correlation::Matched(_)));
        assert!(!table.contains(5));
    }

    #[test]
    fn release_fires_exactly_once_per_drained_entry() {
        let released = Arc::new(AtomicU32::new(0));
        let mut table = RequestTable::new();
        for id in 1..=3 {
            let released = released.clone();
            table.insert(PendingRequest::new(
                id,
                7,
                Box::new(|_| panic!("completion must not fire")),
                Some(Box::new(move || {
                    released.fetch_add(1, Ordering::SeqCst);
                })),
            ));
        }
        for entry in table.drain() {
            entry.release();
        }
        assert_eq!(released.load(Ordering::SeqCst), 3);
        assert_eq!(table.len(), 0);
    }
}
