/// Coalesces high-rate samples to at most one per display frame.
///
/// The newest sample always wins. Callers drain it on the next frame tick and once more before a
/// gesture ends, so the final position is never dropped.
#[derive(Clone, Debug)]
pub struct FrameThrottle<T> {
    pending: Option<T>,
    coalesced: u64,
}

impl<T> Default for FrameThrottle<T> {
    fn default() -> Self {
        Self {
            pending: None,
            coalesced: 0,
        }
    }
}

impl<T> FrameThrottle<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a sample, replacing any sample not yet flushed.
    pub fn push(&mut self, sample: T) {
        if self.pending.replace(sample).is_some() {
            self.coalesced += 1;
        }
    }

    /// Take the queued sample, if any.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of samples replaced before they were flushed.
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}
