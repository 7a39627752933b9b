//! Per-node error records.

use indexmap::IndexSet;

/// Problems a node ran into while calculating.
///
/// Recording an issue does not stop the resolution pass. A node that cannot
/// let the pass continue calls [`Issues::abort`] instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Issues {
    entries: IndexSet<String>,
    abort: Option<String>,
}

impl Issues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issue. Returns false if the same message was already recorded.
    pub fn push(&mut self, message: impl Into<String>) -> bool {
        self.entries.insert(message.into())
    }

    /// Stop the resolution pass after this node finishes calculating.
    ///
    /// The first reason given wins.
    pub fn abort(&mut self, reason: impl Into<String>) {
        if self.abort.is_none() {
            self.abort = Some(reason.into());
        }
    }

    pub fn abort_reason(&self) -> Option<&str> {
        self.abort.as_deref()
    }

    pub fn contains(&self, message: &str) -> bool {
        self.entries.contains(message)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.abort = None;
    }

    pub fn into_set(self) -> IndexSet<String> {
        self.entries
    }
}

impl Extend<String> for Issues {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}
