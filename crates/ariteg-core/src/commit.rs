use ariteg_store::Commit;
use ariteg_types::{now_millis, AritegLink};

/// Input to [`crate::Ariteg::store_commit`].
#[derive(Clone, Debug)]
pub struct CommitDraft {
    pub root: AritegLink,
    pub parents: Vec<AritegLink>,
    pub message: String,
    pub author: String,
    pub timestamp_ms: Option<i64>,
}

impl CommitDraft {
    pub fn new(root: AritegLink) -> Self {
        Self {
            root,
            parents: Vec::new(),
            message: String::new(),
            author: String::new(),
            timestamp_ms: None,
        }
    }

    pub fn with_parent(mut self, parent: AritegLink) -> Self {
        self.parents.push(parent);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Pin the timestamp. Without it the commit is stamped when stored.
    pub fn with_timestamp(mut self, unix_timestamp_ms: i64) -> Self {
        self.timestamp_ms = Some(unix_timestamp_ms);
        self
    }

    pub(crate) fn into_commit(self) -> Commit {
        Commit {
            root: self.root,
            parents: self.parents,
            message: self.message,
            author: self.author,
            unix_timestamp_ms: self.timestamp_ms.unwrap_or_else(now_millis),
        }
    }
}
