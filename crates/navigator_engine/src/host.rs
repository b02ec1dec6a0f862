//! The boundary to the live page.
use std::time::Duration;

use async_trait::async_trait;
use navigator_core::JobId;

use crate::dom::{Document, NodeId};
use crate::error::{HostElement, NavigatorError};
use crate::watcher::MutationRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Added,
    Removed,
    Info,
    Error,
}

/// A transient on-screen message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// What the host should do with the input event that was just handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    /// Let the host's own handlers run.
    Default,
    /// Prevent the default action and stop propagation.
    Suppress,
}

/// Host page access. Clicks dispatch the host's own behaviour; the changes
/// they cause are reported through [`HostSurface::next_mutations`].
#[async_trait(?Send)]
pub trait HostSurface {
    fn document(&self) -> &Document;
    fn document_mut(&mut self) -> &mut Document;
    /// URL of the current page.
    fn location(&self) -> String;
    fn click(&mut self, node: NodeId);
    fn set_checked(&mut self, node: NodeId, checked: bool);
    /// Asks the user a yes/no question.
    fn confirm(&mut self, prompt: &str) -> bool;
    fn notify(&mut self, notice: Notice);

    async fn sleep(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// The next batch of mutation records, or an empty batch when nothing
    /// changed within `within`.
    async fn next_mutations(&mut self, within: Duration) -> Vec<MutationRecord>;

    /// Whether the page exposes its own favourite toggle.
    fn supports_favourite(&self) -> bool {
        false
    }

    async fn toggle_favourite(&mut self, job: &JobId, shortlisted: bool) -> Result<(), NavigatorError> {
        let _ = (job, shortlisted);
        Err(NavigatorError::HostElementNotFound {
            element: HostElement::FolderButton,
        })
    }
}
