use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::persist::PersistError;
use crate::selector::SelectorError;

/// Host page elements the navigator depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostElement {
    JobRow,
    SelectionCheckbox,
    FolderButton,
    SidePanel,
    ShortlistOption,
    SaveButton,
    CloseButton,
}

impl fmt::Display for HostElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HostElement::JobRow => "job row",
            HostElement::SelectionCheckbox => "selection checkbox",
            HostElement::FolderButton => "folder button",
            HostElement::SidePanel => "folder side panel",
            HostElement::ShortlistOption => "shortlist option",
            HostElement::SaveButton => "save button",
            HostElement::CloseButton => "close button",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum NavigatorError {
    #[error("no job id could be resolved")]
    IdentityNotFound,
    #[error("{element} not found")]
    HostElementNotFound { element: HostElement },
    #[error("timed out after {waited:?} waiting for {element}")]
    HostTimeout {
        element: HostElement,
        waited: Duration,
    },
    #[error("side panel shows {found:?} but the detail view shows {expected:?}")]
    TitleMismatch { expected: String, found: String },
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl NavigatorError {
    /// Whether the failure concerns an action the user asked for and should be shown.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            NavigatorError::HostElementNotFound { .. }
                | NavigatorError::HostTimeout { .. }
                | NavigatorError::TitleMismatch { .. }
        )
    }

    /// Transient message for the user, if this kind is surfaced at all.
    pub fn notice(&self) -> Option<String> {
        let message = match self {
            NavigatorError::HostElementNotFound {
                element: HostElement::JobRow | HostElement::SelectionCheckbox,
            } => "Cannot find job in table - try refreshing".to_string(),
            NavigatorError::HostElementNotFound {
                element: HostElement::ShortlistOption,
            }
            | NavigatorError::HostTimeout {
                element: HostElement::ShortlistOption,
                ..
            } => "Shortlist option not found - try creating a shortlist folder first".to_string(),
            NavigatorError::HostElementNotFound { element } => format!("Cannot find {element}"),
            NavigatorError::HostTimeout { element, .. } => format!("Timed out waiting for {element}"),
            NavigatorError::TitleMismatch { .. } => {
                "Folder panel is showing a different job - shortlist unchanged".to_string()
            }
            NavigatorError::IdentityNotFound | NavigatorError::Persistence(_) => return None,
        };
        Some(message)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid stored json for {key}: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("storage write failed: {0}")]
    Persist(#[from] PersistError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse config: {0}")]
    Parse(String),
    #[error(transparent)]
    Selector(#[from] SelectorError),
    #[error("invalid job id pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{HostElement, NavigatorError};

    #[test]
    fn only_host_failures_are_shown() {
        assert!(!NavigatorError::IdentityNotFound.is_user_visible());
        assert!(NavigatorError::TitleMismatch {
            expected: "A".into(),
            found: "B".into()
        }
        .is_user_visible());
        let timeout = NavigatorError::HostTimeout {
            element: HostElement::SidePanel,
            waited: Duration::from_secs(8),
        };
        assert!(timeout.is_user_visible());
        assert_eq!(
            timeout.notice().as_deref(),
            Some("Timed out waiting for folder side panel")
        );
        assert_eq!(NavigatorError::IdentityNotFound.notice(), None);
    }
}
