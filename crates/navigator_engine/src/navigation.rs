//! The current list of job rows, rebuilt on demand from the host table.
use navigator_logging::nav_trace;

use crate::config::CompiledProfile;
use crate::dom::{Document, NodeId};

/// A listing row and the link that opens its detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobRow {
    pub link: NodeId,
    pub row: NodeId,
}

/// Rows in document order, from the first row link selector that matches.
/// Each row appears once, with its first matching link.
pub fn collect_rows(doc: &Document, profile: &CompiledProfile) -> Vec<JobRow> {
    let Some((selector, links)) = profile.row_links.select_first_nonempty(doc, doc.root()) else {
        nav_trace!("No job row links found");
        return Vec::new();
    };
    let mut rows: Vec<JobRow> = Vec::new();
    for link in links {
        let Some(row) = profile.row.closest(doc, link) else {
            continue;
        };
        if rows.iter().all(|known| known.row != row) {
            rows.push(JobRow { link, row });
        }
    }
    nav_trace!("Found {} job rows with {}", rows.len(), selector);
    rows
}

/// Position of the row containing `node`, if any.
pub fn row_index_of(doc: &Document, rows: &[JobRow], node: NodeId) -> Option<usize> {
    rows.iter().position(|row| doc.contains(row.row, node))
}
