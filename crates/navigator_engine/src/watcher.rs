//! Translates raw host mutation batches into typed [`HostEvent`]s.
//!
//! Detail view, tab and side panel state are diffed by presence against the
//! last observed document, so repeated delivery of one logical change yields
//! one event and changes the session made itself are picked up on the next
//! batch. Row changes come from the records themselves.
use navigator_core::JobId;
use navigator_logging::{nav_debug, nav_trace};
use tokio::time::Instant;

use crate::config::CompiledProfile;
use crate::dom::{Document, NodeId};

/// One host DOM change, in the shape a mutation observer reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord {
    ChildList {
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    Attributes {
        target: NodeId,
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Rows were added and removed in one batch: a page swap.
    RowsReplaced,
    /// Rows were only added.
    RowsAdded(Vec<NodeId>),
    DetailOpened { root: NodeId, content_ready: bool },
    DetailClosed,
    TabChanged { overview: bool },
    BulkPanelOpened { panel: NodeId },
    BulkPanelClosed,
}

#[derive(Debug, Default)]
pub struct ChangeWatcher {
    detail: Option<NodeId>,
    overview: bool,
    side_panel: Option<NodeId>,
}

impl ChangeWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events for one batch. Row and side panel watching is limited to
    /// listing pages.
    pub fn observe(
        &mut self,
        doc: &Document,
        profile: &CompiledProfile,
        records: &[MutationRecord],
        listing: bool,
    ) -> Vec<HostEvent> {
        let mut events = Vec::new();
        if listing {
            events.extend(self.row_event(doc, profile, records));
        }
        events.extend(self.sync(doc, profile, listing));
        events
    }

    /// Presence diff of the detail view, its active tab and the side panel.
    pub fn sync(&mut self, doc: &Document, profile: &CompiledProfile, listing: bool) -> Vec<HostEvent> {
        let mut events = Vec::new();
        let detail = profile.detail_root.select_first(doc, doc.root());
        match (self.detail, detail) {
            (Some(known), Some(current)) if known == current => {
                let overview = overview_active(doc, profile);
                if overview != self.overview {
                    nav_debug!("Detail tab changed, overview = {}", overview);
                    self.overview = overview;
                    events.push(HostEvent::TabChanged { overview });
                }
            }
            (known, Some(current)) => {
                if known.is_some() {
                    events.push(HostEvent::DetailClosed);
                }
                self.detail = Some(current);
                self.overview = overview_active(doc, profile);
                let content_ready = content_ready(doc, profile, current);
                nav_debug!("Detail view appeared, content ready = {}", content_ready);
                events.push(HostEvent::DetailOpened {
                    root: current,
                    content_ready,
                });
            }
            (Some(_), None) => {
                nav_debug!("Detail view removed");
                self.detail = None;
                events.push(HostEvent::DetailClosed);
            }
            (None, None) => {}
        }

        let panel = if listing {
            profile.side_panel.select_first(doc, doc.root())
        } else {
            None
        };
        match (self.side_panel, panel) {
            (Some(known), Some(current)) if known == current => {}
            (known, Some(current)) => {
                if known.is_some() {
                    events.push(HostEvent::BulkPanelClosed);
                }
                self.side_panel = Some(current);
                events.push(HostEvent::BulkPanelOpened { panel: current });
            }
            (Some(_), None) => {
                self.side_panel = None;
                events.push(HostEvent::BulkPanelClosed);
            }
            (None, None) => {}
        }
        events
    }

    fn row_event(
        &self,
        doc: &Document,
        profile: &CompiledProfile,
        records: &[MutationRecord],
    ) -> Option<HostEvent> {
        let detail = profile.detail_root.select_first(doc, doc.root());
        let in_detail = |node: NodeId| detail.is_some_and(|root| doc.contains(root, node));
        let mut added: Vec<NodeId> = Vec::new();
        let mut removed = false;
        for record in records {
            let MutationRecord::ChildList {
                target,
                added: added_nodes,
                removed: removed_nodes,
            } = record
            else {
                continue;
            };
            if in_detail(*target) {
                continue;
            }
            for node in added_nodes {
                if !doc.is_attached(*node) || in_detail(*node) {
                    continue;
                }
                for row in rows_in(doc, profile, *node) {
                    if !added.contains(&row) {
                        added.push(row);
                    }
                }
            }
            for node in removed_nodes {
                let is_detail = profile.detail_root.matches(doc, *node)
                    || profile.detail_root.select_first(doc, *node).is_some();
                if !is_detail && !rows_in(doc, profile, *node).is_empty() {
                    removed = true;
                }
            }
        }
        match (added.is_empty(), removed) {
            (false, true) => {
                nav_trace!("Row batch: replaced");
                Some(HostEvent::RowsReplaced)
            }
            (false, false) => {
                nav_trace!("Row batch: {} added", added.len());
                Some(HostEvent::RowsAdded(added))
            }
            // Removal alone waits for its paired addition.
            (true, _) => None,
        }
    }
}

fn rows_in(doc: &Document, profile: &CompiledProfile, node: NodeId) -> Vec<NodeId> {
    if !doc.is_element(node) {
        return Vec::new();
    }
    let mut rows = Vec::new();
    if profile.row.matches(doc, node) {
        rows.push(node);
    }
    rows.extend(profile.row.select(doc, node));
    rows
}

/// Whether the active tab is the overview; true when no tab control exists.
pub fn overview_active(doc: &Document, profile: &CompiledProfile) -> bool {
    let wanted = profile.source.overview_tab_text.to_uppercase();
    match profile.active_tab.select_first(doc, doc.root()) {
        Some(tab) => doc.text_content(tab).to_uppercase().contains(&wanted),
        None => true,
    }
}

/// Whether the detail view has rendered at least one panel root.
pub fn content_ready(doc: &Document, profile: &CompiledProfile, detail: NodeId) -> bool {
    let scope = profile.tab_panel.select_first(doc, detail).unwrap_or(detail);
    profile.panel_roots.select_first(doc, scope).is_some()
}

/// Job ids of the rows currently selected in the host table.
pub fn selected_jobs(doc: &Document, profile: &CompiledProfile) -> Vec<JobId> {
    let mut jobs: Vec<JobId> = Vec::new();
    for checkbox in profile.selection_checkbox.select(doc, doc.root()) {
        if !doc.is_checked(checkbox) {
            continue;
        }
        if let Some(job) = doc.attr(checkbox, "value").and_then(JobId::parse) {
            if !jobs.contains(&job) {
                jobs.push(job);
            }
        }
    }
    jobs
}

/// A single pending deadline; scheduling again replaces the previous one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Debounce {
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn schedule(&mut self, at: Instant) {
        self.deadline = Some(at);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Clears and reports the deadline once it has passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(at) if at <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
