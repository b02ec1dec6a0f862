//! Navigator-owned controls inside the host page: row stars, the detail view
//! star, the status line and the floating controls.
use navigator_core::{JobId, ShortlistSet};

use crate::config::CompiledProfile;
use crate::dom::{Document, NodeId};

pub const ROW_STAR_CLASS: &str = "nav-row-star";
pub const DETAIL_STAR_ID: &str = "nav-shortlist-star";
pub const STATUS_ID: &str = "nav-status";
pub const OPEN_FIRST_ID: &str = "nav-open-first";
pub const UI_TOGGLE_ID: &str = "nav-ui-toggle";
const JOB_ATTR: &str = "data-job-id";
const FILLED_STAR: &str = "\u{2b50}";
const EMPTY_STAR: &str = "\u{2606}";

fn star_text(shortlisted: bool) -> &'static str {
    if shortlisted {
        FILLED_STAR
    } else {
        EMPTY_STAR
    }
}

fn star_title(shortlisted: bool, suffix: &str) -> String {
    let action = if shortlisted {
        "Remove from shortlist"
    } else {
        "Add to shortlist"
    };
    format!("{action}{suffix}")
}

fn by_id(doc: &Document, id: &str) -> Option<NodeId> {
    doc.descendant_elements(doc.root())
        .into_iter()
        .find(|node| doc.attr(*node, "id") == Some(id))
}

/// The navigator control with this id at or around `node`.
pub fn within_id(doc: &Document, node: NodeId, id: &str) -> Option<NodeId> {
    doc.closest_where(node, |candidate| doc.attr(candidate, "id") == Some(id))
}

/// The job of the row star at or around `node`.
pub fn row_star_job(doc: &Document, node: NodeId) -> Option<JobId> {
    let star = doc.closest_where(node, |candidate| doc.has_class(candidate, ROW_STAR_CLASS))?;
    doc.attr(star, JOB_ATTR).and_then(JobId::parse)
}

fn row_stars(doc: &Document, scope: NodeId) -> Vec<NodeId> {
    doc.descendant_elements(scope)
        .into_iter()
        .filter(|node| doc.has_class(*node, ROW_STAR_CLASS))
        .collect()
}

fn paint_row_star(doc: &mut Document, star: NodeId, job: &JobId, shortlisted: bool) {
    doc.set_attr(star, JOB_ATTR, job.as_str());
    doc.set_attr(star, "title", &star_title(shortlisted, ""));
    doc.set_text(star, star_text(shortlisted));
}

/// Adds (or repaints) the star of one row, placed in its title cell.
pub fn attach_row_star(
    doc: &mut Document,
    profile: &CompiledProfile,
    row: NodeId,
    job: &JobId,
    shortlisted: bool,
) {
    if let Some(star) = row_stars(doc, row).into_iter().next() {
        paint_row_star(doc, star, job, shortlisted);
        return;
    }
    let cell = profile
        .title_links
        .first(doc, row)
        .and_then(|link| profile.title_cell.closest(doc, link))
        .or_else(|| profile.title_cell.select_first(doc, row))
        .unwrap_or(row);
    let star = doc.create_element_with("span", &[("class", ROW_STAR_CLASS)]);
    paint_row_star(doc, star, job, shortlisted);
    doc.append_child(cell, star);
}

pub fn remove_row_stars(doc: &mut Document) -> usize {
    let stars = row_stars(doc, doc.root());
    for star in &stars {
        doc.detach(*star);
    }
    stars.len()
}

/// Repaints every row star from the shortlist.
pub fn refresh_row_stars(doc: &mut Document, shortlist: &ShortlistSet) {
    for star in row_stars(doc, doc.root()) {
        if let Some(job) = doc.attr(star, JOB_ATTR).and_then(JobId::parse) {
            let shortlisted = shortlist.contains(&job);
            paint_row_star(doc, star, &job, shortlisted);
        }
    }
}

/// Draws the detail view star, or removes it when no job is known.
pub fn render_detail_star(doc: &mut Document, profile: &CompiledProfile, job: Option<(&JobId, bool)>) {
    if let Some(existing) = by_id(doc, DETAIL_STAR_ID) {
        doc.detach(existing);
    }
    let Some((job, shortlisted)) = job else {
        return;
    };
    let Some(detail) = profile.detail_root.select_first(doc, doc.root()) else {
        return;
    };
    let title = star_title(shortlisted, " (\u{2191})");
    let star = doc.create_element_with(
        "button",
        &[
            ("id", DETAIL_STAR_ID),
            ("class", "nav-detail-star"),
            (JOB_ATTR, job.as_str()),
            ("title", title.as_str()),
        ],
    );
    doc.set_text(star, star_text(shortlisted));
    match doc.children(detail).first() {
        Some(first) => doc.insert_before(*first, star),
        None => doc.append_child(detail, star),
    }
}

/// Shows `label` in the status line, or removes the line.
pub fn render_status(doc: &mut Document, label: Option<&str>) {
    let existing = by_id(doc, STATUS_ID);
    match (existing, label) {
        (Some(status), Some(label)) => doc.set_text(status, label),
        (None, Some(label)) => {
            let status =
                doc.create_element_with("div", &[("id", STATUS_ID), ("class", "nav-status")]);
            doc.set_text(status, label);
            let root = doc.root();
            doc.append_child(root, status);
        }
        (Some(status), None) => doc.detach(status),
        (None, None) => {}
    }
}

/// The floating entry point and the enhancement on/off switch.
pub fn render_controls(doc: &mut Document, ui_enabled: bool) {
    let root = doc.root();
    if by_id(doc, OPEN_FIRST_ID).is_none() {
        let open = doc.create_element_with("button", &[("id", OPEN_FIRST_ID), ("class", "nav-floating")]);
        doc.set_text(open, "\u{1f4cb} Open Jobs");
        doc.append_child(root, open);
    }
    let toggle = match by_id(doc, UI_TOGGLE_ID) {
        Some(toggle) => toggle,
        None => {
            let toggle = doc.create_element_with("button", &[("id", UI_TOGGLE_ID), ("class", "nav-floating")]);
            doc.append_child(root, toggle);
            toggle
        }
    };
    doc.set_attr(toggle, "aria-pressed", if ui_enabled { "true" } else { "false" });
    doc.set_text(toggle, if ui_enabled { "UI: on" } else { "UI: off" });
}
