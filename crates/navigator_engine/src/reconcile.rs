//! Builds the enhanced panel layout of the detail view from the host's own
//! panels, and tears it down again.
//!
//! `enhance` always starts with `teardown`, so running it twice on the same
//! host content produces the same document.
use navigator_core::Layout;
use navigator_logging::{nav_debug, nav_trace};

use crate::config::CompiledProfile;
use crate::dom::{Document, NodeId};
use crate::fields::{self, ExtractedField, FieldKind};
use crate::layout::LayoutState;
use crate::store::KeyValueStore;

pub const ENHANCED_PANEL_CLASS: &str = "nav-enhanced-panel";
pub const PANEL_TITLE_ATTR: &str = "data-panel-title";
pub const FIELD_NAME_ATTR: &str = "data-field-name";
pub const PANEL_COLLAPSE_CLASS: &str = "nav-panel-collapse";
pub const FIELD_COLLAPSE_CLASS: &str = "nav-field-collapse";
const COLLAPSED_STYLE: &str = "display: none";
const EXPANDED_ARROW: &str = "\u{25be}";
const COLLAPSED_ARROW: &str = "\u{25b8}";
const DRAG_HANDLE: &str = "\u{22ee}\u{22ee}";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnhanceReport {
    /// Titles of the enhanced panels, in build order.
    pub panels: Vec<String>,
    pub fields: usize,
}

struct HostPanel {
    root: NodeId,
    heading: NodeId,
    title: String,
}

struct RenderedField {
    name: String,
    unit: NodeId,
}

/// Removes every enhanced panel and restores every hidden host element.
/// Returns the number of panels removed.
pub fn teardown(doc: &mut Document) -> usize {
    let root = doc.root();
    let panels: Vec<NodeId> = doc
        .descendant_elements(root)
        .into_iter()
        .filter(|node| doc.has_class(*node, ENHANCED_PANEL_CLASS))
        .collect();
    for panel in &panels {
        doc.detach(*panel);
    }
    let hidden: Vec<NodeId> = doc
        .descendant_elements(root)
        .into_iter()
        .filter(|node| fields::is_hidden(doc, *node))
        .collect();
    for node in hidden {
        fields::restore(doc, node);
    }
    if !panels.is_empty() {
        nav_trace!("Removed {} enhanced panels", panels.len());
    }
    panels.len()
}

/// Rebuilds the enhanced layout of the open detail view. `None` when no
/// detail view is in the document.
pub fn enhance<S: KeyValueStore>(
    doc: &mut Document,
    profile: &CompiledProfile,
    layout: &mut LayoutState<S>,
) -> Option<EnhanceReport> {
    teardown(doc);
    let detail = profile.detail_root.select_first(doc, doc.root())?;

    let mut report = EnhanceReport::default();
    for panel in discover_panels(doc, profile, detail) {
        if let Some(count) = build_panel(doc, profile, layout, &panel) {
            report.fields += count;
            report.panels.push(panel.title);
        }
    }
    order_panels(doc, layout.layout(), detail);
    nav_debug!(
        "Enhanced {} panels with {} fields ({} nodes in the arena)",
        report.panels.len(),
        report.fields,
        doc.arena_len()
    );
    Some(report)
}

/// Titles of the enhanced panels in on-screen order.
pub fn panel_order(doc: &Document, profile: &CompiledProfile) -> Vec<String> {
    let Some(detail) = profile.detail_root.select_first(doc, doc.root()) else {
        return Vec::new();
    };
    enhanced_panels(doc, detail)
        .into_iter()
        .filter_map(|panel| doc.attr(panel, PANEL_TITLE_ATTR).map(str::to_string))
        .collect()
}

fn enhanced_panels(doc: &Document, scope: NodeId) -> Vec<NodeId> {
    doc.descendant_elements(scope)
        .into_iter()
        .filter(|node| doc.has_class(*node, ENHANCED_PANEL_CLASS))
        .collect()
}

fn heading_title(doc: &Document, heading: NodeId) -> String {
    doc.text_content(heading).trim().to_string()
}

fn discover_panels(doc: &Document, profile: &CompiledProfile, detail: NodeId) -> Vec<HostPanel> {
    let mut panels: Vec<HostPanel> = Vec::new();
    for root in profile.panel_roots.select(doc, detail) {
        if panels.iter().any(|known| doc.contains(known.root, root)) {
            continue;
        }
        let Some(heading) = profile.panel_heading.select_first(doc, root) else {
            continue;
        };
        let title = heading_title(doc, heading);
        if !title.is_empty() {
            panels.push(HostPanel {
                root,
                heading,
                title,
            });
        }
    }

    // Headings outside the known panel roots. Only looked for inside the tab
    // panel so the job title header is never taken for a section.
    let Some(tab_panel) = profile.tab_panel.select_first(doc, detail) else {
        return panels;
    };
    for heading in profile.panel_heading.select(doc, tab_panel) {
        if panels.iter().any(|known| doc.contains(known.root, heading)) {
            continue;
        }
        let title = heading_title(doc, heading);
        if title.is_empty() {
            continue;
        }
        let Some(root) = heading_container(doc, profile, tab_panel, heading) else {
            continue;
        };
        if panels
            .iter()
            .any(|known| doc.contains(root, known.root) || doc.contains(known.root, root))
        {
            continue;
        }
        nav_trace!("Using container of heading {:?} as a panel", title);
        panels.push(HostPanel {
            root,
            heading,
            title,
        });
    }
    panels
}

/// Nearest ancestor below `scope` holding field-like content.
fn heading_container(
    doc: &Document,
    profile: &CompiledProfile,
    scope: NodeId,
    heading: NodeId,
) -> Option<NodeId> {
    doc.ancestor_elements(heading)
        .into_iter()
        .take_while(|ancestor| *ancestor != scope)
        .find(|ancestor| {
            profile.key_value_list.select_first(doc, *ancestor).is_some()
                || doc
                    .descendant_elements(*ancestor)
                    .into_iter()
                    .any(|node| matches!(doc.tag(node), Some("p" | "ul")))
        })
}

fn build_panel<S: KeyValueStore>(
    doc: &mut Document,
    profile: &CompiledProfile,
    layout: &mut LayoutState<S>,
    panel: &HostPanel,
) -> Option<usize> {
    let marker = profile.source.service_team_marker.to_uppercase();
    let mut extracted = if panel.title.to_uppercase().contains(&marker) {
        fields::extract_table_rows(doc, profile, panel.root)
    } else {
        Vec::new()
    };
    if extracted.is_empty() {
        extracted = fields::extract_key_values(doc, profile, panel.root);
    }
    extracted.extend(fields::extract_leftovers(
        doc,
        profile,
        panel.root,
        panel.heading,
    ));
    if extracted.is_empty() {
        nav_trace!("Panel {:?} has no fields, left as is", panel.title);
        return None;
    }

    let ordered: Vec<&str> = extracted
        .iter()
        .filter(|field| field.ordered)
        .map(|field| field.name.as_str())
        .collect();
    layout.register_fields(&panel.title, &ordered);

    let layout = layout.layout();
    let (wrapper, left, right) =
        panel_skeleton(doc, &panel.title, layout.is_panel_collapsed(&panel.title));

    let rendered: Vec<(RenderedField, bool)> = extracted
        .iter()
        .map(|field| {
            let collapsed = layout.is_field_collapsed(&panel.title, &field.name);
            let unit = render_field(doc, &panel.title, field, collapsed);
            let rendered = RenderedField {
                name: field.name.clone(),
                unit,
            };
            (rendered, field.ordered)
        })
        .collect();

    let columns = layout.field_columns(&panel.title).cloned().unwrap_or_default();
    let show_right = layout.is_dual_column(&panel.title) || !columns.right.is_empty();
    let mut placed = vec![false; rendered.len()];
    place_named(doc, &rendered, &mut placed, &columns.left, left);
    place_named(doc, &rendered, &mut placed, &columns.right, right);
    for (index, (field, _)) in rendered.iter().enumerate() {
        if !placed[index] {
            doc.append_child(left, field.unit);
        }
    }
    if !show_right {
        doc.set_attr(right, "style", COLLAPSED_STYLE);
    }

    doc.insert_before(panel.root, wrapper);
    fields::hide(doc, panel.root);
    Some(rendered.len())
}

fn place_named(
    doc: &mut Document,
    rendered: &[(RenderedField, bool)],
    placed: &mut [bool],
    names: &[String],
    column: NodeId,
) {
    for name in names {
        for (index, (field, ordered)) in rendered.iter().enumerate() {
            if *ordered && !placed[index] && &field.name == name {
                doc.append_child(column, field.unit);
                placed[index] = true;
            }
        }
    }
}

/// Returns the wrapper and its left and right field columns.
fn panel_skeleton(doc: &mut Document, title: &str, collapsed: bool) -> (NodeId, NodeId, NodeId) {
    let wrapper = doc.create_element_with(
        "div",
        &[("class", ENHANCED_PANEL_CLASS), (PANEL_TITLE_ATTR, title)],
    );

    let header = doc.create_element_with("div", &[("class", "nav-panel-header")]);
    let handle = doc.create_element_with("span", &[("class", "nav-panel-drag-handle")]);
    doc.set_text(handle, DRAG_HANDLE);
    let title_node = doc.create_element_with("div", &[("class", "nav-panel-title")]);
    doc.set_text(title_node, title);
    let collapse = doc.create_element_with(
        "button",
        &[("class", PANEL_COLLAPSE_CLASS), (PANEL_TITLE_ATTR, title)],
    );
    doc.set_text(collapse, arrow(collapsed));
    for child in [handle, title_node, collapse] {
        doc.append_child(header, child);
    }

    let content = doc.create_element_with("div", &[("class", "nav-panel-content")]);
    if collapsed {
        doc.set_attr(content, "style", COLLAPSED_STYLE);
    }
    let columns = doc.create_element_with("div", &[("class", "nav-columns")]);
    let left = doc.create_element_with(
        "div",
        &[("class", "nav-column nav-column-left"), ("data-column", "left")],
    );
    let right = doc.create_element_with(
        "div",
        &[("class", "nav-column nav-column-right"), ("data-column", "right")],
    );
    doc.append_child(columns, left);
    doc.append_child(columns, right);
    doc.append_child(content, columns);

    doc.append_child(wrapper, header);
    doc.append_child(wrapper, content);
    (wrapper, left, right)
}

fn arrow(collapsed: bool) -> &'static str {
    if collapsed {
        COLLAPSED_ARROW
    } else {
        EXPANDED_ARROW
    }
}

fn render_field(
    doc: &mut Document,
    panel: &str,
    field: &ExtractedField,
    collapsed: bool,
) -> NodeId {
    let class = format!("nav-field nav-field-{}", field.kind.as_str());
    let unit = doc.create_element_with(
        "div",
        &[
            ("class", class.as_str()),
            (FIELD_NAME_ATTR, field.name.as_str()),
            (PANEL_TITLE_ATTR, panel),
        ],
    );
    match field.kind {
        FieldKind::Compact => {
            let label = doc.create_element_with("span", &[("class", "nav-field-label")]);
            doc.set_text(label, &format!("{}:", field.name));
            doc.append_child(unit, label);
            doc.append_child(unit, field.value);
        }
        FieldKind::Select => {
            let handle = doc.create_element_with("span", &[("class", "nav-field-drag-handle")]);
            doc.set_text(handle, DRAG_HANDLE);
            doc.append_child(unit, handle);
            doc.append_child(unit, field.value);
        }
        FieldKind::Card => {
            let header = doc.create_element_with("div", &[("class", "nav-field-header")]);
            let handle = doc.create_element_with("span", &[("class", "nav-field-drag-handle")]);
            doc.set_text(handle, DRAG_HANDLE);
            let label = doc.create_element_with("span", &[("class", "nav-field-label")]);
            doc.set_text(label, &field.name);
            let collapse = doc.create_element_with(
                "button",
                &[
                    ("class", FIELD_COLLAPSE_CLASS),
                    (PANEL_TITLE_ATTR, panel),
                    (FIELD_NAME_ATTR, field.name.as_str()),
                ],
            );
            doc.set_text(collapse, arrow(collapsed));
            for child in [handle, label, collapse] {
                doc.append_child(header, child);
            }
            if collapsed {
                doc.set_attr(field.value, "style", COLLAPSED_STYLE);
            }
            doc.append_child(unit, header);
            doc.append_child(unit, field.value);
        }
    }
    unit
}

fn order_panels(doc: &mut Document, layout: &Layout, detail: NodeId) {
    if layout.section_order().is_empty() {
        return;
    }
    let panels = enhanced_panels(doc, detail);
    let Some(parent) = panels.first().and_then(|first| doc.parent(*first)) else {
        return;
    };
    let titles: Vec<String> = panels
        .iter()
        .map(|panel| doc.attr(*panel, PANEL_TITLE_ATTR).unwrap_or_default().to_string())
        .collect();
    for index in layout.sort_panels(&titles) {
        doc.append_child(parent, panels[index]);
    }
}
