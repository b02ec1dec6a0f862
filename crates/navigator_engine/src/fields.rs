//! Extraction of labelled fields from a raw host panel.
//!
//! Every original element a field is taken from is hidden with [`hide`], never
//! removed, so [`restore`] can put the host rendering back exactly.
use navigator_logging::nav_debug;

use crate::config::CompiledProfile;
use crate::dom::{Document, NodeId};

pub const HIDDEN_ATTR: &str = "data-nav-hidden";
const PREV_STYLE_ATTR: &str = "data-nav-prev-style";
const HIDDEN_STYLE: &str = "display: none";
const SIMPLE_FIELD_MAX_CHARS: usize = 100;
const LEFTOVER_MIN_CHARS: usize = 5;

/// How a field unit is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Short single-line value shown as `label: value`.
    Compact,
    /// Value holding a selection control, shown without a card.
    Select,
    /// Anything longer, shown as a collapsible card.
    Card,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Compact => "compact",
            FieldKind::Select => "select",
            FieldKind::Card => "card",
        }
    }
}

/// One label/value pair taken out of the host panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedField {
    pub name: String,
    /// Detached `div` holding copies of the value content.
    pub value: NodeId,
    pub kind: FieldKind,
    /// Whether the field takes part in the stored field order.
    pub ordered: bool,
}

pub fn is_hidden(doc: &Document, node: NodeId) -> bool {
    doc.attr(node, HIDDEN_ATTR).is_some()
}

pub fn hide(doc: &mut Document, node: NodeId) {
    if is_hidden(doc, node) {
        return;
    }
    if let Some(previous) = doc.attr(node, "style").map(str::to_string) {
        doc.set_attr(node, PREV_STYLE_ATTR, &previous);
    }
    doc.set_attr(node, "style", HIDDEN_STYLE);
    doc.set_attr(node, HIDDEN_ATTR, "true");
}

pub fn restore(doc: &mut Document, node: NodeId) {
    if doc.remove_attr(node, HIDDEN_ATTR).is_none() {
        return;
    }
    match doc.remove_attr(node, PREV_STYLE_ATTR) {
        Some(previous) => doc.set_attr(node, "style", &previous),
        None => {
            doc.remove_attr(node, "style");
        }
    }
}

fn within_hidden(doc: &Document, node: NodeId, scope: NodeId) -> bool {
    if is_hidden(doc, node) {
        return true;
    }
    doc.ancestor_elements(node)
        .into_iter()
        .take_while(|ancestor| *ancestor != scope)
        .any(|ancestor| is_hidden(doc, ancestor))
}

fn has_hidden_descendant(doc: &Document, node: NodeId) -> bool {
    doc.descendant_elements(node)
        .into_iter()
        .any(|descendant| is_hidden(doc, descendant))
}

fn classify(doc: &Document, value: NodeId) -> FieldKind {
    let descendants = doc.descendant_elements(value);
    if descendants.iter().any(|d| doc.tag(*d) == Some("select")) {
        return FieldKind::Select;
    }
    let text = doc.text_content(value);
    let text = text.trim();
    let structured = descendants
        .iter()
        .any(|d| matches!(doc.tag(*d), Some("ul" | "ol" | "table" | "br")));
    if !text.is_empty()
        && text.chars().count() < SIMPLE_FIELD_MAX_CHARS
        && !text.contains('\n')
        && !structured
    {
        FieldKind::Compact
    } else {
        FieldKind::Card
    }
}

fn value_container(doc: &mut Document) -> NodeId {
    doc.create_element_with("div", &[("class", "nav-field-value")])
}

fn append_clone(doc: &mut Document, target: NodeId, source: NodeId) {
    if let Some(copy) = doc.clone_subtree(source) {
        doc.append_child(target, copy);
    }
}

fn holds_key_value_list(doc: &Document, profile: &CompiledProfile, node: NodeId) -> bool {
    profile.key_value_list.matches(doc, node)
        || profile.key_value_list.select_first(doc, node).is_some()
}

fn field(doc: &Document, name: String, value: NodeId, ordered: bool) -> ExtractedField {
    ExtractedField {
        kind: classify(doc, value),
        name,
        value,
        ordered,
    }
}

/// Key/value fields of a regular panel, address parts folded into one
/// location field placed first.
pub fn extract_key_values(
    doc: &mut Document,
    profile: &CompiledProfile,
    panel: NodeId,
) -> Vec<ExtractedField> {
    let labels = &profile.source.address;
    let mut address: Vec<(String, String, NodeId)> = Vec::new();
    let mut regular: Vec<(String, NodeId, NodeId, NodeId)> = Vec::new();

    for list in profile.key_value_list.select(doc, panel) {
        if within_hidden(doc, list, panel) {
            continue;
        }
        let Some(parent) = doc.parent(list).filter(|p| doc.is_element(*p)) else {
            continue;
        };
        let Some(label) = profile.field_label.select_first(doc, list) else {
            nav_debug!("Key/value list without a label");
            continue;
        };
        let label_text = doc.text_content(label).trim().replacen(':', "", 1);
        if label_text.is_empty() {
            continue;
        }
        if labels.contains(&label_text) {
            if let Some(value) = profile.field_value.select_first(doc, list) {
                let text = doc.text_content(value).trim().to_string();
                address.push((label_text, text, parent));
            }
        } else {
            regular.push((label_text, list, label, parent));
        }
    }

    let mut fields = Vec::new();
    if !address.is_empty() {
        let part = |label: &str| {
            address
                .iter()
                .find(|(name, _, _)| name == label)
                .map(|(_, text, _)| text.clone())
        };
        let mut lines = Vec::new();
        lines.extend(part(&labels.line_one));
        lines.extend(part(&labels.line_two));
        let city_line: Vec<String> = part(&labels.city)
            .into_iter()
            .chain(part(&labels.province))
            .collect();
        if !city_line.is_empty() {
            lines.push(city_line.join(", "));
        }
        lines.extend(part(&labels.country));

        let value = value_container(doc);
        for line in lines {
            let line_node = doc.create_element_with("div", &[("class", "nav-address-line")]);
            doc.set_text(line_node, &line);
            doc.append_child(value, line_node);
        }
        for (_, _, parent) in &address {
            hide(doc, *parent);
        }
        let name = profile.source.location_field.clone();
        fields.push(field(doc, name, value, true));
    }

    for (name, list, label, parent) in regular {
        let value = value_container(doc);
        for child in doc.children(list) {
            if child != label {
                append_clone(doc, value, child);
            }
        }
        // Trailing siblings belong to this value up to the next pair.
        let mut sibling = doc.next_element_sibling(list);
        while let Some(next) = sibling {
            if holds_key_value_list(doc, profile, next) {
                break;
            }
            append_clone(doc, value, next);
            hide(doc, next);
            sibling = doc.next_element_sibling(next);
        }
        hide(doc, parent);
        fields.push(field(doc, name, value, true));
    }
    fields
}

/// Fields of a panel rendered as a two-column table (label cell, content cell).
pub fn extract_table_rows(
    doc: &mut Document,
    profile: &CompiledProfile,
    panel: NodeId,
) -> Vec<ExtractedField> {
    let Some(table) = profile.table.select_first(doc, panel) else {
        return Vec::new();
    };
    let mut fields = Vec::new();
    for row in profile.row.select(doc, table) {
        let cells: Vec<NodeId> = doc
            .element_children(row)
            .into_iter()
            .filter(|cell| doc.tag(*cell) == Some("td"))
            .collect();
        let [label_cell, content_cell, ..] = cells[..] else {
            continue;
        };
        let name = doc.text_content(label_cell).trim().to_string();
        if name.is_empty() {
            continue;
        }
        let value = value_container(doc);
        for child in doc.children(content_cell) {
            append_clone(doc, value, child);
        }
        hide(doc, row);
        fields.push(field(doc, name, value, true));
    }
    if !fields.is_empty() {
        hide(doc, table);
    }
    fields
}

/// Remaining `div`/`p` content with more than a few characters of text, so
/// nothing the host rendered is silently dropped.
pub fn extract_leftovers(
    doc: &mut Document,
    profile: &CompiledProfile,
    panel: NodeId,
    heading: NodeId,
) -> Vec<ExtractedField> {
    let mut found = Vec::new();
    collect_leftovers(doc, profile, panel, heading, &mut found);
    let name = profile.source.additional_content_field.clone();
    found
        .into_iter()
        .map(|element| {
            let value = value_container(doc);
            append_clone(doc, value, element);
            hide(doc, element);
            field(doc, name.clone(), value, false)
        })
        .collect()
}

fn collect_leftovers(
    doc: &Document,
    profile: &CompiledProfile,
    node: NodeId,
    heading: NodeId,
    found: &mut Vec<NodeId>,
) {
    for child in doc.element_children(node) {
        if is_hidden(doc, child)
            || doc.contains(child, heading)
            || profile.key_value_list.matches(doc, child)
        {
            if child != heading && !is_hidden(doc, child) && doc.contains(child, heading) {
                collect_leftovers(doc, profile, child, heading, found);
            }
            continue;
        }
        if has_hidden_descendant(doc, child) {
            collect_leftovers(doc, profile, child, heading, found);
            continue;
        }
        let candidate = matches!(doc.tag(child), Some("div" | "p"));
        let text = doc.text_content(child);
        if candidate && text.trim().chars().count() > LEFTOVER_MIN_CHARS {
            found.push(child);
        } else if !candidate {
            collect_leftovers(doc, profile, child, heading, found);
        }
    }
}
