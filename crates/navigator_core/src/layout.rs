use std::collections::{BTreeMap, BTreeSet};

/// Which of a panel's two field columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Left,
    Right,
}

/// Two-column field order of one panel. A field name lives in at most one column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldColumns {
    pub left: Vec<String>,
    pub right: Vec<String>,
}

impl FieldColumns {
    /// Builds columns from possibly untrusted lists: duplicates are dropped and
    /// a name present in both columns stays on the left.
    pub fn sanitized(left: Vec<String>, right: Vec<String>) -> Self {
        let mut seen = BTreeSet::new();
        let left = left
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .collect();
        let right = right
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .collect();
        Self { left, right }
    }

    pub fn column_of(&self, field: &str) -> Option<Column> {
        if self.left.iter().any(|name| name == field) {
            Some(Column::Left)
        } else if self.right.iter().any(|name| name == field) {
            Some(Column::Right)
        } else {
            None
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.column_of(field).is_some()
    }

    fn remove(&mut self, field: &str) {
        self.left.retain(|name| name != field);
        self.right.retain(|name| name != field);
    }

    fn column_mut(&mut self, column: Column) -> &mut Vec<String> {
        match column {
            Column::Left => &mut self.left,
            Column::Right => &mut self.right,
        }
    }
}

/// Read-only view of everything stored for one panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelLayout<'a> {
    pub collapsed: bool,
    pub dual_column_enabled: bool,
    pub field_order: Option<&'a FieldColumns>,
}

/// Composite key of [`Layout`]'s field collapse flags.
pub fn field_collapse_key(panel: &str, field: &str) -> String {
    format!("{panel}_{field}")
}

/// Flat form of [`Layout`], matching the persisted preferences record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LayoutParts {
    pub section_order: Vec<String>,
    pub collapsed_sections: BTreeMap<String, bool>,
    pub field_order: BTreeMap<String, FieldColumns>,
    pub collapsed_fields: BTreeMap<String, bool>,
    pub dual_column_enabled: BTreeMap<String, bool>,
}

/// User-editable layout of the detail view, keyed by panel and field names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Layout {
    section_order: Vec<String>,
    collapsed_sections: BTreeSet<String>,
    field_order: BTreeMap<String, FieldColumns>,
    collapsed_fields: BTreeSet<String>,
    dual_column: BTreeMap<String, bool>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(parts: LayoutParts) -> Self {
        let mut seen = BTreeSet::new();
        let section_order = parts
            .section_order
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .collect();
        let field_order = parts
            .field_order
            .into_iter()
            .map(|(panel, columns)| (panel, FieldColumns::sanitized(columns.left, columns.right)))
            .collect();
        Self {
            section_order,
            collapsed_sections: truthy_keys(parts.collapsed_sections),
            field_order,
            collapsed_fields: truthy_keys(parts.collapsed_fields),
            dual_column: parts.dual_column_enabled,
        }
    }

    pub fn to_parts(&self) -> LayoutParts {
        LayoutParts {
            section_order: self.section_order.clone(),
            collapsed_sections: self
                .collapsed_sections
                .iter()
                .map(|name| (name.clone(), true))
                .collect(),
            field_order: self.field_order.clone(),
            collapsed_fields: self
                .collapsed_fields
                .iter()
                .map(|key| (key.clone(), true))
                .collect(),
            dual_column_enabled: self.dual_column.clone(),
        }
    }

    pub fn panel(&self, name: &str) -> PanelLayout<'_> {
        PanelLayout {
            collapsed: self.collapsed_sections.contains(name),
            dual_column_enabled: self.is_dual_column(name),
            field_order: self.field_order.get(name),
        }
    }

    pub fn section_order(&self) -> &[String] {
        &self.section_order
    }

    /// Returns the indices of `panels` sorted by section order.
    ///
    /// Listed panels come first by list index; the rest keep their relative order.
    pub fn sort_panels<S: AsRef<str>>(&self, panels: &[S]) -> Vec<usize> {
        let rank = |name: &str| {
            self.section_order
                .iter()
                .position(|listed| listed == name)
                .unwrap_or(usize::MAX)
        };
        let mut indices: Vec<usize> = (0..panels.len()).collect();
        indices.sort_by_key(|&index| rank(panels[index].as_ref()));
        indices
    }

    /// Moves `panel` to `index` within `current` (the on-screen order) and
    /// stores the result as the section order.
    pub fn move_panel<S: AsRef<str>>(&mut self, current: &[S], panel: &str, index: usize) -> bool {
        let mut order: Vec<String> = current.iter().map(|name| name.as_ref().to_string()).collect();
        order.retain(|name| name != panel);
        let index = index.min(order.len());
        order.insert(index, panel.to_string());
        if order == self.section_order {
            return false;
        }
        self.section_order = order;
        true
    }

    pub fn is_panel_collapsed(&self, panel: &str) -> bool {
        self.collapsed_sections.contains(panel)
    }

    /// Flips the panel collapse flag and returns the new value.
    pub fn toggle_panel_collapsed(&mut self, panel: &str) -> bool {
        if self.collapsed_sections.remove(panel) {
            false
        } else {
            self.collapsed_sections.insert(panel.to_string());
            true
        }
    }

    pub fn is_dual_column(&self, panel: &str) -> bool {
        self.dual_column.get(panel).copied().unwrap_or(false)
    }

    pub fn set_dual_column(&mut self, panel: &str, enabled: bool) -> bool {
        let previous = self.dual_column.insert(panel.to_string(), enabled);
        previous != Some(enabled)
    }

    pub fn field_columns(&self, panel: &str) -> Option<&FieldColumns> {
        self.field_order.get(panel)
    }

    /// Records fields met in the DOM. Unknown names are appended to the left
    /// column in encounter order; returns whether the stored order changed.
    pub fn register_fields<S: AsRef<str>>(&mut self, panel: &str, fields: &[S]) -> bool {
        let columns = self.field_order.entry(panel.to_string()).or_default();
        let mut changed = false;
        for field in fields {
            let field = field.as_ref();
            if !columns.contains(field) {
                columns.left.push(field.to_string());
                changed = true;
            }
        }
        changed
    }

    /// Moves a field to `index` of `column`, removing it from wherever it was.
    ///
    /// Moving into the right column enables the panel's dual-column layout.
    pub fn move_field(&mut self, panel: &str, field: &str, column: Column, index: usize) -> bool {
        let columns = self.field_order.entry(panel.to_string()).or_default();
        let before = columns.clone();
        columns.remove(field);
        let target = columns.column_mut(column);
        let index = index.min(target.len());
        target.insert(index, field.to_string());
        let mut changed = *columns != before;
        if column == Column::Right {
            changed |= self.set_dual_column(panel, true);
        }
        changed
    }

    pub fn is_field_collapsed(&self, panel: &str, field: &str) -> bool {
        self.collapsed_fields
            .contains(&field_collapse_key(panel, field))
    }

    /// Flips a field collapse flag and returns the new value.
    pub fn toggle_field_collapsed(&mut self, panel: &str, field: &str) -> bool {
        let key = field_collapse_key(panel, field);
        if self.collapsed_fields.remove(&key) {
            false
        } else {
            self.collapsed_fields.insert(key);
            true
        }
    }
}

fn truthy_keys(map: BTreeMap<String, bool>) -> BTreeSet<String> {
    map.into_iter()
        .filter_map(|(key, flag)| flag.then_some(key))
        .collect()
}
