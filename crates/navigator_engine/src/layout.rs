use std::rc::Rc;

use navigator_core::{Column, Layout};
use navigator_logging::{nav_debug, nav_warn};

use crate::store::{KeyValueStore, PersistentStore};

/// The user's layout preferences together with their persistence.
#[derive(Debug)]
pub struct LayoutState<S> {
    layout: Layout,
    store: Rc<PersistentStore<S>>,
}

impl<S: KeyValueStore> LayoutState<S> {
    pub fn load(store: Rc<PersistentStore<S>>) -> Self {
        let layout = store.load_layout();
        Self { layout, store }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Appends unseen field names to the panel's left column and persists them.
    pub fn register_fields<T: AsRef<str>>(&mut self, panel: &str, fields: &[T]) -> bool {
        let changed = self.layout.register_fields(panel, fields);
        if changed {
            nav_debug!("Recorded field order for panel {:?}", panel);
            self.persist();
        }
        changed
    }

    pub fn move_panel<T: AsRef<str>>(&mut self, current: &[T], panel: &str, index: usize) -> bool {
        let changed = self.layout.move_panel(current, panel, index);
        if changed {
            self.persist();
        }
        changed
    }

    pub fn move_field(&mut self, panel: &str, field: &str, column: Column, index: usize) -> bool {
        let changed = self.layout.move_field(panel, field, column, index);
        if changed {
            self.persist();
        }
        changed
    }

    pub fn set_dual_column(&mut self, panel: &str, enabled: bool) -> bool {
        let changed = self.layout.set_dual_column(panel, enabled);
        if changed {
            self.persist();
        }
        changed
    }

    pub fn toggle_panel_collapsed(&mut self, panel: &str) -> bool {
        let collapsed = self.layout.toggle_panel_collapsed(panel);
        self.persist();
        collapsed
    }

    pub fn toggle_field_collapsed(&mut self, panel: &str, field: &str) -> bool {
        let collapsed = self.layout.toggle_field_collapsed(panel, field);
        self.persist();
        collapsed
    }

    fn persist(&self) {
        if let Err(err) = self.store.save_layout(&self.layout) {
            nav_warn!("Failed to persist preferences: {}", err);
        }
    }
}
