/// Status line shown while a detail view is open.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusView {
    /// One-based position and total row count.
    pub position: Option<(usize, usize)>,
}

impl StatusView {
    pub fn label(&self) -> Option<String> {
        self.position.map(|(index, total)| {
            format!("Job {index}/{total} | \u{2190} \u{2192} Navigate | \u{2191} Shortlist")
        })
    }
}
