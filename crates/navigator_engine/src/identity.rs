//! Maps host table rows to stable job ids.
use navigator_core::JobId;
use navigator_logging::nav_trace;

use crate::config::CompiledProfile;
use crate::dom::{Document, NodeId};
use crate::error::NavigatorError;
use crate::navigation::JobRow;

/// Resolves job ids with an ordered fallback chain, stopping at the first hit:
/// the row's selection checkbox value, a leaf of the id cell holding exactly
/// one id token, then any standalone id token in the row text.
#[derive(Debug, Clone, Copy)]
pub struct JobIdentityResolver<'a> {
    profile: &'a CompiledProfile,
}

impl<'a> JobIdentityResolver<'a> {
    pub fn new(profile: &'a CompiledProfile) -> Self {
        Self { profile }
    }

    pub fn resolve(&self, doc: &Document, row: NodeId) -> Result<JobId, NavigatorError> {
        self.from_checkbox(doc, row)
            .or_else(|| self.from_id_cell(doc, row))
            .or_else(|| self.from_row_text(doc, row))
            .ok_or(NavigatorError::IdentityNotFound)
    }

    /// The job of the open detail view: the id remembered when it was opened,
    /// otherwise the row at the navigation cursor.
    pub fn resolve_current(
        &self,
        doc: &Document,
        remembered: Option<&JobId>,
        rows: &[JobRow],
        cursor: Option<usize>,
    ) -> Result<JobId, NavigatorError> {
        if let Some(job) = remembered {
            return Ok(job.clone());
        }
        let row = cursor
            .and_then(|index| rows.get(index))
            .ok_or(NavigatorError::IdentityNotFound)?;
        self.resolve(doc, row.row)
    }

    fn from_checkbox(&self, doc: &Document, row: NodeId) -> Option<JobId> {
        let checkbox = self.profile.selection_checkbox.select_first(doc, row)?;
        let value = doc.attr(checkbox, "value")?;
        let job = JobId::parse(value);
        if job.is_none() {
            nav_trace!("Ignoring non-numeric checkbox value {:?}", value);
        }
        job
    }

    fn from_id_cell(&self, doc: &Document, row: NodeId) -> Option<JobId> {
        let cell = self.profile.id_cell.select_first(doc, row)?;
        self.profile
            .id_leaf
            .select(doc, cell)
            .into_iter()
            .find_map(|leaf| {
                let text = doc.text_content(leaf);
                let text = text.trim();
                self.profile
                    .job_id_pattern
                    .find(text)
                    .filter(|found| found.as_str() == text)
                    .and_then(|found| JobId::parse(found.as_str()))
            })
    }

    fn from_row_text(&self, doc: &Document, row: NodeId) -> Option<JobId> {
        let text = doc.text_content(row);
        let found = self.profile.job_id_pattern.find(&text)?;
        JobId::parse(found.as_str())
    }
}

#[cfg(test)]
mod tests {
    use navigator_core::JobId;

    use super::JobIdentityResolver;
    use crate::config::{CompiledProfile, HostProfile};
    use crate::dom::Document;
    use crate::error::NavigatorError;

    fn resolve(html: &str) -> Result<JobId, NavigatorError> {
        let profile = CompiledProfile::compile(&HostProfile::default()).expect("profile");
        let doc = Document::parse(html);
        let row = profile.row.select_first(&doc, doc.root()).expect("row");
        JobIdentityResolver::new(&profile).resolve(&doc, row)
    }

    #[test]
    fn checkbox_value_wins_over_row_text() {
        let job = resolve(
            r#"<table><tbody><tr>
                <td><input type="checkbox" name="dataViewerSelection" value="500123"></td>
                <th><span>999999</span></th>
                <td><a href="javascript:void(0)">Analyst</a></td>
            </tr></tbody></table>"#,
        );
        assert_eq!(job.ok(), JobId::parse("500123"));
    }

    #[test]
    fn id_cell_leaf_must_be_exactly_one_token() {
        let job = resolve(
            r#"<table><tbody><tr>
                <th><span>Ref 111111 b</span><span> 222222 </span></th>
                <td>Posted 333333</td>
            </tr></tbody></table>"#,
        );
        assert_eq!(job.ok(), JobId::parse("222222"));
    }

    #[test]
    fn falls_back_to_first_token_in_row_text() {
        let job = resolve(
            "<table><tbody><tr><td>Intern 1234567</td><td>#444555 then 666777</td></tr></tbody></table>",
        );
        assert_eq!(job.ok(), JobId::parse("444555"));
    }

    #[test]
    fn reports_missing_identity() {
        let job = resolve("<table><tbody><tr><td>No id here 12345</td></tr></tbody></table>");
        assert!(matches!(job, Err(NavigatorError::IdentityNotFound)));
    }
}
