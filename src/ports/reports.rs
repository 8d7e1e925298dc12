use crate::domain::{Contact, OwnerId, Transaction};

/// Optional document rendering of a contact's history (a PDF statement in a
/// full deployment). Output is best effort and never blocks the reply.
pub trait ReportGenerator: Send + Sync {
    /// File name used when the rendered bytes are sent.
    fn file_name(&self, contact: &Contact) -> String {
        format!("history-{}.pdf", contact.id)
    }

    fn render_history(
        &self,
        owner: OwnerId,
        contact: &Contact,
        history: &[Transaction],
    ) -> Option<Vec<u8>>;
}

/// Generator that never produces a document.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoReports;

impl ReportGenerator for NoReports {
    fn render_history(&self, _: OwnerId, _: &Contact, _: &[Transaction]) -> Option<Vec<u8>> {
        None
    }
}
