use std::sync::Arc;

use shared::protocol::PDF_MIME;

/// A document the user picked, kept in memory until the index is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedDocument {
    name: String,
    content_type: String,
    bytes: Arc<[u8]>,
}

impl StagedDocument {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn pdf(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::new(name, PDF_MIME, bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_pdf(&self) -> bool {
        let essence = self
            .content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        essence.eq_ignore_ascii_case(PDF_MIME)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Added,
    /// A document with the same name is already staged; the new one was dropped.
    Duplicate,
}

/// Staged documents, unique by file name, in the order they were added.
#[derive(Debug, Clone, Default)]
pub struct UploadSet {
    documents: Vec<StagedDocument>,
}

impl UploadSet {
    pub fn insert(&mut self, document: StagedDocument) -> StageOutcome {
        if self.contains(document.name()) {
            return StageOutcome::Duplicate;
        }
        self.documents.push(document);
        StageOutcome::Added
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.documents.len();
        self.documents.retain(|document| document.name() != name);
        self.documents.len() != before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.documents.iter().any(|document| document.name() == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.documents
            .iter()
            .map(|document| document.name().to_string())
            .collect()
    }

    pub fn documents(&self) -> &[StagedDocument] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn clear(&mut self) {
        self.documents.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_names_are_ignored() {
        let mut uploads = UploadSet::default();
        assert_eq!(
            uploads.insert(StagedDocument::pdf("a.pdf", b"one".to_vec())),
            StageOutcome::Added
        );
        assert_eq!(
            uploads.insert(StagedDocument::pdf("a.pdf", b"two".to_vec())),
            StageOutcome::Duplicate
        );
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads.documents()[0].bytes(), b"one");
    }

    #[test]
    fn remove_by_name() {
        let mut uploads = UploadSet::default();
        uploads.insert(StagedDocument::pdf("a.pdf", Vec::new()));
        uploads.insert(StagedDocument::pdf("b.pdf", Vec::new()));
        assert!(uploads.remove("a.pdf"));
        assert!(!uploads.remove("a.pdf"));
        assert_eq!(uploads.names(), vec!["b.pdf".to_string()]);
    }

    #[test]
    fn pdf_detection_uses_mime_essence() {
        assert!(StagedDocument::new("a.pdf", "application/pdf", Vec::new()).is_pdf());
        assert!(StagedDocument::new("a.pdf", "Application/PDF; charset=binary", Vec::new()).is_pdf());
        assert!(!StagedDocument::new("a.txt", "text/plain", Vec::new()).is_pdf());
        assert!(!StagedDocument::new("a.pdf", "", Vec::new()).is_pdf());
    }
}
