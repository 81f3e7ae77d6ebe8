use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Unique, caller-assigned document identifier
pub type DocumentId = u64;

/// Opaque per-document ranking fields.
///
/// The engine never looks inside; scoring criteria downcast to the concrete
/// type they expect and treat anything else as "not scored".
pub type Fields = Arc<dyn Any + Send + Sync>;

/// Payload of an `index_document` call
#[derive(Clone, Default)]
pub struct DocumentIndexData {
    /// Free text, segmented into tokens at index time
    pub content: String,
    /// Keywords indexed verbatim, without segmentation or positions
    pub labels: Vec<String>,
    /// Ranking fields handed back to the scoring criteria
    pub fields: Option<Fields>,
}

impl DocumentIndexData {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            labels: Vec::new(),
            fields: None,
        }
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_fields<T: Any + Send + Sync>(mut self, fields: T) -> Self {
        self.fields = Some(Arc::new(fields));
        self
    }

    /// Attach fields that are already type-erased
    pub fn with_shared_fields(mut self, fields: Fields) -> Self {
        self.fields = Some(fields);
        self
    }
}

impl fmt::Debug for DocumentIndexData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentIndexData")
            .field("content", &self.content)
            .field("labels", &self.labels)
            .field("fields", &self.fields.as_ref().map(|_| "<opaque>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Popularity(u32);

    #[test]
    fn test_document_builder() {
        let data = DocumentIndexData::new("hello world")
            .with_labels(["news", "tech"])
            .with_fields(Popularity(7));

        assert_eq!(data.content, "hello world");
        assert_eq!(data.labels, vec!["news".to_string(), "tech".to_string()]);
        let fields = data.fields.as_ref().unwrap();
        assert_eq!(fields.downcast_ref::<Popularity>(), Some(&Popularity(7)));
        assert!(fields.downcast_ref::<String>().is_none());
    }

    #[test]
    fn test_debug_hides_fields() {
        let data = DocumentIndexData::new("x").with_fields(Popularity(1));
        let rendered = format!("{:?}", data);
        assert!(rendered.contains("<opaque>"));
        assert!(!rendered.contains("Popularity"));
    }
}
