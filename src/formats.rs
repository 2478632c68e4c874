use serde::{Deserialize, Serialize};

/// One parsed decision page. `text` is already resolved from the candidate
/// full-text columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub process: String,
    pub summary: String,
    pub descriptor: String,
    pub text: String,
}

impl DocumentRecord {
    /// Trims every field and splits off the store key.
    pub fn into_entry(self) -> (String, StoredDocument) {
        let key = self.process.trim().to_owned();
        let doc = StoredDocument {
            summary: self.summary.trim().to_owned(),
            descriptor: self.descriptor.trim().to_owned(),
            text: self.text.trim().to_owned(),
        };
        (key, doc)
    }
}

/// Value side of the persisted store, keyed by process number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub descriptor: String,
    #[serde(default)]
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_entry_trims_key_and_fields() {
        let record = DocumentRecord {
            process: "  123/20.3T8LSB \n".to_owned(),
            summary: "\n S ".to_owned(),
            descriptor: " D\t".to_owned(),
            text: "  T  ".to_owned(),
        };
        let (key, doc) = record.into_entry();
        assert_eq!(key, "123/20.3T8LSB");
        assert_eq!(
            doc,
            StoredDocument {
                summary: "S".to_owned(),
                descriptor: "D".to_owned(),
                text: "T".to_owned(),
            }
        );
    }

    #[test]
    fn stored_document_tolerates_missing_fields() -> anyhow::Result<()> {
        let doc: StoredDocument = serde_json::from_str(r#"{"text":"only"}"#)?;
        assert_eq!(doc.summary, "");
        assert_eq!(doc.descriptor, "");
        assert_eq!(doc.text, "only");
        Ok(())
    }
}
