use serde::{Deserialize, Serialize};

use super::ExtractError;

/// Supported input file kinds for text recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    Pdf,
    Image,
    Docx,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Image => "image",
            FileKind::Docx => "docx",
        }
    }

    /// Determine the kind from a filename extension. Anything outside the
    /// supported set is an error, not a silent passthrough.
    pub fn from_filename(filename: &str) -> Result<Self, ExtractError> {
        let ext = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(FileKind::Pdf),
            "png" | "jpg" | "jpeg" => Ok(FileKind::Image),
            "docx" => Ok(FileKind::Docx),
            _ => Err(ExtractError::UnsupportedKind(filename.to_string())),
        }
    }
}

/// Scalar fields and parties as answered by the model, before any date
/// parsing or role normalization. All-null is the defined fallback for
/// malformed model output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub total_amount: Option<f64>,
    pub subject_matter: Option<String>,
    pub sign_date: Option<String>,
    pub effective_date: Option<String>,
    pub expire_date: Option<String>,
    #[serde(default)]
    pub parties: Vec<ExtractedParty>,
}

/// One party as answered by the model. `party_type` is the model's own
/// free-text role label; normalization happens in the extraction stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedParty {
    pub party_type: Option<String>,
    pub party_name: Option<String>,
    pub tax_number: Option<String>,
    pub legal_representative: Option<String>,
    pub address: Option<String>,
}

/// Capability output: fields plus the model identifier for the audit trail.
#[derive(Debug, Clone)]
pub struct FieldExtraction {
    pub fields: ExtractedFields,
    pub model_version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_filename() {
        assert_eq!(FileKind::from_filename("scan.PDF").unwrap(), FileKind::Pdf);
        assert_eq!(FileKind::from_filename("page.jpeg").unwrap(), FileKind::Image);
        assert_eq!(FileKind::from_filename("annex.docx").unwrap(), FileKind::Docx);
        assert!(FileKind::from_filename("notes.xlsx").is_err());
        assert!(FileKind::from_filename("no_extension").is_err());
    }

    #[test]
    fn default_fields_are_all_null() {
        let fields = ExtractedFields::default();
        assert!(fields.total_amount.is_none());
        assert!(fields.subject_matter.is_none());
        assert!(fields.sign_date.is_none());
        assert!(fields.parties.is_empty());
    }
}
