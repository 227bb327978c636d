//! Output types produced by the PDFium converter.

use serde::{Deserialize, Serialize};

/// Result of converting one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Assembled, cleaned Markdown.
    pub markdown: String,
    /// Document information dictionary and page count.
    pub metadata: DocumentMetadata,
    /// Pages whose text layer was empty (typically scanned images).
    pub empty_pages: Vec<usize>,
}

/// Metadata read from the PDF information dictionary.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

impl DocumentMetadata {
    /// Format as YAML front matter, terminated by a blank line.
    pub fn to_front_matter(&self) -> String {
        let mut yaml = String::from("---\n");

        let fields = [
            ("title", &self.title),
            ("author", &self.author),
            ("subject", &self.subject),
            ("creator", &self.creator),
            ("producer", &self.producer),
        ];
        for (key, value) in fields {
            if let Some(v) = value {
                yaml.push_str(&format!("{key}: \"{}\"\n", v.replace('"', "\\\"")));
            }
        }
        yaml.push_str(&format!("pages: {}\n", self.page_count));
        if !self.pdf_version.is_empty() {
            yaml.push_str(&format!("pdf_version: \"{}\"\n", self.pdf_version));
        }

        yaml.push_str("---\n\n");
        yaml
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn front_matter_skips_missing_fields_and_escapes_quotes() {
        let meta = DocumentMetadata {
            title: Some("The \"Annual\" Report".into()),
            author: None,
            page_count: 4,
            pdf_version: "Pdf1_7".into(),
            ..Default::default()
        };
        let yaml = meta.to_front_matter();
        assert!(yaml.starts_with("---\n"));
        assert!(yaml.contains("title: \"The \\\"Annual\\\" Report\"\n"));
        assert!(!yaml.contains("author:"));
        assert!(yaml.contains("pages: 4\n"));
        assert!(yaml.ends_with("---\n\n"));
    }
}
