//! File Records
//!
//! Uploaded binaries live in external storage; the server only keeps
//! metadata and hands out a generated, extension-preserving filename.

use std::path::Path;

use uuid::Uuid;

use super::entity::Entity;
use super::ids::IdTag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: i64,
    /// Server-generated storage name
    pub filename: String,
    pub original_name: String,
    pub content_type: String,
    pub size: i64,
    pub owner_id: i64,
}

impl Entity for FileRecord {
    const TAG: IdTag = IdTag::File;

    fn id(&self) -> i64 {
        self.id
    }
}

pub struct FileNamer;

impl FileNamer {
    /// Fresh random token with the original extension appended.
    /// `report.pdf` -> `<token>.pdf`, `README` -> `<token>`.
    pub fn generate(original_name: &str) -> String {
        let token = Uuid::new_v4().simple().to_string();
        match Self::extension(original_name) {
            Some(ext) => format!("{}.{}", token, ext),
            None => token,
        }
    }

    fn extension(original_name: &str) -> Option<&str> {
        Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
    }

    /// Content type from the original name, octet-stream when unknown
    pub fn guess_content_type(original_name: &str) -> String {
        mime_guess::from_path(original_name)
            .first_or_octet_stream()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_preserved() {
        for (name, ext) in [("a.pdf", ".pdf"), ("photo.final.JPG", ".JPG"), ("archive.tar.gz", ".gz")] {
            let generated = FileNamer::generate(name);
            assert!(generated.ends_with(ext), "{} -> {}", name, generated);
            assert!(generated.len() > ext.len());
        }
    }

    #[test]
    fn test_no_extension() {
        let generated = FileNamer::generate("README");
        assert!(!generated.contains('.'));
        let dotfile = FileNamer::generate(".env");
        assert!(!dotfile.contains('.'));
    }

    #[test]
    fn test_names_are_unique() {
        assert_ne!(FileNamer::generate("a.pdf"), FileNamer::generate("a.pdf"));
    }

    #[test]
    fn test_content_type_guess() {
        assert_eq!(FileNamer::guess_content_type("a.pdf"), "application/pdf");
        assert_eq!(FileNamer::guess_content_type("blob"), "application/octet-stream");
    }
}
