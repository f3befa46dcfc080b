//! Archive Packager — one serialized document per recipient in a gzip'd tar.

use std::collections::HashSet;
use std::io;

use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use thiserror::Error;

use crate::document::writer::DocumentWriter;
use crate::document::OutputDocument;
use crate::roster::loader::normalize_key;

pub const ARCHIVE_MIME: &str = "application/gzip";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Duplicate archive entry: {0}")]
    DuplicateEntry(String),

    #[error("Failed to write document for {key}: {source}")]
    Document {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to build archive: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveEntry {
    pub name: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Recipient documents keyed by entry name, in insertion order.
#[derive(Debug, Default)]
pub struct Archive {
    entries: Vec<ArchiveEntry>,
    names: HashSet<String>,
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.bytes.as_slice())
    }

    /// Adds `{key}.{extension}`. Refuses a name already taken, including one
    /// differing only in case.
    pub fn insert(&mut self, key: &str, extension: &str, bytes: Vec<u8>) -> Result<(), ArchiveError> {
        let name = format!("{key}.{extension}");
        if !self.names.insert(normalize_key(&name)) {
            return Err(ArchiveError::DuplicateEntry(name));
        }
        self.entries.push(ArchiveEntry { name, bytes });
        Ok(())
    }

    pub fn add_document(
        &mut self,
        document: &OutputDocument,
        writer: &dyn DocumentWriter,
    ) -> Result<(), ArchiveError> {
        let bytes = writer
            .write(document)
            .map_err(|source| ArchiveError::Document {
                key: document.recipient_key.clone(),
                source,
            })?;
        self.insert(&document.recipient_key, writer.extension(), bytes)
    }

    /// Serializes every entry into a gzip-compressed tar, all stamped with `mtime`.
    pub fn to_tar_gz(&self, mtime: u64) -> Result<Vec<u8>, ArchiveError> {
        let mut tar_bytes = Vec::new();
        {
            let gz = GzEncoder::new(&mut tar_bytes, Compression::default());
            let mut tar = tar::Builder::new(gz);

            for entry in &self.entries {
                let mut header = tar::Header::new_gnu();
                header.set_size(entry.bytes.len() as u64);
                header.set_mode(0o644);
                header.set_mtime(mtime);
                tar.append_data(&mut header, &entry.name, entry.bytes.as_slice())?;
            }

            tar.into_inner()?.finish()?;
        }
        Ok(tar_bytes)
    }
}

/// Packs recipient documents in order, one entry each.
pub fn package(
    documents: &[OutputDocument],
    writer: &dyn DocumentWriter,
) -> Result<Archive, ArchiveError> {
    let mut archive = Archive::new();
    for document in documents {
        archive.add_document(document, writer)?;
    }
    Ok(archive)
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;
    use crate::document::writer::MarkdownWriter;
    use crate::document::{assemble_document, DocumentKind};

    fn unpack(bytes: &[u8]) -> Vec<(String, String)> {
        let gz = flate2::read::GzDecoder::new(bytes);
        let mut archive = tar::Archive::new(gz);
        archive
            .entries()
            .unwrap()
            .map(|entry| {
                let mut entry = entry.unwrap();
                let name = entry.path().unwrap().to_string_lossy().to_string();
                let mut body = String::new();
                entry.read_to_string(&mut body).unwrap();
                (name, body)
            })
            .collect()
    }

    #[test]
    fn test_package_one_entry_per_document_in_order() {
        let documents = vec![
            assemble_document("b@y.com", DocumentKind::Exam, vec![]),
            assemble_document("a@x.com", DocumentKind::Exam, vec![]),
        ];
        let archive = package(&documents, &MarkdownWriter).unwrap();
        let names: Vec<&str> = archive.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b@y.com.md", "a@x.com.md"]);
        assert!(archive.get("a@x.com.md").is_some());
    }

    #[test]
    fn test_duplicate_entry_is_rejected() {
        let mut archive = Archive::new();
        archive.insert("a@x.com", "md", b"one".to_vec()).unwrap();
        let err = archive.insert("A@X.com", "md", b"two".to_vec()).unwrap_err();
        assert!(matches!(err, ArchiveError::DuplicateEntry(name) if name == "A@X.com.md"));
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.get("a@x.com.md"), Some(&b"one"[..]));
    }

    #[test]
    fn test_tar_gz_round_trips_entries() {
        let mut archive = Archive::new();
        archive.insert("a@x.com", "md", b"# A\n".to_vec()).unwrap();
        archive.insert("b@y.com", "md", b"# B\n".to_vec()).unwrap();

        let bytes = archive.to_tar_gz(1_700_000_000).unwrap();
        let entries = unpack(&bytes);
        assert_eq!(
            entries,
            vec![
                ("a@x.com.md".to_string(), "# A\n".to_string()),
                ("b@y.com.md".to_string(), "# B\n".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_archive_is_still_a_valid_container() {
        let bytes = Archive::new().to_tar_gz(0).unwrap();
        assert!(unpack(&bytes).is_empty());
    }
}
