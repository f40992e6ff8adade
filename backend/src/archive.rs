//! Zip packaging of rendered certificates for bulk download.

use crate::error::ArchiveError;
use log::debug;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Extensions picked up by [`archive_directory`].
const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// An in-memory zip file.
#[derive(Debug, Clone)]
pub struct Archive {
    pub bytes: Vec<u8>,
    pub member_count: usize,
}

/// Packs `(name, contents)` pairs into a zip archive, in the given order.
///
/// PNG data is already compressed, so members are stored rather than deflated.
pub fn build_archive<'a, I>(entries: I) -> Result<Archive, ArchiveError>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let mut member_count = 0;
    for (name, data) in entries {
        zip.start_file(name, options)?;
        zip.write_all(data)?;
        member_count += 1;
    }

    let bytes = zip.finish()?.into_inner();
    debug!("Built archive with {} members ({} bytes)", member_count, bytes.len());
    Ok(Archive {
        bytes,
        member_count,
    })
}

/// Packs every image file directly inside `dir`, sorted by file name.
pub fn archive_directory(dir: &Path) -> Result<Archive, ArchiveError> {
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || !has_image_extension(&path) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            files.push((name.to_string(), fs::read(&path)?));
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));

    build_archive(files.iter().map(|(name, data)| (name.as_str(), data.as_slice())))
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn member_names(archive: &Archive) -> Vec<String> {
        let mut zip = ZipArchive::new(Cursor::new(archive.bytes.clone())).unwrap();
        (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn members_are_named_and_counted() {
        let archive = build_archive(vec![
            ("Jane_Doe_certificate.png", b"one".as_slice()),
            ("certificate_2.png", b"two".as_slice()),
        ])
        .unwrap();

        assert_eq!(archive.member_count, 2);
        assert_eq!(
            member_names(&archive),
            vec!["Jane_Doe_certificate.png", "certificate_2.png"]
        );

        let mut zip = ZipArchive::new(Cursor::new(archive.bytes)).unwrap();
        let mut contents = String::new();
        zip.by_name("certificate_2.png")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "two");
    }

    #[test]
    fn empty_archive_is_valid() {
        let archive = build_archive(Vec::<(&str, &[u8])>::new()).unwrap();
        assert_eq!(archive.member_count, 0);
        assert!(member_names(&archive).is_empty());
    }

    #[test]
    fn directory_archive_only_takes_images() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.png"), b"b").unwrap();
        fs::write(dir.path().join("a.JPG"), b"a").unwrap();
        fs::write(dir.path().join("notes.txt"), b"skip").unwrap();
        fs::create_dir(dir.path().join("nested.png")).unwrap();

        let archive = archive_directory(dir.path()).unwrap();
        assert_eq!(archive.member_count, 2);
        assert_eq!(member_names(&archive), vec!["a.JPG", "b.png"]);
    }
}
