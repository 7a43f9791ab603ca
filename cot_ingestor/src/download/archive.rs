use std::io::{Cursor, Read};

use snafu::ResultExt;
use tracing::debug;
use zip::ZipArchive;

use crate::download::{ArchiveReadSnafu, ArchiveSnafu, DownloadError, NoTabularMemberSnafu};

const TABULAR_EXTENSIONS: [&str; 2] = [".txt", ".csv"];

/// Returns the first `.txt`/`.csv` member of a zip payload as text.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected.
pub fn extract_tabular_member(bytes: &[u8]) -> Result<String, DownloadError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).context(ArchiveSnafu)?;

    let mut names = Vec::with_capacity(archive.len());
    for idx in 0..archive.len() {
        let file = archive.by_index(idx).context(ArchiveSnafu)?;
        names.push(file.name().to_string());
    }
    let member = names.iter().position(|name| {
        let lower = name.to_ascii_lowercase();
        TABULAR_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
    });
    let Some(idx) = member else {
        return NoTabularMemberSnafu { members: names }.fail();
    };
    let name = names[idx].clone();

    let mut file = archive.by_index(idx).context(ArchiveSnafu)?;
    let mut buf = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
    file.read_to_end(&mut buf)
        .context(ArchiveReadSnafu { name: name.clone() })?;
    let text = String::from_utf8_lossy(&buf).into_owned();
    debug!(member = %name, chars = text.len(), "extracted archive member");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::{SimpleFileOptions, ZipWriter};

    fn zip_with(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in members {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(body).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn picks_first_tabular_member() {
        let bytes = zip_with(&[("readme.pdf", b"%PDF"), ("annual.TXT", b"a,b\n1,2\n"), ("x.csv", b"z")]);
        assert_eq!(extract_tabular_member(&bytes).unwrap(), "a,b\n1,2\n");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let bytes = zip_with(&[("f_year.txt", b"caf\xe9\n")]);
        let text = extract_tabular_member(&bytes).unwrap();
        assert!(text.starts_with("caf"));
        assert!(text.contains('\u{FFFD}'));
    }

    #[test]
    fn archive_without_tabular_member_is_an_error() {
        let bytes = zip_with(&[("notes.md", b"hi")]);
        let err = extract_tabular_member(&bytes).unwrap_err();
        assert!(matches!(err, DownloadError::NoTabularMember { .. }));
    }

    #[test]
    fn garbage_is_not_an_archive() {
        let err = extract_tabular_member(b"not a zip").unwrap_err();
        assert!(matches!(err, DownloadError::Archive { .. }));
        assert!(!err.is_transient());
    }
}
