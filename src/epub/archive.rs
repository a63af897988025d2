//! Archive reading: flatten a ZIP container into a path -> bytes map.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::error::Result;

/// Flat mapping of normalized archive path to raw entry content.
///
/// Built once per parse and discarded with the parse call. Paths are
/// forward-slash separated and case-sensitive.
pub type ArchiveEntries = HashMap<String, Vec<u8>>;

/// Read every non-directory entry of a ZIP container fully into memory.
///
/// EPUB entries are typically small HTML/CSS/image fragments, so there is
/// no streaming contract. Fails if the bytes are not a valid or complete
/// ZIP structure; the caller surfaces that as an unreadable document.
pub fn read_archive(bytes: &[u8]) -> Result<ArchiveEntries> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = ArchiveEntries::with_capacity(archive.len());

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if file.is_dir() {
            continue;
        }
        let path = file.name().replace('\\', "/");
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;
        entries.insert(path, data);
    }

    Ok(entries)
}

/// Look up an entry, retrying with a percent-decoded path.
///
/// Some producers write percent-encoded hrefs into the manifest while
/// storing the decoded name in the archive.
pub fn lookup<'a>(entries: &'a ArchiveEntries, path: &str) -> Option<&'a [u8]> {
    if let Some(data) = entries.get(path) {
        return Some(data);
    }

    let decoded = percent_encoding::percent_decode_str(path)
        .decode_utf8()
        .ok()?;
    entries.get(decoded.as_ref()).map(Vec::as_slice)
}
