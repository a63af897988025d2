//! Container descriptor resolution: locate the package document.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::epub::archive::ArchiveEntries;
use crate::error::{Error, Result};
use crate::util::strip_bom;

/// Fixed archive path of the container descriptor.
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Find the package document path declared by the container descriptor.
///
/// Extracts the `full-path` attribute of the first `rootfile` element,
/// tolerant of attribute order, namespacing, and whitespace. Fails with
/// [`Error::MissingRootfile`] when the descriptor is absent or carries no
/// usable declaration; there is no way to make further progress without it.
pub fn rootfile_path(entries: &ArchiveEntries) -> Result<String> {
    let bytes = entries.get(CONTAINER_PATH).ok_or(Error::MissingRootfile)?;
    let content = String::from_utf8_lossy(strip_bom(bytes));

    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);
    reader.config_mut().check_end_names = false;

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if local_name(e.name().as_ref()) == b"rootfile" =>
            {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"full-path" {
                        return Ok(String::from_utf8(attr.value.to_vec())?);
                    }
                }
            }
            Ok(Event::Eof) => break,
            // A parse error ends the scan; with no rootfile found by then,
            // the descriptor is treated as missing.
            Err(_) => break,
            _ => {}
        }
    }

    Err(Error::MissingRootfile)
}

/// Extract the local name from a potentially namespaced XML name.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}
