// Unilog - platform/fs.rs
//
// Source file reading.
//
// Files are read whole and decoded lossily: a stray invalid byte in one
// line must not cost the rest of the file. Failures are returned to the
// caller immediately; there are no retries.

use std::io;
use std::path::Path;

/// Read a log file as text.
///
/// Files flagged `is_large` by discovery are read through a memory map so
/// the raw bytes are never copied into a second heap buffer before decoding.
pub fn read_source(path: &Path, is_large: bool) -> io::Result<String> {
    if is_large {
        read_mapped(path)
    } else {
        read_file_lossy(path)
    }
}

/// Read the full content of a file as a string.
///
/// For files with invalid UTF-8, uses lossy conversion.
pub fn read_file_lossy(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!(path = %path.display(), "Invalid UTF-8, decoding lossily");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    })
}

fn read_mapped(path: &Path) -> io::Result<String> {
    let file = std::fs::File::open(path)?;
    // Empty files cannot be mapped on every platform.
    if file.metadata()?.len() == 0 {
        return Ok(String::new());
    }
    // SAFETY: the map is only read, and dropped before returning. A log file
    // truncated by another process while mapped can fault; that is accepted
    // for files that are already written when the run starts.
    let mmap = unsafe { memmap2::Mmap::map(&file)? };
    tracing::debug!(path = %path.display(), bytes = mmap.len(), "Reading via memory map");
    Ok(String::from_utf8_lossy(&mmap).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_and_mapped_reads_agree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.log");
        std::fs::write(&path, "2021-01-01T00:00:00.000+0000 one\ntwo\n").unwrap();

        let small = read_source(&path, false).unwrap();
        let mapped = read_source(&path, true).unwrap();
        assert_eq!(small, mapped);
        assert_eq!(small.lines().count(), 2);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bin.log");
        std::fs::write(&path, b"ok \xff\xfe line\n").unwrap();

        for is_large in [false, true] {
            let text = read_source(&path, is_large).unwrap();
            assert!(text.starts_with("ok "));
            assert!(text.contains('\u{FFFD}'));
            assert!(text.ends_with(" line\n"));
        }
    }

    #[test]
    fn test_empty_file_via_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.log");
        std::fs::write(&path, "").unwrap();
        assert_eq!(read_source(&path, true).unwrap(), "");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = read_source(Path::new("/nonexistent/unilog/a.log"), false).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
