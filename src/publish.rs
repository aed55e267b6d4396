//! Content-aware file publishing.
//!
//! Output files carry banners whose timestamp changes on every run. The
//! comparison here treats comment and divider lines as wildcards, so a file
//! is only rewritten when its rule content changed.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::Result;

/// Outputs with at least this many lines are streamed instead of buffered.
pub const STREAM_THRESHOLD: usize = 500;

/// What [`publish`] did with a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Existing content is equivalent, nothing was written
    Unchanged,
    /// The file was created or replaced
    Written,
}

/// Compare two lines, ignoring the content of comments and dividers.
pub fn lines_equal(a: &str, b: &str) -> bool {
    let (Some(&first_a), Some(&first_b)) = (a.as_bytes().first(), b.as_bytes().first()) else {
        return a.is_empty() && b.is_empty();
    };
    if first_a != first_b {
        return false;
    }
    if matches!(first_a, b'#' | b'!') {
        return true;
    }
    if is_divider(a) && is_divider(b) {
        return true;
    }
    a == b
}

/// `//` followed by `#` at byte offset 3, e.g. `// #########`.
fn is_divider(line: &str) -> bool {
    line.starts_with("//") && line.as_bytes().get(3) == Some(&b'#')
}

/// Compare freshly generated lines with the lines of an existing file.
///
/// An empty candidate is never equal to anything. Trailing blank lines in
/// the existing file are ignored.
pub fn file_equal<I, S>(candidate: &[String], existing: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if candidate.is_empty() {
        return false;
    }

    let mut index = 0;
    for line in existing {
        let line = line.as_ref();
        match candidate.get(index) {
            Some(expected) => {
                if !lines_equal(expected, line) {
                    return false;
                }
                index += 1;
            }
            None => {
                if !line.is_empty() {
                    return false;
                }
            }
        }
    }

    index == candidate.len()
}

/// Write `lines` to `path` unless the file already holds equivalent content.
pub fn publish(path: &Path, lines: &[String]) -> Result<WriteOutcome> {
    if path.exists() && existing_equal(path, lines)? {
        log::info!("[skip] {:?} unchanged", path);
        return Ok(WriteOutcome::Unchanged);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    if lines.len() < STREAM_THRESHOLD {
        write_buffered(path, lines)?;
    } else {
        write_streaming(path, lines)?;
    }

    log::info!("[write] {:?} ({} lines)", path, lines.len());
    Ok(WriteOutcome::Written)
}

fn existing_equal(path: &Path, candidate: &[String]) -> Result<bool> {
    let reader = BufReader::new(File::open(path)?);
    let mut read_error = None;
    let mut undecodable = false;

    let existing = reader.split(b'\n').map_while(|line| match line {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(mut line) => {
                if line.ends_with('\r') {
                    line.pop();
                }
                Some(line)
            }
            Err(_) => {
                undecodable = true;
                None
            }
        },
        Err(e) => {
            read_error = Some(e);
            None
        }
    });
    let equal = file_equal(candidate, existing);

    if let Some(e) = read_error {
        return Err(e.into());
    }
    // Content that is not UTF-8 never matches generated text
    Ok(equal && !undecodable)
}

/// Replace the file in one step via a sibling temp file.
fn write_buffered(path: &Path, lines: &[String]) -> io::Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(dir) => NamedTempFile::new_in(dir)?,
        None => NamedTempFile::new_in(".")?,
    };

    let mut content = lines.join("\n");
    content.push('\n');
    tmp.write_all(content.as_bytes())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Stream line by line; the handle is closed when `writer` drops, on every path.
fn write_streaming(path: &Path, lines: &[String]) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for line in lines {
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn owned(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_comment_lines_are_wildcards() {
        let existing = ["# banner v1", "example.com"];
        let candidate = owned(&["# banner v2", "example.com"]);
        assert!(file_equal(&candidate, existing));
    }

    #[test]
    fn test_longer_candidate_not_equal() {
        let existing = ["example.com"];
        let candidate = owned(&["example.com", "new.com"]);
        assert!(!file_equal(&candidate, existing));
    }

    #[test]
    fn test_trailing_blank_lines_ignored() {
        let existing = ["example.com", "", ""];
        let candidate = owned(&["example.com"]);
        assert!(file_equal(&candidate, existing));

        let existing = ["example.com", "", "extra.com"];
        assert!(!file_equal(&candidate, existing));
    }

    #[test]
    fn test_empty_candidate_never_equal() {
        let empty: Vec<String> = Vec::new();
        assert!(!file_equal(&empty, ["example.com"]));
        assert!(!file_equal(&empty, Vec::<String>::new()));
    }

    #[test]
    fn test_lines_equal() {
        assert!(lines_equal("", ""));
        assert!(!lines_equal("", "a"));
        assert!(lines_equal("! adblock header", "! other"));
        assert!(!lines_equal("# comment", "! comment"));
        assert!(lines_equal("// ### v1", "// ### v2"));
        assert!(!lines_equal("// v1", "// v2"));
        assert!(!lines_equal("a.com", "b.com"));
        assert!(lines_equal("a.com", "a.com"));
    }

    #[test]
    fn test_publish_writes_then_skips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("out.conf");

        let first = owned(&["# Last Updated: 1", "example.com"]);
        assert_eq!(publish(&path, &first).unwrap(), WriteOutcome::Written);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "# Last Updated: 1\nexample.com\n"
        );

        let second = owned(&["# Last Updated: 2", "example.com"]);
        assert_eq!(publish(&path, &second).unwrap(), WriteOutcome::Unchanged);

        let third = owned(&["# Last Updated: 3", "example.org"]);
        assert_eq!(publish(&path, &third).unwrap(), WriteOutcome::Written);
        assert!(fs::read_to_string(&path).unwrap().contains("example.org"));
    }

    #[test]
    fn test_publish_replaces_undecodable_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.conf");
        fs::write(&path, b"# banner\n\xff\xfe bad\n").unwrap();

        let lines = owned(&["# banner", "example.com"]);
        assert_eq!(publish(&path, &lines).unwrap(), WriteOutcome::Written);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "# banner\nexample.com\n"
        );

        // Undecodable bytes past the end of the candidate still count
        fs::write(&path, b"example.com\n\xff\n").unwrap();
        let lines = owned(&["example.com"]);
        assert_eq!(publish(&path, &lines).unwrap(), WriteOutcome::Written);
    }

    #[test]
    fn test_crlf_file_compares_equal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("crlf.conf");
        fs::write(&path, "# old banner\r\nexample.com\r\n").unwrap();

        let lines = owned(&["# new banner", "example.com"]);
        assert_eq!(publish(&path, &lines).unwrap(), WriteOutcome::Unchanged);
    }

    #[test]
    fn test_publish_streams_large_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("large.txt");
        let lines: Vec<String> = (0..STREAM_THRESHOLD + 10)
            .map(|i| format!("domain{}.example.com", i))
            .collect();

        assert_eq!(publish(&path, &lines).unwrap(), WriteOutcome::Written);
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), lines.len());
        assert_eq!(publish(&path, &lines).unwrap(), WriteOutcome::Unchanged);
    }
}
