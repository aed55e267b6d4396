//! Line readers for local rule sources.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::{Error, Result};

/// Open a rule source and iterate its lines.
///
/// Files ending in `.gz` are decompressed on the fly.
pub fn read_lines(path: &Path) -> Result<impl Iterator<Item = std::io::Result<String>>> {
    let file = File::open(path).map_err(|source| Error::Source {
        path: path.to_path_buf(),
        source,
    })?;

    let reader: Box<dyn Read + Send> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    Ok(BufReader::new(reader).lines())
}

/// Trim a source line, dropping blanks and comments (`#`, `!`, `//`).
pub fn process_line(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with('!') || line.starts_with("//")
    {
        return None;
    }
    Some(line)
}

/// Feed every meaningful line of `path` to `f`.
pub fn for_each_line<F>(path: &Path, mut f: F) -> Result<usize>
where
    F: FnMut(&str),
{
    let mut count = 0;
    for line in read_lines(path)? {
        let line = line.map_err(|source| Error::Source {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(line) = process_line(&line) {
            f(line);
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_process_line() {
        assert_eq!(process_line("  example.com  "), Some("example.com"));
        assert_eq!(process_line(""), None);
        assert_eq!(process_line("# comment"), None);
        assert_eq!(process_line("! adblock comment"), None);
        assert_eq!(process_line("// note"), None);
        assert_eq!(process_line("DOMAIN,a.com"), Some("DOMAIN,a.com"));
    }

    #[test]
    fn test_plain_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("list.txt");
        std::fs::write(&path, "# header\nexample.com\n\n.google.com\n").unwrap();

        let mut seen = Vec::new();
        let count = for_each_line(&path, |l| seen.push(l.to_string())).unwrap();
        assert_eq!(count, 2);
        assert_eq!(seen, vec!["example.com", ".google.com"]);
    }

    #[test]
    fn test_gzip_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("list.txt.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"DOMAIN,a.com\nDOMAIN,b.com\n").unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let mut seen = Vec::new();
        for_each_line(&path, |l| seen.push(l.to_string())).unwrap();
        assert_eq!(seen, vec!["DOMAIN,a.com", "DOMAIN,b.com"]);
    }

    #[test]
    fn test_missing_file() {
        let err = for_each_line(Path::new("/nonexistent/rules.txt"), |_| {}).unwrap_err();
        assert!(matches!(err, Error::Source { .. }));
    }
}
