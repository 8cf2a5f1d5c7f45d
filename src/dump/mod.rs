/// Cutting a named section out of the dump text.
///
/// See the [crate-level documentation] for details.
///
///   [crate-level documentation]: ../../index.html
pub mod section;

/// Splitting the short stack section into per-thread stacks.
pub mod thread;

/// Normalizing a single stack line into an id and a label.
pub mod frame;

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use crate::error::{Error, Result};

pub(crate) const CAPACITY_READER: usize = 128 * 1024;

/// Reads all lines of a dump file, without their line terminators.
///
/// Dumps are mostly ASCII, but may contain arbitrary bytes in user-provided strings (SQL
/// statements, object names), so invalid UTF-8 is replaced rather than rejected.
pub fn read_lines<P>(path: P) -> Result<Vec<String>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = io::BufReader::with_capacity(CAPACITY_READER, file);
    from_reader(reader).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads all lines from `reader`, without their line terminators.
pub fn from_reader<R>(mut reader: R) -> io::Result<Vec<String>>
where
    R: BufRead,
{
    let mut lines = Vec::new();
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        let decoded = String::from_utf8_lossy(&line);
        let l: &str = &decoded;
        let l = l.strip_suffix('\n').unwrap_or(l);
        let l = l.strip_suffix('\r').unwrap_or(l);
        lines.push(l.to_string());
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_reader_strips_terminators() {
        let input = b"first\nsecond\r\n\n--\nlast";
        let lines = from_reader(&input[..]).unwrap();
        assert_eq!(lines, vec!["first", "second", "", "--", "last"]);
    }

    #[test]
    fn from_reader_replaces_invalid_utf8() {
        let input = b"ok\n\xff in f\n";
        let lines = from_reader(&input[..]).unwrap();
        assert_eq!(lines, vec!["ok".to_string(), "\u{fffd} in f".to_string()]);
    }

    #[test]
    fn read_lines_reports_missing_file() {
        match read_lines("./does/not/exist.trc") {
            Err(Error::Open { path, .. }) => assert_eq!(path, Path::new("./does/not/exist.trc")),
            other => panic!("expected an open error, got {:?}", other),
        }
    }
}
