use std::fmt;

use crate::error::{Error, Result};

// Only the local-time header line opens a section; the same marker also shows up in the table
// of contents at the top of a dump.
const ACTIVATION_TOKEN: &str = "Local";
const TERMINATION_TOKEN: &str = "[OK]";

/// The bracket-delimited name of a dump section, like `[STACK_SHORT]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Section<'a> {
    marker: &'a str,
}

impl Section<'static> {
    /// The short call stacks of all threads, and the stacks of pending exceptions.
    pub const STACK_SHORT: Section<'static> = Section {
        marker: "[STACK_SHORT]",
    };

    /// The index manager wait graph, which is already in `dot` format.
    pub const INDEXMANAGER_WAITGRAPH: Section<'static> = Section {
        marker: "[INDEXMANAGER_WAITGRAPH]",
    };

    /// Snapshots of the monitoring views.
    pub const STATISTICS: Section<'static> = Section {
        marker: "[STATISTICS]",
    };
}

impl<'a> Section<'a> {
    /// Creates a section from its marker, which must start with `[` and end with `]`.
    pub fn new(marker: &'a str) -> Result<Self> {
        if marker.len() > 2 && marker.starts_with('[') && marker.ends_with(']') {
            Ok(Section { marker })
        } else {
            Err(Error::InvalidSection(marker.to_string()))
        }
    }

    /// The marker, brackets included.
    pub fn marker(&self) -> &'a str {
        self.marker
    }

    /// Returns the lines of the first occurrence of this section in `lines`.
    ///
    /// The section starts at the first line that holds both the marker and the word `Local`
    /// (that line is included), and runs up to, but not including, the next line containing
    /// `[OK]`. If the section never starts, the result is empty; it is up to the caller to
    /// decide whether that deserves a warning.
    pub fn extract<'l, I>(&self, lines: I) -> Vec<&'l str>
    where
        I: IntoIterator<Item = &'l str>,
    {
        let mut section = Vec::new();
        let mut active = false;
        for line in lines {
            if !active && line.contains(self.marker) && line.contains(ACTIVATION_TOKEN) {
                active = true;
            }
            if active {
                if line.contains(TERMINATION_TOKEN) {
                    break;
                }
                section.push(line);
            }
        }
        section
    }
}

impl fmt::Display for Section<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static DUMP: &[&str] = &[
        "[BUILD]  Build information: (2017-05-15 08:47:44 019 Local)",
        " Version : 2.00.012.00.1496928262",
        "[OK]",
        "--",
        "[STACK_SHORT]  Short call stacks and pending exceptions of all threads: (2017-05-15 08:47:44 019 Local)",
        "[0] [thr=19134]: SqlExecutor at",
        " 1: 0x00007f5b4a1e1a10 in f()+0x4d0 at f.cpp:1 (libf.so)",
        "--",
        "[OK]",
        "--",
        "[STACK_SHORT]  A second copy: (2017-05-15 08:47:45 020 Local)",
        " 1: 0x00007f5b4a1e1a10 in g()+0x4d0 at g.cpp:1 (libg.so)",
        "[OK]",
    ];

    #[test]
    fn extract_stops_before_ok() {
        let lines = Section::STACK_SHORT.extract(DUMP.iter().copied());
        assert_eq!(lines, &DUMP[4..8]);
    }

    #[test]
    fn extract_needs_local_marker() {
        let lines = ["[STACK_SHORT] table of contents", " 1: 0x1 in f()", "[OK]"];
        assert!(Section::STACK_SHORT.extract(lines.iter().copied()).is_empty());
    }

    #[test]
    fn extract_missing_section_is_empty() {
        let lines = Section::STATISTICS.extract(DUMP.iter().copied());
        assert!(lines.is_empty());
    }

    #[test]
    fn extract_single_line_section() {
        let lines = ["[BUILD] (Local) [OK]"];
        let section = Section::new("[BUILD]").unwrap();
        assert!(section.extract(lines.iter().copied()).is_empty());
    }

    #[test]
    fn new_requires_brackets() {
        assert_eq!(Section::new("[X]").unwrap().marker(), "[X]");
        for marker in &["X]", "[X", "STACK_SHORT", "[]", ""] {
            match Section::new(marker) {
                Err(Error::InvalidSection(m)) => assert_eq!(&m, marker),
                other => panic!("{:?} should be rejected, got {:?}", marker, other),
            }
        }
    }
}
