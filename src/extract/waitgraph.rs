use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Where the wait graph of `dump` goes inside `out_dir`.
pub fn output_path(out_dir: &Path, dump: &Path) -> PathBuf {
    out_dir.join(format!(
        "indexmanager_waitgraph_{}.dot",
        super::flat_file_name(dump)
    ))
}

/// Writes the lines of an `[INDEXMANAGER_WAITGRAPH]` section, minus the section header.
///
/// The index manager already prints its wait graph in `dot` format, so the rest of the
/// section is copied as it is.
pub fn write<'l, I, W>(section: I, mut writer: W) -> io::Result<()>
where
    I: IntoIterator<Item = &'l str>,
    W: Write,
{
    for line in section.into_iter().skip(1) {
        writeln!(writer, "{}", line)?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_skips_header() {
        let section = [
            "[INDEXMANAGER_WAITGRAPH]  Wait graph: (2017-05-15 08:47:44 019 Local)",
            "digraph WaitGraph {",
            "  \"t1\" -> \"t2\";",
            "}",
        ];
        let mut out = Vec::new();
        write(section.iter().copied(), &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "digraph WaitGraph {\n  \"t1\" -> \"t2\";\n}\n"
        );
    }

    #[test]
    fn output_path_uses_file_name() {
        assert_eq!(
            output_path(Path::new("/tmp/out"), Path::new("/trace/indexserver_h.3.trc")),
            Path::new("/tmp/out/indexmanager_waitgraph_indexserver_h_3_trc.dot")
        );
    }
}
