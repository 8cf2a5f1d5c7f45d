use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const TRACE_FILE_PREFIX: &str = "indexserver_";
const TRACE_FILE_SUFFIX: &str = ".trc";

/// The trace directory of the local instance, `$DIR_INSTANCE/$VTHOST/trace`.
///
/// That is where the `cdtrace` alias of the instance's administrator points to. Returns `None`
/// if either variable is unset.
pub fn default_trace_dir() -> Option<PathBuf> {
    let instance = env::var_os("DIR_INSTANCE")?;
    let host = env::var_os("VTHOST")?;
    Some(Path::new(&instance).join(host).join("trace"))
}

/// Lists the first `limit` indexserver trace files in `dir`, ordered by file name.
///
/// Only files named `indexserver_*<dump_type>*.trc` are considered, so a `dump_type` of
/// `"oom"` selects out-of-memory dumps, and an empty one selects every indexserver trace.
pub fn dump_files(dir: &Path, dump_type: &str, limit: usize) -> io::Result<Vec<PathBuf>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if matches_dump_type(&name, dump_type) {
            names.push(name.into_owned());
        }
    }
    names.sort_unstable();
    if names.is_empty() {
        warn!(
            "No {}*{}*{} files found in {}",
            TRACE_FILE_PREFIX,
            dump_type,
            TRACE_FILE_SUFFIX,
            dir.display()
        );
    }
    Ok(names
        .into_iter()
        .take(limit)
        .map(|name| dir.join(name))
        .collect())
}

fn matches_dump_type(name: &str, dump_type: &str) -> bool {
    name.strip_prefix(TRACE_FILE_PREFIX)
        .and_then(|rest| rest.strip_suffix(TRACE_FILE_SUFFIX))
        .map_or(false, |middle| middle.contains(dump_type))
}
