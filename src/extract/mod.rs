/// Copying the index manager wait graph out of a dump.
pub mod waitgraph;

/// Splitting the statistics section into one CSV file per monitoring view.
pub mod views;

use std::path::Path;

// "indexserver_host.30003.rtedump.trc" -> "indexserver_host_30003_rtedump_trc"
pub(crate) fn flat_file_name(dump: &Path) -> String {
    dump.file_name()
        .map(|name| name.to_string_lossy().replace('.', "_"))
        .unwrap_or_default()
}
