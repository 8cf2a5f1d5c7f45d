use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::dump::{self, section::Section};
use crate::error::{Error, Result};
use crate::extract::{views, waitgraph};
use crate::graph::{self, dot};

/// Configure what is produced for each dump file, and what happens when a file fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Options {
    /// How the call graph is built.
    pub graph: graph::Options,

    /// Print frame addresses in the call graph. See [`dot::Options::plot_stack_ids`].
    pub plot_stack_ids: bool,

    /// Write the merged call graph of the short stacks. Default is `true`.
    pub make_dots: bool,

    /// Copy out the index manager wait graph. Default is `false`.
    pub wait_graph: bool,

    /// Copy out the monitoring views of the statistics section. Default is `false`.
    pub views: bool,

    /// Stop at the first file that fails, instead of carrying on with the rest. Default is
    /// `false`.
    pub strict: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            graph: graph::Options::default(),
            plot_stack_ids: false,
            make_dots: true,
            wait_graph: false,
            views: false,
            strict: false,
        }
    }
}

/// What happened to a list of dump files.
#[derive(Debug, Default)]
pub struct Summary {
    /// Files that were processed without error.
    pub processed: Vec<PathBuf>,
    /// Files that failed, and why.
    pub failed: Vec<(PathBuf, Error)>,
}

impl Summary {
    /// Whether every file was processed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Where the call graph of `dump` goes inside `out_dir`: the dump's file name plus `.dot`.
pub fn dot_path(out_dir: &Path, dump: &Path) -> PathBuf {
    let mut name = dump.file_name().unwrap_or_default().to_os_string();
    name.push(".dot");
    out_dir.join(name)
}

/// Produces every requested output of a single dump file in `out_dir`.
///
/// The dump is read once. Sections that are missing only cause a warning; the output for
/// them is skipped.
pub fn process_file(opt: &Options, dump: &Path, out_dir: &Path) -> Result<()> {
    let lines = dump::read_lines(dump)?;
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
    if opt.make_dots {
        make_dot(opt, dump, &lines, out_dir)?;
    }
    if opt.wait_graph {
        make_wait_graph(dump, &lines, out_dir)?;
    }
    if opt.views {
        make_views(dump, &lines, out_dir)?;
    }
    Ok(())
}

/// Processes `dumps` one after the other with [`process_file`].
///
/// Unless [`Options::strict`] is set, a file that fails is logged and remembered in the
/// returned [`Summary`], and the remaining files are still processed. In strict mode the
/// first failure is returned right away.
pub fn process_files<P>(opt: &Options, dumps: &[P], out_dir: &Path) -> Result<Summary>
where
    P: AsRef<Path>,
{
    let mut summary = Summary::default();
    for dump in dumps {
        let dump = dump.as_ref();
        match process_file(opt, dump, out_dir) {
            Ok(()) => summary.processed.push(dump.to_path_buf()),
            Err(e) if opt.strict => return Err(e),
            Err(e) => {
                error!("{}: {}", dump.display(), e);
                summary.failed.push((dump.to_path_buf(), e));
            }
        }
    }
    Ok(summary)
}

/// Writes the call graph of the short stack section, and returns the path written to, if any.
///
/// The whole graph is built before the output file is created, so a dump with a malformed
/// stack never leaves a partial file behind.
pub fn make_dot(
    opt: &Options,
    dump: &Path,
    lines: &[&str],
    out_dir: &Path,
) -> Result<Option<PathBuf>> {
    let section = Section::STACK_SHORT.extract(lines.iter().copied());
    if section.is_empty() {
        warn_missing(dump, Section::STACK_SHORT);
        return Ok(None);
    }

    let graph = graph::from_lines(opt.graph, section)?;
    let path = dot_path(out_dir, dump);
    let writer = BufWriter::new(File::create(&path)?);
    let dot_opt = dot::Options {
        plot_stack_ids: opt.plot_stack_ids,
    };
    dot::write(&graph, &dot_opt, writer)?;
    info!("File {} was created", path.display());
    Ok(Some(path))
}

/// Copies out the index manager wait graph, and returns the path written to, if any.
pub fn make_wait_graph(dump: &Path, lines: &[&str], out_dir: &Path) -> Result<Option<PathBuf>> {
    let section = Section::INDEXMANAGER_WAITGRAPH.extract(lines.iter().copied());
    if section.is_empty() {
        warn_missing(dump, Section::INDEXMANAGER_WAITGRAPH);
        return Ok(None);
    }

    let path = waitgraph::output_path(out_dir, dump);
    let writer = BufWriter::new(File::create(&path)?);
    waitgraph::write(section, writer)?;
    info!("File {} was created", path.display());
    Ok(Some(path))
}

/// Copies out the monitoring views, and returns the files written.
pub fn make_views(dump: &Path, lines: &[&str], out_dir: &Path) -> Result<Vec<PathBuf>> {
    let section = Section::STATISTICS.extract(lines.iter().copied());
    if section.is_empty() {
        warn_missing(dump, Section::STATISTICS);
        return Ok(Vec::new());
    }

    let written = views::write(section, &views::output_dir(out_dir, dump))?;
    for path in &written {
        info!("File {} was created", path.display());
    }
    Ok(written)
}

fn warn_missing(dump: &Path, section: Section<'_>) {
    warn!("{} has no {} section", dump.display(), section);
}
