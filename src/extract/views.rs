use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

const VIEW_TITLE_SEPARATOR: &str = "-";

/// The directory inside `out_dir` that receives the views of `dump`.
pub fn output_dir(out_dir: &Path, dump: &Path) -> PathBuf {
    out_dir.join(format!("VIEWS_{}", super::flat_file_name(dump)))
}

/// Writes every view of a `[STATISTICS]` section to `<view_dir>/<VIEW>.csv`, and returns the
/// files that were written in the order they were found.
///
/// A view starts with a `<VIEW> - <description>` title line, and ends with a `(<VIEW>,...)`
/// trailer. Everything in between (the column header and the rows) is copied as it is.
pub fn write<'l, I>(section: I, view_dir: &Path) -> io::Result<Vec<PathBuf>>
where
    I: IntoIterator<Item = &'l str>,
{
    fs::create_dir_all(view_dir)?;

    let mut written = Vec::new();
    // the trailer that ends the current view, and the file it goes to
    let mut current: Option<(String, BufWriter<File>)> = None;
    for line in section {
        match current.take() {
            None => {
                let mut words = line.split(' ');
                let view = words.next().unwrap_or_default();
                if !view.is_empty() && words.next() == Some(VIEW_TITLE_SEPARATOR) {
                    let path = view_dir.join(format!("{}.csv", view));
                    let file = BufWriter::new(File::create(&path)?);
                    debug!("writing view {} to {}", view, path.display());
                    written.push(path);
                    current = Some((format!("({},", view), file));
                }
            }
            Some((trailer, mut file)) => {
                if line.starts_with(&trailer) {
                    file.flush()?;
                } else {
                    writeln!(file, "{}", line)?;
                    current = Some((trailer, file));
                }
            }
        }
    }

    if let Some((trailer, mut file)) = current {
        warn!("Statistics section ended inside view {}", &trailer[1..trailer.len() - 1]);
        file.flush()?;
    }
    Ok(written)
}
