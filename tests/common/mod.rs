#![allow(dead_code)]

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use pretty_assertions::assert_eq;
use stackgraph::batch::{self, Options};

pub fn compare_results<R, E>(result: R, mut expected: E, expected_file: &str)
where
    R: BufRead,
    E: BufRead,
{
    let mut buf = String::new();
    let mut line_num = 1;
    for line in result.lines() {
        let line = line.unwrap();
        if expected.read_line(&mut buf).unwrap() == 0 {
            panic!(
                "\noutput has more lines than expected result file: {}",
                expected_file
            );
        }
        assert_eq!(line, buf.trim_end(), "\n{}:{}", expected_file, line_num);
        buf.clear();
        line_num += 1;
    }

    if expected.read_line(&mut buf).unwrap() > 0 {
        panic!(
            "\n{} has more lines than output, beginning at line: {}",
            expected_file, line_num
        )
    }
}

pub fn compare_files<P>(result_file: P, expected_file: &str)
where
    P: AsRef<Path>,
{
    let result_file = result_file.as_ref();
    let result = match File::open(result_file) {
        Ok(f) => BufReader::new(f),
        Err(e) => panic!("{} was not written: {}", result_file.display(), e),
    };
    let expected = BufReader::new(File::open(expected_file).unwrap());
    compare_results(result, expected, expected_file);
}

/// Runs the short stack graph of `test_file` into a temporary directory, and compares the
/// resulting `.dot` file against `expected_file`.
pub fn test_stackgraph(test_file: &str, expected_file: &str, options: Options) {
    let out = tempfile::tempdir().unwrap();
    let dump = Path::new(test_file);
    batch::process_file(&options, dump, out.path()).unwrap();

    let result_file = batch::dot_path(out.path(), dump);
    if fs::metadata(expected_file).is_err() {
        // be nice to the dev and keep the output around
        let kept = std::env::temp_dir().join(result_file.file_name().unwrap());
        fs::copy(&result_file, &kept).unwrap();
        panic!(
            "{} does not exist; the output is in {}",
            expected_file,
            kept.display()
        );
    }
    compare_files(result_file, expected_file);
}
