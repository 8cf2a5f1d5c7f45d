use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

use clap::{ArgAction, ArgGroup, Parser};
use env_logger::Env;
use stackgraph::batch::{self, Options};
use stackgraph::dump::frame::{self, LabelLength};
use stackgraph::graph::{self, IdentityPolicy};
use stackgraph::locate;

#[derive(Debug, Parser)]
#[clap(
    name = "stackgraph",
    about,
    after_help = "\
Each dump gets a <dump file name>.dot file in the output directory. Render it with e.g.

    dot -Tsvg <file>.dot > stacks.svg

The more threads pass through a stack frame, the redder its box. Frames that only ever
start a stack have a heavy blue border.
    "
)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .args(["infiles", "num_dumps"]),
))]
struct Opt {
    // ************* //
    // *** FLAGS *** //
    // ************* //
    /// Add a box for every thread (cyan) and exception (orange) at the top of its stack
    #[clap(short = 't', long = "plot-threads")]
    plot_threads: bool,

    /// Merge stack frames with the same address, instead of the same label
    #[clap(long = "id-by-address")]
    id_by_address: bool,

    /// Keep the +0x... offsets in labels when truncating them with --label-length
    #[clap(long = "keep-hex")]
    keep_hex: bool,

    /// Print the address of each stack frame under its label
    #[clap(long = "plot-stack-ids", requires = "id_by_address")]
    plot_stack_ids: bool,

    /// Do not write the merged call graph
    #[clap(long = "no-dots")]
    no_dots: bool,

    /// Copy out the index manager wait graph
    #[clap(long = "wait-graph")]
    wait_graph: bool,

    /// Copy out the monitoring views of the statistics section, one CSV file per view
    #[clap(long = "views")]
    views: bool,

    /// Stop at the first dump that cannot be processed
    #[clap(long = "strict")]
    strict: bool,

    /// Silence all log output
    #[clap(short = 'q', long = "quiet")]
    quiet: bool,

    /// Verbose logging mode (-v, -vv, -vvv)
    #[clap(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    // *************** //
    // *** OPTIONS *** //
    // *************** //
    /// Number of characters of each stack line to use as label; negative to cut it at the
    /// first parenthesis
    #[clap(
        short = 'l',
        long = "label-length",
        default_value = "-1",
        value_name = "INT",
        allow_negative_numbers = true
    )]
    label_length: i64,

    /// Process the first UINT indexserver trace files of the trace directory
    #[clap(short = 'n', long = "num-dumps", value_name = "UINT")]
    num_dumps: Option<usize>,

    /// Only pick trace files whose name contains STRING, e.g. oom
    #[clap(long = "dump-type", value_name = "STRING", requires = "num_dumps")]
    dump_type: Option<String>,

    /// Trace directory to pick dumps from [default: $DIR_INSTANCE/$VTHOST/trace]
    #[clap(long = "trace-dir", value_name = "PATH", requires = "num_dumps")]
    trace_dir: Option<PathBuf>,

    /// Directory to write the output files to [default: <tmp>/stackgraph_output]
    #[clap(short = 'o', long = "output-dir", value_name = "PATH")]
    output_dir: Option<PathBuf>,

    // ************ //
    // *** ARGS *** //
    // ************ //
    /// Dump files to process, separated by spaces or commas
    #[clap(value_name = "PATH", value_delimiter = ',', conflicts_with = "num_dumps")]
    infiles: Vec<PathBuf>,
}

impl Opt {
    fn into_parts(self) -> io::Result<(Vec<PathBuf>, PathBuf, Options)> {
        let mut options = Options::default();
        options.graph = graph::Options {
            identity: if self.id_by_address {
                IdentityPolicy::RawId
            } else {
                IdentityPolicy::Label
            },
            frame: frame::Options {
                label_length: LabelLength::from(self.label_length),
                strip_hex: !self.keep_hex,
            },
            plot_threads: self.plot_threads,
        };
        options.plot_stack_ids = self.plot_stack_ids;
        options.make_dots = !self.no_dots;
        options.wait_graph = self.wait_graph;
        options.views = self.views;
        options.strict = self.strict;

        let dumps = match self.num_dumps {
            Some(n) => {
                let dir = self
                    .trace_dir
                    .or_else(locate::default_trace_dir)
                    .ok_or_else(|| {
                        io::Error::new(
                            io::ErrorKind::NotFound,
                            "no trace directory: pass --trace-dir, or set DIR_INSTANCE and VTHOST",
                        )
                    })?;
                locate::dump_files(&dir, self.dump_type.as_deref().unwrap_or(""), n)?
            }
            None => self.infiles,
        };

        let out_dir = self
            .output_dir
            .unwrap_or_else(|| env::temp_dir().join("stackgraph_output"));
        Ok((dumps, out_dir, options))
    }
}

fn main() -> io::Result<()> {
    let opt = Opt::parse();

    // Initialize logger
    if !opt.quiet {
        env_logger::Builder::from_env(Env::default().default_filter_or(match opt.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }))
        .format_timestamp(None)
        .init();
    }

    let (dumps, out_dir, options) = opt.into_parts()?;
    fs::create_dir_all(&out_dir)?;

    let summary = batch::process_files(&options, &dumps, &out_dir)?;
    if summary.is_success() {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::Other,
            format!(
                "{} of {} dumps could not be processed",
                summary.failed.len(),
                dumps.len()
            ),
        ))
    }
}
