use std::io::{self, Write};

use super::color::{self, Hex};
use super::{Graph, Node, Role};

const NODE_PREFIX: &str = "nC";

/// Configure the generated `dot` text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Options {
    /// Print the address of the first occurrence under each frame's label. Mostly useful
    /// when frames are merged by address. Default is `false`.
    pub plot_stack_ids: bool,
}

/// Writes `graph` as a Graphviz digraph.
///
/// Every node becomes a filled record box named `nC<index>`, and every caller link an edge
/// from the callee to its caller, so that with `rankdir=BT` the outermost frames end up at
/// the top. Frames that only ever started a stack get a heavy blue border.
pub fn write<W>(graph: &Graph, opt: &Options, mut writer: W) -> io::Result<()>
where
    W: Write,
{
    writer.write_all(b"digraph StackGraph {\nratio=compress\nrankdir=BT\n")?;
    write_legend(graph, &mut writer)?;

    let mut index = itoa::Buffer::new();
    for (n, node) in graph.nodes().iter().enumerate() {
        writer.write_all(NODE_PREFIX.as_bytes())?;
        writer.write_all(index.format(n).as_bytes())?;
        write_node(graph, node, opt, &mut writer)?;
    }

    let mut parent_index = itoa::Buffer::new();
    for (child, parent) in graph.edges() {
        writeln!(
            writer,
            "{prefix}{} -> {prefix}{}",
            index.format(child),
            parent_index.format(parent),
            prefix = NODE_PREFIX
        )?;
    }

    writer.write_all(b"}\n")?;
    writer.flush()
}

fn write_legend<W>(graph: &Graph, writer: &mut W) -> io::Result<()>
where
    W: Write,
{
    write!(
        writer,
        "nlegend [shape=record,label=\"{{{{#T = Number threads executing the stack process}}"
    )?;
    if graph.plots_threads() {
        if graph.normal_threads() > 0 {
            write!(
                writer,
                "|{{{} Normal Threads (cyan boxes)}}",
                graph.normal_threads()
            )?;
        }
        if graph.exception_threads() > 0 {
            write!(
                writer,
                "|{{{} Exception Threads (orange boxes)}}",
                graph.exception_threads()
            )?;
        }
    }
    writeln!(
        writer,
        "}}\",style=filled,fillcolor=\"{}\",fontname=sans];",
        Hex(color::LEGEND)
    )
}

fn write_node<W>(graph: &Graph, node: &Node, opt: &Options, writer: &mut W) -> io::Result<()>
where
    W: Write,
{
    let fill = Hex(color::fill(
        node.role(),
        node.contributor_count(),
        graph.max_contributors(),
    ));
    match node.role() {
        Role::Thread => write!(
            writer,
            r#"[shape=record,label="{{Thread ID: {}\nThread Type: {}}}""#,
            node.raw_id(),
            node.label()
        )?,
        Role::Exception => write!(
            writer,
            r#"[shape=record,label="{{Exception ID: {}\nReason: {}}}""#,
            node.raw_id(),
            node.label()
        )?,
        Role::Plain => {
            writer.write_all(b"[shape=record,")?;
            if node.is_root() {
                writer.write_all(b"color=blue,penwidth=5,")?;
            }
            write!(writer, r#"label="{{{}"#, node.label())?;
            if opt.plot_stack_ids {
                write!(writer, r"\n{}", node.raw_id())?;
            }
            write!(writer, r#"\n#T={}}}""#, node.contributor_count())?;
        }
    }
    writeln!(writer, r#",style=filled,fillcolor="{}",fontname=sans];"#, fill)
}
