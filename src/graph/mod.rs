/// The colors of the boxes in the graph.
pub mod color;

/// Writing a [`Graph`] in the Graphviz `dot` format.
pub mod dot;

use ahash::{AHashMap, RandomState};
use indexmap::IndexSet;

use crate::dump::frame::{self, Frame};
use crate::dump::thread::{self, Thread, ThreadKind};
use crate::error::{Error, Result};

const CAPACITY_NODES: usize = 512;

/// What makes two stack frames the same box in the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum IdentityPolicy {
    /// Frames with the same normalized label are merged, even if they are at different
    /// addresses (e.g. different call sites within the same function).
    #[default]
    Label,
    /// Frames are merged only if they have the same address.
    RawId,
}

/// Configure how stacks are merged into a graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Options {
    /// When frames are considered identical. Default is [`IdentityPolicy::Label`].
    pub identity: IdentityPolicy,

    /// How stack lines are turned into labels.
    pub frame: frame::Options,

    /// Add a box for every thread and exception, as the root of its stack. Default is
    /// `false`.
    pub plot_threads: bool,
}

/// The part a node plays in the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// The box of a normal thread.
    Thread,
    /// The box of an exception.
    Exception,
    /// A stack frame.
    Plain,
}

impl From<ThreadKind> for Role {
    fn from(kind: ThreadKind) -> Self {
        match kind {
            ThreadKind::Normal => Role::Thread,
            ThreadKind::Exception => Role::Exception,
        }
    }
}

/// One box in the graph.
///
/// Nodes are referred to by their position in [`Graph::nodes`].
#[derive(Clone, Debug)]
pub struct Node {
    raw_id: String,
    label: String,
    role: Role,
    // `None` stands for "this node started a stack".
    parents: IndexSet<Option<usize>, RandomState>,
    contributors: IndexSet<String, RandomState>,
}

impl Node {
    fn new(raw_id: String, label: String, role: Role, parent: Option<usize>, thread: &str) -> Self {
        let mut node = Node {
            raw_id,
            label,
            role,
            parents: IndexSet::default(),
            contributors: IndexSet::default(),
        };
        node.parents.insert(parent);
        node.contributors.insert(thread.to_string());
        node
    }

    /// The address of the first frame that created this node, or the thread id for thread
    /// and exception nodes.
    pub fn raw_id(&self) -> &str {
        &self.raw_id
    }

    /// The normalized function, or the thread type or exception reason for thread and
    /// exception nodes.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether this is a thread, an exception or a stack frame.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The callers of this frame, in the order they were first seen. `None` means the frame
    /// was the first of some stack.
    pub fn parents(&self) -> impl Iterator<Item = Option<usize>> + '_ {
        self.parents.iter().copied()
    }

    /// Whether every stack that passed through this node started with it.
    pub fn is_root(&self) -> bool {
        self.parents.len() == 1 && self.parents.contains(&None)
    }

    /// The ids of the threads whose stack passes through this node, in order of appearance.
    pub fn contributors(&self) -> impl Iterator<Item = &str> + '_ {
        self.contributors.iter().map(String::as_str)
    }

    /// The number of distinct threads whose stack passes through this node.
    pub fn contributor_count(&self) -> usize {
        self.contributors.len()
    }
}

/// The merged stacks of all threads of one dump.
#[derive(Clone, Debug)]
pub struct Graph {
    nodes: Vec<Node>,
    max_contributors: usize,
    normal_threads: usize,
    exception_threads: usize,
    plot_threads: bool,
}

impl Graph {
    /// All nodes, in the order they were created.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The highest number of contributing threads of any stack frame. Never zero.
    pub fn max_contributors(&self) -> usize {
        self.max_contributors
    }

    /// The number of normal threads that were merged.
    pub fn normal_threads(&self) -> usize {
        self.normal_threads
    }

    /// The number of exceptions that were merged.
    pub fn exception_threads(&self) -> usize {
        self.exception_threads
    }

    /// Whether the graph holds a node for each thread and exception.
    pub fn plots_threads(&self) -> bool {
        self.plot_threads
    }

    /// All caller links as `(callee, caller)` pairs, grouped by callee.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .flat_map(|(child, node)| node.parents().flatten().map(move |parent| (child, parent)))
    }
}

/// Merges the stacks of threads into a [`Graph`], one thread at a time.
///
/// To construct one, either use `Builder::default()` or create an [`Options`] and use
/// `Builder::from(options)`.
#[derive(Clone, Debug, Default)]
pub struct Builder {
    opt: Options,
    nodes: Vec<Node>,
    /// Stack frame node for each identity key.
    index: AHashMap<String, usize>,
    max_contributors: usize,
    normal_threads: usize,
    exception_threads: usize,
}

impl From<Options> for Builder {
    fn from(opt: Options) -> Self {
        Builder {
            opt,
            nodes: Vec::with_capacity(CAPACITY_NODES),
            index: AHashMap::with_capacity(CAPACITY_NODES),
            ..Default::default()
        }
    }
}

impl Builder {
    /// Walks the stack of `thread`, innermost frame first, and merges it into the graph.
    ///
    /// A frame that is identical to one already in the graph (as decided by
    /// [`Options::identity`]) reuses that node: the previous frame of this stack is added to
    /// its callers, and the thread to its contributors. Otherwise a new node is created.
    pub fn add_thread(&mut self, thread: &Thread) -> Result<()> {
        match thread.kind {
            ThreadKind::Normal => self.normal_threads += 1,
            ThreadKind::Exception => self.exception_threads += 1,
        }

        let mut previous = None;
        if self.opt.plot_threads {
            // every thread gets its own box, even if the dump lists the same id twice
            previous = Some(self.push(Node::new(
                thread.id.clone(),
                thread.label.clone(),
                Role::from(thread.kind),
                None,
                &thread.id,
            )));
        }

        for line in &thread.frames {
            let Frame { id, label } = frame::normalize(line, &self.opt.frame)?;
            let key = match self.opt.identity {
                IdentityPolicy::Label => &label,
                IdentityPolicy::RawId => &id,
            };

            let current = match self.index.get(key) {
                Some(&existing) => {
                    trace!("merging {:?} into node {}", key, existing);
                    let node = &mut self.nodes[existing];
                    node.parents.insert(previous);
                    node.contributors.insert(thread.id.clone());
                    existing
                }
                None => {
                    let key = key.clone();
                    let n = self.push(Node::new(id, label, Role::Plain, previous, &thread.id));
                    self.index.insert(key, n);
                    n
                }
            };
            self.max_contributors = self
                .max_contributors
                .max(self.nodes[current].contributor_count());
            previous = Some(current);
        }
        Ok(())
    }

    /// Finishes the graph.
    ///
    /// Returns [`Error::Empty`] if no stack frame was ever added.
    pub fn finish(self) -> Result<Graph> {
        if self.max_contributors == 0 {
            if self.normal_threads + self.exception_threads > 0 {
                warn!(
                    "{} threads and {} exceptions, but not a single stack frame",
                    self.normal_threads, self.exception_threads
                );
            }
            if self.nodes.is_empty() {
                return Err(Error::Empty("no stack frames were found"));
            }
            return Err(Error::Empty("no thread passes through any stack frame"));
        }
        debug!(
            "merged {} threads and {} exceptions into {} nodes",
            self.normal_threads,
            self.exception_threads,
            self.nodes.len()
        );
        Ok(Graph {
            nodes: self.nodes,
            max_contributors: self.max_contributors,
            normal_threads: self.normal_threads,
            exception_threads: self.exception_threads,
            plot_threads: self.opt.plot_threads,
        })
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }
}

/// Builds the graph of a short stack section.
///
/// The lines are split into threads with [`thread::segment`], and the threads are merged in
/// order of appearance.
pub fn from_lines<'l, I>(opt: Options, lines: I) -> Result<Graph>
where
    I: IntoIterator<Item = &'l str>,
{
    let threads = thread::segment(lines)?;
    debug!(
        "found {} threads and {} exceptions",
        threads.normal, threads.exceptions
    );
    let mut builder = Builder::from(opt);
    for thread in &threads.threads {
        builder.add_thread(thread)?;
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashset;
    use std::collections::HashSet;

    fn thread(id: &str, frames: &[&str]) -> Thread {
        Thread {
            id: id.to_string(),
            kind: ThreadKind::Normal,
            label: "JobWorker".to_string(),
            frames: frames.iter().map(|f| f.to_string()).collect(),
        }
    }

    fn build(opt: Options, threads: &[Thread]) -> Result<Graph> {
        let mut builder = Builder::from(opt);
        for t in threads {
            builder.add_thread(t)?;
        }
        builder.finish()
    }

    fn labels(graph: &Graph) -> Vec<&str> {
        graph.nodes().iter().map(Node::label).collect()
    }

    fn contributors(node: &Node) -> HashSet<&str> {
        node.contributors().collect()
    }

    #[test]
    fn single_thread_forms_a_chain() {
        let graph = build(
            Options::default(),
            &[thread("t1", &["0x01 in funcA(int)", "0x02 in funcB(int)"])],
        )
        .unwrap();

        assert_eq!(labels(&graph), vec!["funcA", "funcB"]);
        let nodes = graph.nodes();
        assert_eq!(nodes[0].parents().collect::<Vec<_>>(), vec![None]);
        assert!(nodes[0].is_root());
        assert_eq!(nodes[1].parents().collect::<Vec<_>>(), vec![Some(0)]);
        assert!(!nodes[1].is_root());
        assert_eq!(contributors(&nodes[0]), hashset! {"t1"});
        assert_eq!(contributors(&nodes[1]), hashset! {"t1"});
        assert_eq!(graph.max_contributors(), 1);
        assert_eq!(graph.edges().collect::<Vec<_>>(), vec![(1, 0)]);
    }

    #[test]
    fn shared_root_is_merged() {
        let graph = build(
            Options::default(),
            &[
                thread("t1", &["0x01 in funcA(int)"]),
                thread("t2", &["0x01 in funcA(int)", "0x02 in funcC(int)"]),
            ],
        )
        .unwrap();

        assert_eq!(labels(&graph), vec!["funcA", "funcC"]);
        let nodes = graph.nodes();
        assert_eq!(contributors(&nodes[0]), hashset! {"t1", "t2"});
        assert_eq!(nodes[0].parents().collect::<Vec<_>>(), vec![None]);
        assert_eq!(nodes[1].parents().collect::<Vec<_>>(), vec![Some(0)]);
        assert_eq!(contributors(&nodes[1]), hashset! {"t2"});
        assert_eq!(graph.max_contributors(), 2);
    }

    #[test]
    fn identity_policy_changes_merging() {
        let threads = [thread("t1", &["0x01 in funcA(int)", "0x02 in funcA(long)"])];

        let by_label = build(Options::default(), &threads).unwrap();
        assert_eq!(labels(&by_label), vec!["funcA"]);
        // the second occurrence calls itself
        assert_eq!(
            by_label.nodes()[0].parents().collect::<Vec<_>>(),
            vec![None, Some(0)]
        );

        let by_id = Options {
            identity: IdentityPolicy::RawId,
            ..Default::default()
        };
        let by_id = build(by_id, &threads).unwrap();
        assert_eq!(labels(&by_id), vec!["funcA", "funcA"]);
        assert_eq!(
            by_id.nodes().iter().map(Node::raw_id).collect::<Vec<_>>(),
            vec!["0x01", "0x02"]
        );
    }

    #[test]
    fn raw_id_merge_keeps_first_label() {
        let opt = Options {
            identity: IdentityPolicy::RawId,
            ..Default::default()
        };
        let graph = build(
            opt,
            &[
                thread("t1", &["0x01 in funcA(int)"]),
                thread("t2", &["0x01 in funcZ(int)"]),
            ],
        )
        .unwrap();
        assert_eq!(labels(&graph), vec!["funcA"]);
        assert_eq!(graph.nodes()[0].contributor_count(), 2);
    }

    #[test]
    fn repeated_visits_do_not_duplicate() {
        let graph = build(
            Options::default(),
            &[
                thread("t1", &["0x01 in funcA(int)", "0x02 in funcB(int)"]),
                thread("t1", &["0x01 in funcA(int)", "0x02 in funcB(int)"]),
            ],
        )
        .unwrap();
        let nodes = graph.nodes();
        assert_eq!(nodes[1].parents().collect::<Vec<_>>(), vec![Some(0)]);
        assert_eq!(nodes[1].contributor_count(), 1);
        assert_eq!(graph.max_contributors(), 1);
        assert_eq!(graph.normal_threads(), 2);
    }

    #[test]
    fn thread_nodes_are_never_shared() {
        let opt = Options {
            plot_threads: true,
            ..Default::default()
        };
        let mut exception = thread("0", &["0x01 in funcA(int)"]);
        exception.kind = ThreadKind::Exception;
        exception.label = "Allocation failed".to_string();
        let graph = build(
            opt,
            &[
                thread("t1", &["0x01 in funcA(int)"]),
                thread("t1", &["0x01 in funcA(int)"]),
                exception,
            ],
        )
        .unwrap();

        let roles: Vec<_> = graph.nodes().iter().map(Node::role).collect();
        assert_eq!(
            roles,
            vec![Role::Thread, Role::Plain, Role::Thread, Role::Exception]
        );
        assert_eq!(
            graph.nodes()[1].parents().collect::<Vec<_>>(),
            vec![Some(0), Some(2), Some(3)]
        );
        assert_eq!(contributors(&graph.nodes()[1]), hashset! {"t1", "0"});
        assert_eq!(graph.max_contributors(), 2);
        assert_eq!((graph.normal_threads(), graph.exception_threads()), (2, 1));
        assert!(graph.plots_threads());
        assert!(graph.nodes()[0].is_root());
        assert!(!graph.nodes()[1].is_root());
    }

    #[test]
    fn label_keys_do_not_match_thread_nodes() {
        let opt = Options {
            identity: IdentityPolicy::RawId,
            plot_threads: true,
            ..Default::default()
        };
        // the frame id equals the thread id, but only frames are ever merged
        let graph = build(opt, &[thread("0x01", &["0x01 in funcA(int)"])]).unwrap();
        assert_eq!(graph.nodes().len(), 2);
    }

    #[test]
    fn no_frames_is_empty() {
        assert!(matches!(
            build(Options::default(), &[thread("t1", &[])]),
            Err(Error::Empty(_))
        ));

        // thread nodes alone do not count as frames
        let opt = Options {
            plot_threads: true,
            ..Default::default()
        };
        assert!(matches!(
            build(opt, &[thread("t1", &[])]),
            Err(Error::Empty(_))
        ));
    }

    #[test]
    fn malformed_frame_aborts() {
        let err = build(Options::default(), &[thread("t1", &["no delimiter"])]).unwrap_err();
        assert!(matches!(err, Error::MalformedFrame(ref l) if l == "no delimiter"));
    }

    #[test]
    fn max_contributors_matches_nodes() {
        let graph = from_lines(
            Options::default(),
            "\
[0] [thr=1]: A at
 1: 0x01 in f()
 2: 0x02 in g()
--
[1] [thr=2]: B at
 1: 0x03 in h()
 2: 0x02 in g()
--
[2] [thr=3]: C at
 1: 0x01 in f()
 2: 0x02 in g()
--"
            .lines(),
        )
        .unwrap();
        let max = graph
            .nodes()
            .iter()
            .map(Node::contributor_count)
            .max()
            .unwrap();
        assert_eq!(graph.max_contributors(), max);
        assert_eq!(max, 3);
        assert_eq!(
            graph.edges().collect::<Vec<_>>(),
            vec![(1, 0), (1, 2)]
        );
    }
}
