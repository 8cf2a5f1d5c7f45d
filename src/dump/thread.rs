use crate::error::{Error, Result};

const THREAD_MARKER: &str = "[thr=";
const THREAD_ID_END: &str = "]: ";
const THREAD_TYPE_END: &str = " at";
const INACTIVE: &str = "inactive";
const EXCEPTION_START: &str = "Allocation failed";
const EXCEPTION_HEADER: &str = "exception throw location";
const SEPARATOR: &str = "--";
pub(crate) const FRAME_DELIMITER: &str = " in ";

/// Whether a stack belongs to a running thread or to a pending exception.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ThreadKind {
    /// A regular thread, identified by its thread id.
    Normal,
    /// A pending exception. Dumps do not number these, so they are numbered in order of
    /// appearance, starting at zero.
    Exception,
}

/// The stack of one thread or exception, as found in the dump.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Thread {
    /// The thread id, or the sequence number of the exception.
    pub id: String,
    /// Normal or exception.
    pub kind: ThreadKind,
    /// The thread type (e.g. `SqlExecutor`), or the exception's reason.
    pub label: String,
    /// The raw stack lines, innermost frame first.
    pub frames: Vec<String>,
}

/// All threads of a short stack section, in the order they appear.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Threads {
    /// The threads and exceptions.
    pub threads: Vec<Thread>,
    /// How many of `threads` are normal threads.
    pub normal: usize,
    /// How many of `threads` are exceptions.
    pub exceptions: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Outside,
    InNormalThread,
    InExceptionThread,
}

/// Splits the lines of a short stack section into threads.
///
/// A thread starts at a line holding a `[thr=<id>]: <type> at` header that is not marked
/// inactive, and an exception starts at an `Allocation failed` line. Every following line is
/// a stack frame until the thread ends: at a `--` separator, or at an `exception ... no.`
/// header for normal threads, and at a `--` separator or a blank line for exceptions. The
/// `exception throw location` header inside an exception is skipped.
///
/// Every stack frame must contain ` in `; anything else means the section is not what we
/// think it is, and [`Error::MalformedFrame`] is returned. Finding no threads at all is an
/// [`Error::Empty`].
///
/// Stacks of data tiering threads use a different layout and are not supported.
pub fn segment<'l, I>(lines: I) -> Result<Threads>
where
    I: IntoIterator<Item = &'l str>,
{
    let mut result = Threads::default();
    let mut state = State::Outside;
    for line in lines {
        match state {
            State::Outside => {
                if line.contains(THREAD_MARKER) && !line.contains(INACTIVE) {
                    result.threads.push(normal_thread(line));
                    result.normal += 1;
                    state = State::InNormalThread;
                } else if line.contains(EXCEPTION_START) {
                    result.threads.push(exception_thread(line, result.exceptions));
                    result.exceptions += 1;
                    state = State::InExceptionThread;
                }
            }
            State::InNormalThread => {
                if line == SEPARATOR || (line.contains("exception") && line.contains("no.")) {
                    state = State::Outside;
                } else {
                    add_frame(&mut result, line)?;
                }
            }
            State::InExceptionThread => {
                if line == SEPARATOR || line.is_empty() {
                    state = State::Outside;
                } else {
                    add_frame(&mut result, line)?;
                }
            }
        }
    }

    if result.threads.is_empty() {
        return Err(Error::Empty("no threads were found in the short stack section"));
    }
    Ok(result)
}

fn add_frame(result: &mut Threads, line: &str) -> Result<()> {
    if line.contains(EXCEPTION_HEADER) {
        return Ok(());
    }
    if !line.contains(FRAME_DELIMITER) {
        return Err(Error::MalformedFrame(line.to_string()));
    }
    // we are only ever inside a thread after having pushed one
    if let Some(thread) = result.threads.last_mut() {
        thread.frames.push(line.to_string());
    }
    Ok(())
}

// [12] [thr=19134]: SqlExecutor at
fn normal_thread(line: &str) -> Thread {
    let after_marker = line
        .split_once(THREAD_MARKER)
        .map(|(_, rest)| rest)
        .unwrap_or_default();
    let id = after_marker
        .split(THREAD_ID_END)
        .next()
        .unwrap_or_default();
    let label = line
        .split_once(THREAD_ID_END)
        .map(|(_, rest)| rest.split(THREAD_TYPE_END).next().unwrap_or_default())
        .unwrap_or_default();
    Thread {
        id: id.to_string(),
        kind: ThreadKind::Normal,
        label: label.to_string(),
        frames: Vec::new(),
    }
}

//     Allocation failed ; $size$=1048576; $name$=Pool/RowEngine; $type$=pool
fn exception_thread(line: &str, nth: usize) -> Thread {
    Thread {
        id: nth.to_string(),
        kind: ThreadKind::Exception,
        label: line.trim_matches(' ').replace('$', ""),
        frames: Vec::new(),
    }
}
