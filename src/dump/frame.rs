use std::str::FromStr;

use crate::dump::thread::FRAME_DELIMITER;
use crate::error::{Error, Result};

// `unsigned long` return types would otherwise be split at their ` in `.
const FRAME_DELIMITER_UNSIGNED_LONG: &str = " in unsigned long ";
const HEX_OFFSET: &str = "+0x";
const MANGLED_MARKER: &str = "_ZN";
const MANGLED_SUFFIX: &str = "ER";
const MANGLED_PREFIX_CHARS: &[char] = &['_', 'Z', 'N', 'K'];

/// How much of a stack function to keep as its label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LabelLength {
    /// Everything up to the first `(`, i.e. the function name without its arguments.
    #[default]
    UntilParen,
    /// The first `n` characters.
    Chars(usize),
}

impl From<i64> for LabelLength {
    /// Negative lengths mean [`LabelLength::UntilParen`].
    fn from(n: i64) -> Self {
        if n < 0 {
            LabelLength::UntilParen
        } else {
            LabelLength::Chars(n as usize)
        }
    }
}

impl FromStr for LabelLength {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(LabelLength::from)
            .map_err(|_| format!("label length must be an integer, got {:?}", s))
    }
}

/// Settings that change how stack lines are turned into labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Options {
    /// How much of the function to keep. Default is [`LabelLength::UntilParen`].
    ///
    /// Note that when frames are merged by label, this also decides which frames merge.
    pub label_length: LabelLength,

    /// Remove a `+0x...` offset from the label (up to the next space). Only has an effect with
    /// [`LabelLength::Chars`], since the offset follows the argument list. Default is `true`.
    pub strip_hex: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            label_length: LabelLength::UntilParen,
            strip_hex: true,
        }
    }
}

/// A stack line, split into its address and a display label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// The hexadecimal address of the frame, as written in the dump.
    pub id: String,
    /// The normalized function, safe to put into a `dot` record label.
    pub label: String,
}

/// Splits a stack line like
///
/// ```text
///  1: 0x00007f5b4a1e1a10 in Execution::ContextFunctor::operator()(Execution::Context&)+0x4d0 at Context.cpp:1022 (libhdbbasis.so)
/// ```
///
/// into its address (`0x00007f5b4a1e1a10`) and a label derived from the function according
/// to `opt` (`Execution::ContextFunctor::operator` by default).
///
/// `<` and `>` are replaced by `&lt;` and `&gt;`, and labels of mangled symbols are cleaned
/// up with [`demangle_scopes`].
pub fn normalize(line: &str, opt: &Options) -> Result<Frame> {
    let delimiter = if line.contains(FRAME_DELIMITER_UNSIGNED_LONG) {
        FRAME_DELIMITER_UNSIGNED_LONG
    } else {
        FRAME_DELIMITER
    };
    let (location, function) = match line.split_once(delimiter) {
        Some(parts) => parts,
        None => return Err(Error::MalformedFrame(line.to_string())),
    };

    // " 1: 0x00007f5b4a1e1a10" -- the frame number comes first, unless it is missing
    let mut tokens = location.split_whitespace();
    let first = tokens.next().unwrap_or_default();
    let id = tokens.next().unwrap_or(first);

    let function = function.trim_matches(' ');
    let mut label = match opt.label_length {
        LabelLength::UntilParen => function.split('(').next().unwrap_or_default().to_string(),
        LabelLength::Chars(n) => {
            let truncated = match function.char_indices().nth(n) {
                Some((end, _)) => &function[..end],
                None => function,
            };
            if opt.strip_hex {
                strip_hex_offset(truncated)
            } else {
                truncated.to_string()
            }
        }
    };

    label = label.replace('<', "&lt;").replace('>', "&gt;");
    let label = label.trim_matches('\n');
    let label = if label.contains(MANGLED_MARKER) {
        demangle_scopes(label)
    } else {
        label.to_string()
    };

    Ok(Frame {
        id: id.to_string(),
        label,
    })
}

// Removes "+0x4d0"-style offsets, i.e. everything from "+0x" up to the next space.
fn strip_hex_offset(label: &str) -> String {
    let start = match label.find(HEX_OFFSET) {
        Some(start) => start,
        None => return label.to_string(),
    };
    let offset = match label[start..].find(' ') {
        Some(len) => &label[start..start + len],
        None => &label[start..],
    };
    label.replace(offset, "")
}

/// Turns a mangled C++ symbol like `_ZN9Execution15ContextFunctor3runERKNS_7ContextE` into a
/// readable scope path like `Execution::ContextFunctor::run`.
///
/// Anything from the first `ER` on is dropped, and so is any run of `_`, `Z`, `N` and `K`
/// characters at either end. Every remaining digit becomes a `::` separator; doubled
/// separators are then collapsed once, and separators at either end are removed.
///
/// This is not a demangler. The result is only meant to be stable and readable, and since
/// frames may be merged by label, it must not change between versions.
pub fn demangle_scopes(symbol: &str) -> String {
    let symbol = symbol.split(MANGLED_SUFFIX).next().unwrap_or_default();
    let symbol = symbol.trim_matches(MANGLED_PREFIX_CHARS);

    let mut scoped = String::with_capacity(symbol.len() * 2);
    for c in symbol.chars() {
        if c.is_ascii_digit() {
            scoped.push_str("::");
        } else {
            scoped.push(c);
        }
    }
    scoped.replace("::::", "::").trim_matches(':').to_string()
}
