use std::fmt;

use rgb::RGB8;

use super::Role;

/// Fill color of thread boxes (cyan).
pub const THREAD: RGB8 = RGB8 {
    r: 0x00,
    g: 0xff,
    b: 0xff,
};

/// Fill color of exception boxes (orange).
pub const EXCEPTION: RGB8 = RGB8 {
    r: 0xff,
    g: 0xa5,
    b: 0x00,
};

/// Fill color of the legend (yellow).
pub const LEGEND: RGB8 = RGB8 {
    r: 0xff,
    g: 0xff,
    b: 0x00,
};

macro_rules! red {
    ($($gb:expr),*) => {
        [$(RGB8 { r: 0xff, g: $gb, b: $gb },)*]
    };
}

/// Fill colors of stack frames, from white (few threads) to red (most threads).
pub const RED_SCALE: [RGB8; 14] = red![
    0xff, 0xeb, 0xd8, 0xc4, 0xb1, 0x9d, 0x89, 0x76, 0x62, 0x4e, 0x3b, 0x27, 0x14, 0x00
];

/// The position in [`RED_SCALE`] for a frame that `contributors` out of at most
/// `max_contributors` threads pass through.
pub fn scale_index(contributors: usize, max_contributors: usize) -> usize {
    if max_contributors == 0 {
        return 0;
    }
    let last = RED_SCALE.len() - 1;
    let index = (contributors as f64 / max_contributors as f64 * last as f64) as usize;
    index.min(last)
}

/// The fill color of a node.
pub fn fill(role: Role, contributors: usize, max_contributors: usize) -> RGB8 {
    match role {
        Role::Thread => THREAD,
        Role::Exception => EXCEPTION,
        Role::Plain => RED_SCALE[scale_index(contributors, max_contributors)],
    }
}

/// Formats a color as `#rrggbb`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hex(pub RGB8);

impl fmt::Display for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0.r, self.0.g, self.0.b)
    }
}
