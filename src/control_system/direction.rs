use std::fmt;

/// The four fixed approaches of the intersection.
///
/// Declaration order is the standard rotation order. The set is closed:
/// anything else coming in from the detection side is rejected at the
/// boundary, never added here. On the wire a direction travels as its
/// `label()` string and comes back in through `parse()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// All approaches in the standard rotation order.
    pub const ROTATION: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// Parses a direction label coming from the detection side.
    /// Returns `None` for anything outside the fixed set.
    pub fn parse(label: &str) -> Option<Direction> {
        match label.trim().to_lowercase().as_str() {
            "north" | "n" => Some(Direction::North),
            "south" | "s" => Some(Direction::South),
            "east" | "e" => Some(Direction::East),
            "west" | "w" => Some(Direction::West),
            _ => None,
        }
    }

    /// The label used on the wire and in log output.
    pub fn label(&self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
