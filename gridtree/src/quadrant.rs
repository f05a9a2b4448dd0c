use common::shapes::{Position, Region};

/// How far outside a cell edge a neighbor probe lands.
pub const PROBE_OFFSET: f32 = 1e-3;

/// The four quarters of a branch region. Ordering matches the child slot
/// layout used by split branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    BottomLeft,
    BottomRight,
    TopLeft,
    TopRight,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::BottomLeft,
        Quadrant::BottomRight,
        Quadrant::TopLeft,
        Quadrant::TopRight,
    ];

    pub fn index(self) -> usize {
        match self {
            Quadrant::BottomLeft => 0,
            Quadrant::BottomRight => 1,
            Quadrant::TopLeft => 2,
            Quadrant::TopRight => 3,
        }
    }

    /// Route a point relative to a region center. On each axis
    /// independently, `center <= point` routes to the greater side, so a
    /// point exactly on the center lands in the top-right quadrant. This
    /// asymmetry is what makes a merge followed by a resplit put every
    /// handle back where it was.
    pub fn classify(center: (f32, f32), position: Position) -> Quadrant {
        let east = center.0 <= position.x;
        let north = center.1 <= position.y;
        match (east, north) {
            (true, true) => Quadrant::TopRight,
            (true, false) => Quadrant::BottomRight,
            (false, true) => Quadrant::TopLeft,
            (false, false) => Quadrant::BottomLeft,
        }
    }

    /// The quarter of `parent` this quadrant occupies.
    pub fn sub_region(self, parent: &Region) -> Region {
        let half_w = parent.width / 2.0;
        let half_h = parent.height / 2.0;
        let (dx, dy) = match self {
            Quadrant::BottomLeft => (0.0, 0.0),
            Quadrant::BottomRight => (half_w, 0.0),
            Quadrant::TopLeft => (0.0, half_h),
            Quadrant::TopRight => (half_w, half_h),
        };
        Region::new(parent.x + dx, parent.y + dy, half_w, half_h)
    }
}

/// Cardinal directions for neighbor probing. No diagonals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Bottom,
    Top,
}

/// A point just outside `region` along `direction`. Only the probed axis
/// changes; the other axis and z pass through untouched. The caller is
/// expected to re-submit the result to the index to reach the adjacent
/// cell's occupants.
pub fn probe_position(region: &Region, position: Position, direction: Direction) -> Position {
    match direction {
        Direction::Left => Position::with_z(region.left() - PROBE_OFFSET, position.y, position.z),
        Direction::Right => Position::with_z(region.right() + PROBE_OFFSET, position.y, position.z),
        Direction::Bottom => Position::with_z(position.x, region.bottom() - PROBE_OFFSET, position.z),
        Direction::Top => Position::with_z(position.x, region.top() + PROBE_OFFSET, position.z),
    }
}
