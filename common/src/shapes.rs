use rand::Rng;

/// A world position. Partitioning happens on the x/y plane; z is carried
/// along untouched so hosts can keep a vertical coordinate on everything
/// they track.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn with_z(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }
}

/// An axis-aligned region anchored at its lesser corner.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Region {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y
    }

    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Half-open containment: the lesser edges belong to the region, the
    /// greater edges belong to the neighbor.
    pub fn contains(&self, position: Position) -> bool {
        position.x >= self.left()
            && position.x < self.right()
            && position.y >= self.bottom()
            && position.y < self.top()
    }

    pub fn random_position_inside<R: Rng>(&self, rng: &mut R) -> Position {
        Position::new(
            self._safe_randf32(rng, self.left(), self.right()),
            self._safe_randf32(rng, self.bottom(), self.top()),
        )
    }

    fn _safe_randf32<R: Rng>(&self, rng: &mut R, min: f32, max: f32) -> f32 {
        if min >= max {
            return min;
        }
        rng.gen_range(min..max)
    }
}

impl Default for Region {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
        }
    }
}
