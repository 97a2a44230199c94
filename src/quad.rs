use std::ops::{Add, Mul, Sub};

/// A 2D point, in whatever coordinate space the context declares
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;

    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// A 2D size used as the pixel reference for unit coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Extent {
    pub width: f32,
    pub height: f32,
}

impl Extent {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// The four labeled corners of a quadrilateral, in clockwise declaration
/// order starting at the top left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    /// Wrapping constructor over the clockwise declaration order
    pub fn from_index(index: i32) -> Corner {
        Self::ALL[index.rem_euclid(4) as usize]
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|&c| c == self).expect("corner is in ALL")
    }

    /// The label `steps` corners away clockwise, counter-clockwise when
    /// negative. Pure label navigation; no stored position moves.
    pub fn clockwise(self, steps: i32) -> Corner {
        Self::from_index(self.index() as i32 + steps)
    }

    /// Unit vector pointing from this corner into the interior
    pub fn direction(self) -> Point {
        match self {
            Corner::TopLeft => Point::new(1.0, 1.0),
            Corner::TopRight => Point::new(-1.0, 1.0),
            Corner::BottomLeft => Point::new(1.0, -1.0),
            Corner::BottomRight => Point::new(-1.0, -1.0),
        }
    }
}

/// Four labeled corner points assumed to be a perspective view of a
/// rectangle.
///
/// Corners are stored in unit coordinates and scaled through the current
/// extent on every read and write, so the same model can serve views of
/// different pixel sizes. Corner identity is fixed at construction; nothing
/// here rotates labels. The corners are allowed to be dragged into
/// degenerate configurations; operations must tolerate that without
/// panicking, a degenerate crop is the caller's problem.
#[derive(Debug, Clone, PartialEq)]
pub struct Quadrilateral {
    top_left: Point,
    top_right: Point,
    bottom_left: Point,
    bottom_right: Point,
    extent: Extent,
}

impl Quadrilateral {
    /// Creates a quadrilateral from explicit unit-space corners
    pub fn from_unit_corners(
        top_left: Point,
        top_right: Point,
        bottom_left: Point,
        bottom_right: Point,
        extent: Extent,
    ) -> Self {
        Self {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
            extent,
        }
    }

    /// Creates the centered rectangle of the given fractional size in the
    /// unit square
    pub fn centered(size: Extent) -> Self {
        let min_x = (1.0 - size.width) / 2.0;
        let min_y = (1.0 - size.height) / 2.0;
        let max_x = min_x + size.width;
        let max_y = min_y + size.height;
        Self {
            top_left: Point::new(min_x, min_y),
            top_right: Point::new(max_x, min_y),
            bottom_right: Point::new(max_x, max_y),
            bottom_left: Point::new(min_x, max_y),
            extent: Extent::default(),
        }
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Records the pixel extent used to scale unit coordinates at access
    /// time. Stored unit corners are not rescaled.
    pub fn set_extent(&mut self, extent: Extent) {
        self.extent = extent;
    }

    pub fn unit_corner(&self, corner: Corner) -> Point {
        match corner {
            Corner::TopLeft => self.top_left,
            Corner::TopRight => self.top_right,
            Corner::BottomLeft => self.bottom_left,
            Corner::BottomRight => self.bottom_right,
        }
    }

    /// The corner scaled into pixel space through the current extent
    pub fn corner(&self, corner: Corner) -> Point {
        let unit = self.unit_corner(corner);
        Point::new(unit.x * self.extent.width, unit.y * self.extent.height)
    }

    /// Stores `position / extent` as the new unit corner.
    ///
    /// A zero extent dimension makes the stored coordinate non-finite;
    /// callers must set a real extent before mutating through pixel
    /// coordinates.
    pub fn set_corner(&mut self, corner: Corner, position: Point) {
        let unit = Point::new(position.x / self.extent.width, position.y / self.extent.height);
        match corner {
            Corner::TopLeft => self.top_left = unit,
            Corner::TopRight => self.top_right = unit,
            Corner::BottomLeft => self.bottom_left = unit,
            Corner::BottomRight => self.bottom_right = unit,
        }
    }

    /// The closed polygon through the corners in declaration order, in
    /// pixel space
    pub fn path(&self) -> [Point; 5] {
        [
            self.corner(Corner::TopLeft),
            self.corner(Corner::TopRight),
            self.corner(Corner::BottomRight),
            self.corner(Corner::BottomLeft),
            self.corner(Corner::TopLeft),
        ]
    }

    /// Overwrites this quadrilateral with another's corners and extent,
    /// restoring a working copy to its baseline
    pub fn reset_to(&mut self, other: &Quadrilateral) {
        self.extent = other.extent;
        self.top_left = other.top_left;
        self.top_right = other.top_right;
        self.bottom_right = other.bottom_right;
        self.bottom_left = other.bottom_left;
    }
}

/// Coordinate transforms for the magnified corner-editing mode.
///
/// When zoomed in on a corner, the view shows that corner's sub-quadrant of
/// the frame scaled by the zoom factor and anchored at the corner's side of
/// the frame. The two transforms are exact inverses of each other.
#[derive(Debug, Clone, Copy)]
pub struct CornerZoom {
    origin: Point,
    extent: Extent,
    factor: Point,
}

impl CornerZoom {
    pub const DEFAULT_FACTOR: f32 = 2.0;

    /// Creates the transform for a view frame at `origin` of size `extent`
    pub fn new(origin: Point, extent: Extent) -> Self {
        Self {
            origin,
            extent,
            factor: Point::new(Self::DEFAULT_FACTOR, Self::DEFAULT_FACTOR),
        }
    }

    /// Frame-space displacement of the anchored corner's sub-quadrant
    fn zoom_offset(&self, corner: Corner) -> Point {
        match corner {
            Corner::TopLeft => Point::new(0.0, 0.0),
            Corner::TopRight => Point::new(self.extent.width, 0.0),
            Corner::BottomLeft => Point::new(0.0, self.extent.height),
            Corner::BottomRight => Point::new(self.extent.width, self.extent.height),
        }
    }

    /// Where `position` appears while the view is zoomed into `anchor`'s
    /// quadrant
    pub fn zoomed_position(&self, position: Point, anchor: Corner) -> Point {
        let k = self.origin;
        let scaled = Point::new(
            (position.x - k.x) * self.factor.x,
            (position.y - k.y) * self.factor.y,
        );
        let offset = self.zoom_offset(anchor);
        scaled - offset + k
    }

    /// Maps a position seen in `anchor`'s zoomed quadrant back to frame
    /// coordinates; the inverse of [`CornerZoom::zoomed_position`]
    pub fn unzoomed_position(&self, position: Point, anchor: Corner) -> Point {
        let k = self.origin;
        let offset = self.zoom_offset(anchor);
        Point::new(
            (position.x - k.x + offset.x) / self.factor.x + k.x,
            (position.y - k.y + offset.y) / self.factor.y + k.y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point_eq(a: Point, b: Point) {
        assert!((a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4, "{a:?} != {b:?}");
    }

    #[test]
    fn test_centered_half_size_on_hundred_extent() {
        let mut quad = Quadrilateral::centered(Extent::new(0.5, 0.5));
        quad.set_extent(Extent::new(100.0, 100.0));

        assert_point_eq(quad.corner(Corner::TopLeft), Point::new(25.0, 25.0));
        assert_point_eq(quad.corner(Corner::TopRight), Point::new(75.0, 25.0));
        assert_point_eq(quad.corner(Corner::BottomRight), Point::new(75.0, 75.0));
        assert_point_eq(quad.corner(Corner::BottomLeft), Point::new(25.0, 75.0));
    }

    #[test]
    fn test_set_extent_only_rescales_at_access_time() {
        let mut quad = Quadrilateral::centered(Extent::new(0.5, 0.5));
        quad.set_extent(Extent::new(100.0, 100.0));
        let before = quad.corner(Corner::TopLeft);
        quad.set_extent(Extent::new(200.0, 200.0));
        assert_point_eq(quad.corner(Corner::TopLeft), before * 2.0);
    }

    #[test]
    fn test_corner_set_stores_unit_coordinates() {
        let mut quad = Quadrilateral::centered(Extent::new(0.5, 0.5));
        quad.set_extent(Extent::new(200.0, 100.0));
        quad.set_corner(Corner::TopLeft, Point::new(20.0, 30.0));
        assert_point_eq(quad.unit_corner(Corner::TopLeft), Point::new(0.1, 0.3));
        assert_point_eq(quad.corner(Corner::TopLeft), Point::new(20.0, 30.0));
    }

    #[test]
    fn test_copy_isolates_values() {
        let mut original = Quadrilateral::centered(Extent::new(0.5, 0.5));
        original.set_extent(Extent::new(100.0, 100.0));
        let baseline = original.corner(Corner::TopLeft);

        let mut copy = original.clone();
        copy.set_corner(Corner::TopLeft, Point::new(1.0, 2.0));

        assert_point_eq(original.corner(Corner::TopLeft), baseline);

        original.reset_to(&copy);
        assert_point_eq(original.corner(Corner::TopLeft), Point::new(1.0, 2.0));
    }

    #[test]
    fn test_path_is_closed_in_declaration_order() {
        let mut quad = Quadrilateral::centered(Extent::new(1.0, 1.0));
        quad.set_extent(Extent::new(10.0, 10.0));
        let path = quad.path();
        assert_eq!(path[0], path[4]);
        assert_point_eq(path[1], Point::new(10.0, 0.0));
        assert_point_eq(path[3], Point::new(0.0, 10.0));
    }

    #[test]
    fn test_clockwise_navigation_wraps() {
        assert_eq!(Corner::TopLeft.clockwise(1), Corner::TopRight);
        assert_eq!(Corner::TopLeft.clockwise(-1), Corner::BottomLeft);
        assert_eq!(Corner::BottomLeft.clockwise(1), Corner::TopLeft);
        assert_eq!(Corner::TopRight.clockwise(6), Corner::BottomLeft);
        assert_eq!(Corner::from_index(-3), Corner::TopRight);
    }

    #[test]
    fn test_zoom_round_trips_every_corner() {
        let zoom = CornerZoom::new(Point::new(12.0, 7.0), Extent::new(400.0, 600.0));
        for corner in Corner::ALL {
            for (x, y) in [(13.0, 8.0), (200.0, 300.0), (111.5, 42.25)] {
                let p = Point::new(x, y);
                let round_tripped = zoom.unzoomed_position(zoom.zoomed_position(p, corner), corner);
                assert_point_eq(round_tripped, p);
            }
        }
    }

    #[test]
    fn test_zoomed_anchor_corner_is_fixed_at_its_frame_side() {
        let zoom = CornerZoom::new(Point::new(0.0, 0.0), Extent::new(100.0, 100.0));
        // the bottom-right frame corner stays put when zoomed into it
        let p = Point::new(100.0, 100.0);
        assert_point_eq(zoom.zoomed_position(p, Corner::BottomRight), p);
        // ... and the frame origin stays put for the top-left corner
        let origin = Point::new(0.0, 0.0);
        assert_point_eq(zoom.zoomed_position(origin, Corner::TopLeft), origin);
    }

    #[test]
    fn test_degenerate_corner_positions_do_not_panic() {
        let mut quad = Quadrilateral::centered(Extent::new(0.5, 0.5));
        quad.set_extent(Extent::new(100.0, 100.0));
        // drag every corner onto the same point; still well-defined
        for corner in Corner::ALL {
            quad.set_corner(corner, Point::new(50.0, 50.0));
        }
        let path = quad.path();
        assert_point_eq(path[0], path[2]);
    }
}
