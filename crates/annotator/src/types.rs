use serde::{Deserialize, Serialize};
use geo_types::{Coord, LineString, Polygon};

use crate::intensity::Rescale;

/// Minimum number of points for a contour to count as a polygon.
pub const MIN_CONTOUR_POINTS: usize = 3;

/// Width and height of a slice in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of samples in a row-major buffer of this size
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Row-major index of `(x, y)`, if it lies inside the image
    pub fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Clamp signed pointer coordinates into `[0, width-1] x [0, height-1]`.
    pub fn clamp(&self, x: i64, y: i64) -> Point {
        let max_x = i64::from(self.width.saturating_sub(1));
        let max_y = i64::from(self.height.saturating_sub(1));
        Point::new(x.clamp(0, max_x) as u32, y.clamp(0, max_y) as u32)
    }
}

/// Scalar metadata and raw samples extracted from an image file
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSlice {
    pub dimensions: Dimensions,
    pub bits_allocated: u16,
    /// Window center as stored in the file, if any
    pub window_center: Option<f64>,
    /// Window width as stored in the file, if any
    pub window_width: Option<f64>,
    pub rescale: Rescale,
    pub modality: Option<String>,
    pub transfer_syntax: String,
    /// Row-major stored samples of the first frame
    pub samples: Vec<u16>,
}

/// A pixel position. Serialized as an `[x, y]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl From<[u32; 2]> for Point {
    fn from([x, y]: [u32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [u32; 2] {
    fn from(point: Point) -> Self {
        [point.x, point.y]
    }
}

/// A user-drawn polygon, points kept in drawing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Contour {
    points: Vec<Point>,
}

impl Contour {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A contour is exportable once it has at least three points
    pub fn is_valid(&self) -> bool {
        self.points.len() >= MIN_CONTOUR_POINTS
    }

    /// Convert to a closed geo-types polygon for geometric operations
    pub fn to_geo_polygon(&self) -> Polygon<f64> {
        let coords: Vec<Coord<f64>> = self
            .points
            .iter()
            .map(|p| Coord { x: f64::from(p.x), y: f64::from(p.y) })
            .collect();
        Polygon::new(LineString::new(coords), vec![])
    }

    /// Enclosed area in square pixels
    pub fn area(&self) -> f64 {
        use geo::Area;
        if !self.is_valid() {
            return 0.0;
        }
        self.to_geo_polygon().unsigned_area()
    }

    /// Length of the closed outline in pixels
    pub fn perimeter(&self) -> f64 {
        use geo::EuclideanLength;
        self.to_geo_polygon().exterior().euclidean_length()
    }

    pub fn summary(&self) -> ContourSummary {
        ContourSummary {
            points: self.len(),
            area: self.area(),
            perimeter: self.perimeter(),
            bounding_box: self.bounding_box(),
        }
    }

    /// Inclusive bounding box as `(min, max)`, `None` for an empty contour
    pub fn bounding_box(&self) -> Option<(Point, Point)> {
        let first = *self.points.first()?;
        Some(self.points.iter().fold((first, first), |(min, max), p| {
            (
                Point::new(min.x.min(p.x), min.y.min(p.y)),
                Point::new(max.x.max(p.x), max.y.max(p.y)),
            )
        }))
    }
}

/// Measurements of one contour, as reported after an annotation run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContourSummary {
    pub points: usize,
    pub area: f64,
    pub perimeter: f64,
    pub bounding_box: Option<(Point, Point)>,
}

impl std::fmt::Display for ContourSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} points, area {:.1} px², perimeter {:.1} px",
            self.points, self.area, self.perimeter
        )?;
        if let Some((min, max)) = self.bounding_box {
            write!(f, ", bounds ({}, {})..({}, {})", min.x, min.y, max.x, max.y)?;
        }
        Ok(())
    }
}

/// One full annotation state: every contour plus the one receiving points.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContourSet {
    contours: Vec<Contour>,
    active_index: usize,
}

impl ContourSet {
    /// The state created by the very first point of a session
    pub fn starting_at(point: Point) -> Self {
        Self {
            contours: vec![Contour::from_points(vec![point])],
            active_index: 0,
        }
    }

    /// Finished contours followed by an empty one awaiting points.
    pub fn with_pending(mut contours: Vec<Contour>) -> Self {
        let active_index = contours.len();
        contours.push(Contour::new());
        Self { contours, active_index }
    }

    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn active_contour(&self) -> Option<&Contour> {
        self.contours.get(self.active_index)
    }

    /// Contours with at least three points, in drawing order
    pub fn valid_contours(&self) -> impl Iterator<Item = &Contour> {
        self.contours.iter().filter(|c| c.is_valid())
    }

    /// Copy of this state with `point` added.
    ///
    /// The point extends the active contour when it is the last one; any
    /// other active index starts a fresh contour at the tail.
    pub fn with_point(&self, point: Point) -> Self {
        let mut next = self.clone();
        let active_is_tail = next.contours.len().checked_sub(1) == Some(next.active_index);
        if active_is_tail {
            next.contours[next.active_index].push(point);
        } else {
            next.contours.push(Contour::from_points(vec![point]));
            next.active_index = next.contours.len() - 1;
        }
        next
    }

    /// Copy of this state with the active index moved past the current
    /// contour and an empty contour waiting there.
    pub fn advanced(&self) -> Self {
        let mut next = self.clone();
        next.active_index += 1;
        while next.contours.len() <= next.active_index {
            next.contours.push(Contour::new());
        }
        next
    }
}
