//! Geometric primitives making up instrument components and walls, and the
//! planar rigid transforms positioning them.

use geo_types::{coord, Coord};

/// Rigid motion in the instrument plane: a rotation about z followed by a
/// translation. This is the x/y projection of the homogeneous component
/// poses; composing transforms along the axis chain stays closed in this
/// form.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Trafo {
    rot: f64,
    pos: Coord<f64>,
}

impl Default for Trafo {
    fn default() -> Self {
        Self::identity()
    }
}

impl Trafo {
    pub fn identity() -> Self {
        Self {
            rot: 0.,
            pos: coord! { x: 0., y: 0. },
        }
    }

    pub fn rotation(angle: f64) -> Self {
        Self {
            rot: angle,
            pos: coord! { x: 0., y: 0. },
        }
    }

    pub fn translation(x: f64, y: f64) -> Self {
        Self {
            rot: 0.,
            pos: coord! { x: x, y: y },
        }
    }

    pub fn rotation_angle(&self) -> f64 {
        self.rot
    }

    pub fn translation_part(&self) -> Coord<f64> {
        self.pos
    }

    /// `self ∘ other`: apply `other` first, then `self`.
    pub fn compose(&self, other: &Trafo) -> Trafo {
        let (sin, cos) = self.rot.sin_cos();
        let rotated = coord! {
            x: cos * other.pos.x - sin * other.pos.y,
            y: sin * other.pos.x + cos * other.pos.y,
        };

        Trafo {
            rot: self.rot + other.rot,
            pos: self.pos + rotated,
        }
    }

    pub fn apply(&self, pt: Coord<f64>) -> Coord<f64> {
        let (sin, cos) = self.rot.sin_cos();
        coord! {
            x: cos * pt.x - sin * pt.y + self.pos.x,
            y: sin * pt.x + cos * pt.y + self.pos.y,
        }
    }
}

/// A rigid component or wall: a box, cylinder or sphere.
///
/// Boxes project to 4-vertex convex polygons in the instrument plane,
/// cylinders and spheres to circles.
#[derive(Clone, Debug)]
pub enum Geometry {
    Box {
        id: String,
        pos: [f64; 3],
        rot: f64,
        length: f64,
        depth: f64,
        height: f64,
    },
    Cylinder {
        id: String,
        pos: [f64; 3],
        radius: f64,
        height: f64,
    },
    Sphere {
        id: String,
        pos: [f64; 3],
        radius: f64,
    },
}

impl Geometry {
    pub fn id(&self) -> &str {
        match self {
            Geometry::Box { id, .. } => id,
            Geometry::Cylinder { id, .. } => id,
            Geometry::Sphere { id, .. } => id,
        }
    }

    pub fn set_id(&mut self, new_id: &str) {
        match self {
            Geometry::Box { id, .. } => *id = new_id.to_owned(),
            Geometry::Cylinder { id, .. } => *id = new_id.to_owned(),
            Geometry::Sphere { id, .. } => *id = new_id.to_owned(),
        }
    }

    pub fn centre(&self) -> [f64; 3] {
        match self {
            Geometry::Box { pos, .. }
            | Geometry::Cylinder { pos, .. }
            | Geometry::Sphere { pos, .. } => *pos,
        }
    }

    pub fn set_centre(&mut self, new_pos: [f64; 3]) {
        match self {
            Geometry::Box { pos, .. }
            | Geometry::Cylinder { pos, .. }
            | Geometry::Sphere { pos, .. } => *pos = new_pos,
        }
    }

    /// Rotate the object about z (only meaningful for boxes).
    pub fn rotate(&mut self, angle: f64) {
        if let Geometry::Box { rot, .. } = self {
            *rot += angle;
        }
    }

    /// The planar pose of the object.
    pub fn trafo(&self) -> Trafo {
        let pos = self.centre();
        let rot = match self {
            Geometry::Box { rot, .. } => *rot,
            _ => 0.,
        };
        Trafo::translation(pos[0], pos[1]).compose(&Trafo::rotation(rot))
    }

    /// Project to a circle in the instrument plane, if the shape is round.
    /// `frame` is the pose of the owning axis frame.
    pub fn circle_2d(&self, frame: &Trafo) -> Option<(Coord<f64>, f64)> {
        let radius = match self {
            Geometry::Cylinder { radius, .. } | Geometry::Sphere { radius, .. } => *radius,
            Geometry::Box { .. } => return None,
        };

        let trafo = frame.compose(&self.trafo());
        Some((trafo.apply(coord! { x: 0., y: 0. }), radius))
    }

    /// Project to a convex polygon in the instrument plane, if the shape is
    /// a box.
    pub fn polygon_2d(&self, frame: &Trafo) -> Option<Vec<Coord<f64>>> {
        let Geometry::Box { length, depth, .. } = self else {
            return None;
        };

        let lx = length * 0.5;
        let ly = depth * 0.5;
        let trafo = frame.compose(&self.trafo());

        Some(vec![
            trafo.apply(coord! { x:  lx, y: -ly }),
            trafo.apply(coord! { x: -lx, y: -ly }),
            trafo.apply(coord! { x: -lx, y:  ly }),
            trafo.apply(coord! { x:  lx, y:  ly }),
        ])
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn trafo_composition() {
        // rotate by 90°, then shift
        let trafo = Trafo::translation(1., 2.).compose(&Trafo::rotation(FRAC_PI_2));
        let pt = trafo.apply(coord! { x: 1., y: 0. });
        assert_relative_eq!(pt.x, 1., epsilon = 1e-12);
        assert_relative_eq!(pt.y, 3., epsilon = 1e-12);

        // composition is associative
        let a = Trafo::rotation(0.3);
        let b = Trafo::translation(2., -1.);
        let c = Trafo::rotation(-1.1);
        let p = coord! { x: 0.5, y: 0.7 };
        let lhs = a.compose(&b.compose(&c)).apply(p);
        let rhs = a.compose(&b).compose(&c).apply(p);
        assert_relative_eq!(lhs.x, rhs.x, epsilon = 1e-12);
        assert_relative_eq!(lhs.y, rhs.y, epsilon = 1e-12);
    }

    #[test]
    fn box_projection() {
        let geo = Geometry::Box {
            id: "wall".into(),
            pos: [0., 2., 0.],
            rot: 0.,
            length: 10.,
            depth: 0.2,
            height: 1.,
        };

        let poly = geo.polygon_2d(&Trafo::identity()).unwrap();
        assert_eq!(poly.len(), 4);
        let min_y = poly.iter().map(|v| v.y).fold(f64::INFINITY, f64::min);
        let max_x = poly.iter().map(|v| v.x).fold(f64::NEG_INFINITY, f64::max);
        assert_relative_eq!(min_y, 1.9);
        assert_relative_eq!(max_x, 5.0);

        assert!(geo.circle_2d(&Trafo::identity()).is_none());
    }

    #[test]
    fn cylinder_projection() {
        let geo = Geometry::Cylinder {
            id: "det".into(),
            pos: [1., 0., 0.],
            radius: 0.5,
            height: 1.,
        };

        // a frame rotated by 90° carries the cylinder to the y axis
        let frame = Trafo::rotation(FRAC_PI_2);
        let (org, rad) = geo.circle_2d(&frame).unwrap();
        assert_relative_eq!(org.x, 0., epsilon = 1e-12);
        assert_relative_eq!(org.y, 1., epsilon = 1e-12);
        assert_relative_eq!(rad, 0.5);

        assert!(geo.polygon_2d(&frame).is_none());
    }
}
