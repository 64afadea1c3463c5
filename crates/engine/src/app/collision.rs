use super::Vec2;

/// Axis-aligned rectangle in surface pixels. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Bounds {
    /// Negative sizes are clamped to zero so every `Bounds` is a valid box.
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            x,
            y,
            w: w.max(0.0),
            h: h.max(0.0),
        }
    }

    pub fn from_position_size(position: Vec2, size: Vec2) -> Self {
        Self::new(position.x, position.y, size.x, size.y)
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2 {
            x: self.x + self.w * 0.5,
            y: self.y + self.h * 0.5,
        }
    }

    pub fn inflate(&self, amount: f32) -> Self {
        Self::new(
            self.x - amount,
            self.y - amount,
            self.w + amount * 2.0,
            self.h + amount * 2.0,
        )
    }
}

/// Strict overlap: rectangles that only share an edge do not collide.
pub fn is_colliding(a: &Bounds, b: &Bounds) -> bool {
    a.x < b.right() && a.right() > b.x && a.y < b.bottom() && a.bottom() > b.y
}

/// Closed-interval point test used for pointer hover. A point on the right or
/// bottom edge still counts, unlike [`is_colliding`].
pub fn contains_point(bounds: &Bounds, point: Vec2) -> bool {
    point.x >= bounds.x
        && point.x <= bounds.right()
        && point.y >= bounds.y
        && point.y <= bounds.bottom()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Bounds {
        Bounds::new(x, y, w, h)
    }

    #[test]
    fn overlapping_rects_collide() {
        assert!(is_colliding(
            &rect(0.0, 0.0, 10.0, 10.0),
            &rect(5.0, 5.0, 10.0, 10.0)
        ));
    }

    #[test]
    fn touching_edges_do_not_collide() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        assert!(!is_colliding(&a, &rect(10.0, 0.0, 10.0, 10.0)));
        assert!(!is_colliding(&a, &rect(0.0, 10.0, 10.0, 10.0)));
        assert!(!is_colliding(&a, &rect(-10.0, -10.0, 10.0, 10.0)));
    }

    #[test]
    fn collision_is_symmetric() {
        let cases = [
            (rect(0.0, 0.0, 10.0, 10.0), rect(5.0, 5.0, 10.0, 10.0)),
            (rect(0.0, 0.0, 10.0, 10.0), rect(10.0, 0.0, 10.0, 10.0)),
            (rect(-3.0, 2.0, 4.0, 1.0), rect(0.0, 2.5, 0.5, 0.5)),
            (rect(0.0, 0.0, 100.0, 100.0), rect(40.0, 40.0, 2.0, 2.0)),
            (rect(0.0, 0.0, 1.0, 1.0), rect(50.0, 50.0, 1.0, 1.0)),
        ];
        for (a, b) in cases {
            assert_eq!(is_colliding(&a, &b), is_colliding(&b, &a), "{a:?} {b:?}");
        }
    }

    #[test]
    fn contained_rect_collides() {
        assert!(is_colliding(
            &rect(0.0, 0.0, 100.0, 100.0),
            &rect(40.0, 40.0, 2.0, 2.0)
        ));
    }

    #[test]
    fn hover_includes_far_corner_while_collision_excludes_edge() {
        let bounds = rect(10.0, 20.0, 30.0, 40.0);
        let corner = Vec2 { x: 40.0, y: 60.0 };

        assert!(contains_point(&bounds, corner));
        assert!(contains_point(&bounds, Vec2 { x: 10.0, y: 20.0 }));

        let point_box = rect(corner.x, corner.y, 0.0, 0.0);
        assert!(!is_colliding(&bounds, &point_box));
        let touching = rect(40.0, 20.0, 5.0, 5.0);
        assert!(!is_colliding(&bounds, &touching));
    }

    #[test]
    fn hover_rejects_points_outside() {
        let bounds = rect(0.0, 0.0, 10.0, 10.0);
        assert!(!contains_point(&bounds, Vec2 { x: 10.01, y: 5.0 }));
        assert!(!contains_point(&bounds, Vec2 { x: 5.0, y: -0.01 }));
    }

    #[test]
    fn negative_size_is_clamped() {
        let bounds = rect(1.0, 1.0, -4.0, 3.0);
        assert_eq!(bounds.w, 0.0);
        assert_eq!(bounds.h, 3.0);
    }
}
