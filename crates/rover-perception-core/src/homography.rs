use crate::{sample_bilinear_rgb_u8, RgbImage, RgbImageView};
use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Projective 3x3 transform, normalized so that `h[(2, 2)] == 1` when it
/// comes out of [`homography_from_4pt`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    pub fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::from_row_slice(&[
            rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2], rows[2][0],
            rows[2][1], rows[2][2],
        ]))
    }

    pub fn to_array(&self) -> [[f64; 3]; 3] {
        [
            [self.h[(0, 0)], self.h[(0, 1)], self.h[(0, 2)]],
            [self.h[(1, 0)], self.h[(1, 1)], self.h[(1, 2)]],
            [self.h[(2, 0)], self.h[(2, 1)], self.h[(2, 2)]],
        ]
    }

    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        let v = self.h * Vector3::new(p.x, p.y, 1.0);
        let w = v[2];
        Point2::new(v[0] / w, v[1] / w)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }
}

fn hartley_normalization(cx: f64, cy: f64, mean_dist: f64) -> Matrix3<f64> {
    let s = if mean_dist > 1e-12 {
        (2.0_f64).sqrt() / mean_dist
    } else {
        1.0
    };

    Matrix3::<f64>::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

fn normalize_points4(pts: &[Point2<f64>; 4]) -> ([Point2<f64>; 4], Matrix3<f64>) {
    // translate to centroid, scale so mean distance = sqrt(2)
    let cx = pts.iter().map(|p| p.x).sum::<f64>() / 4.0;
    let cy = pts.iter().map(|p| p.y).sum::<f64>() / 4.0;
    let mean_dist = pts
        .iter()
        .map(|p| ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt())
        .sum::<f64>()
        / 4.0;

    let t = hartley_normalization(cx, cy, mean_dist);
    let out = pts.map(|p| {
        let v = t * Vector3::new(p.x, p.y, 1.0);
        Point2::new(v[0], v[1])
    });

    (out, t)
}

fn normalize_homography(h: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let s = h[(2, 2)];
    if s.abs() < 1e-12 {
        return None;
    }
    Some(h / s)
}

fn denormalize_homography(
    hn: Matrix3<f64>,
    t_src: Matrix3<f64>,
    t_dst: Matrix3<f64>,
) -> Option<Matrix3<f64>> {
    let t_dst_inv = t_dst.try_inverse()?;
    Some(t_dst_inv * hn * t_src)
}

/// True when any three of the four quad corners are collinear (or coincide).
///
/// A homography through such a quad is undefined.
pub fn quad_is_degenerate(quad: &[Point2<f64>; 4]) -> bool {
    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    TRIPLES.iter().any(|&[a, b, c]| {
        let ab = quad[b] - quad[a];
        let ac = quad[c] - quad[a];
        let scale = ab.norm() * ac.norm();
        let cross = ab.x * ac.y - ab.y * ac.x;
        scale <= f64::EPSILON || cross.abs() <= 1e-9 * scale
    })
}

/// Compute H such that: dst ~ H * src (projective), using 4 point correspondences.
///
/// Corner order must be consistent between `src` and `dst`. Returns `None`
/// when the linear system is singular (for example collinear corners).
pub fn homography_from_4pt(src: &[Point2<f64>; 4], dst: &[Point2<f64>; 4]) -> Option<Homography> {
    // Unknowns: [h11 h12 h13 h21 h22 h23 h31 h32], with h33 = 1
    // For each correspondence (x,y)->(u,v):
    // h11 x + h12 y + h13 - u h31 x - u h32 y = u
    // h21 x + h22 y + h23 - v h31 x - v h32 y = v
    let (src_n, t_src) = normalize_points4(src);
    let (dst_n, t_dst) = normalize_points4(dst);

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let (x, y) = (src_n[k].x, src_n[k].y);
        let (u, v) = (dst_n[k].x, dst_n[k].y);

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = 2 * k + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a.lu().solve(&b)?;
    if x.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let hn = Matrix3::<f64>::new(
        x[0], x[1], x[2], //
        x[3], x[4], x[5], //
        x[6], x[7], 1.0,
    );

    let h_den = denormalize_homography(hn, t_src, t_dst)?;
    let h_den = normalize_homography(h_den)?;

    Some(Homography::new(h_den))
}

/// Re-project `src` into an `out_w` x `out_h` frame.
///
/// Every output pixel `(x, y)` is pulled from `h_src_from_dst * (x, y)` with
/// bilinear sampling; source positions outside the frame read as black.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "debug",
        skip(src, h_src_from_dst),
        fields(width = out_w, height = out_h)
    )
)]
pub fn warp_perspective_rgb(
    src: &RgbImageView<'_>,
    h_src_from_dst: &Homography,
    out_w: usize,
    out_h: usize,
) -> RgbImage {
    let mut out = RgbImage::new(out_w, out_h);
    let (src_w, src_h) = (src.width as f64, src.height as f64);

    for y in 0..out_h {
        for x in 0..out_w {
            let ps = h_src_from_dst.apply(Point2::new(x as f64, y as f64));
            // Positions past one pixel outside the frame only read black;
            // this also drops NaN and points near the horizon line.
            let inside = (-1.0..=src_w).contains(&ps.x) && (-1.0..=src_h).contains(&ps.y);
            if !inside {
                continue;
            }
            let rgb = sample_bilinear_rgb_u8(src, ps.x as f32, ps.y as f32);
            out.set_pixel(x, y, rgb);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_close(a: Point2<f64>, b: Point2<f64>, tol: f64) {
        assert_abs_diff_eq!(a.x, b.x, epsilon = tol);
        assert_abs_diff_eq!(a.y, b.y, epsilon = tol);
    }

    #[test]
    fn inverse_round_trips_points() {
        let h = Homography::new(Matrix3::new(
            1.2, 0.1, 5.0, //
            -0.05, 0.9, 3.0, //
            0.001, 0.0005, 1.0,
        ));
        let inv = h.inverse().expect("invertible");

        for p in [
            Point2::new(0.0, 0.0),
            Point2::new(50.0, -20.0),
            Point2::new(320.0, 200.0),
        ] {
            assert_close(inv.apply(h.apply(p)), p, 1e-6);
        }
    }

    #[test]
    fn four_point_solve_recovers_h() {
        let ground_truth = Homography::new(Matrix3::new(
            0.8, 0.05, 120.0, //
            -0.02, 1.1, 80.0, //
            0.0009, -0.0004, 1.0,
        ));

        let src = [
            Point2::new(0.0, 0.0),
            Point2::new(180.0, 0.0),
            Point2::new(180.0, 130.0),
            Point2::new(0.0, 130.0),
        ];
        let dst = src.map(|p| ground_truth.apply(p));

        let recovered = homography_from_4pt(&src, &dst).expect("recoverable");

        for p in [
            Point2::new(0.0, 0.0),
            Point2::new(60.0, 40.0),
            Point2::new(150.0, 120.0),
        ] {
            assert_close(recovered.apply(p), ground_truth.apply(p), 1e-6);
        }
    }

    #[test]
    fn rover_trapezoid_maps_onto_square() {
        let src = [
            Point2::new(14.0, 140.0),
            Point2::new(301.0, 140.0),
            Point2::new(200.0, 96.0),
            Point2::new(118.0, 96.0),
        ];
        let dst = [
            Point2::new(155.0, 154.0),
            Point2::new(165.0, 154.0),
            Point2::new(165.0, 144.0),
            Point2::new(155.0, 144.0),
        ];
        let h = homography_from_4pt(&src, &dst).expect("solvable");
        for (s, d) in src.iter().zip(dst.iter()) {
            assert_close(h.apply(*s), *d, 1e-6);
        }
    }

    #[test]
    fn collinear_quads_are_degenerate() {
        let line = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(2.0, 2.0),
            Point2::new(5.0, 1.0),
        ];
        assert!(quad_is_degenerate(&line));

        let repeated = [
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(0.0, 2.0),
        ];
        assert!(quad_is_degenerate(&repeated));

        let square = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        assert!(!quad_is_degenerate(&square));
    }

    #[test]
    fn near_singular_warp_zero_fills_far_pixels() {
        let img = RgbImage::filled(4, 4, [90, 90, 90]);
        // w = 1 - (0.5 - 5e-13) * x: column 2 lands ~1e12 px away.
        let h = Homography::from_array([
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [-0.5 + 5e-13, 0.0, 1.0],
        ]);
        let out = warp_perspective_rgb(&img.view(), &h, 4, 4);
        assert_eq!(out.pixel(0, 1), [90, 90, 90]);
        assert_eq!(out.pixel(2, 1), [0, 0, 0]);
        assert_eq!(out.pixel(3, 3), [0, 0, 0]);
    }

    #[test]
    fn serialized_homography_reloads() {
        let h = Homography::from_array([[1.5, 0.0, 3.0], [0.2, 0.9, -4.0], [0.0, 0.001, 1.0]]);
        let json = serde_json::to_string(&h).expect("serialize");
        let back: Homography = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.to_array(), h.to_array());
    }

    #[test]
    fn identity_warp_preserves_frame() {
        let mut img = RgbImage::filled(6, 4, [12, 34, 56]);
        img.set_pixel(3, 2, [200, 150, 10]);
        let out = warp_perspective_rgb(&img.view(), &Homography::identity(), 6, 4);
        assert_eq!(out, img);
    }

    #[test]
    fn translated_warp_zero_fills_outside() {
        let img = RgbImage::filled(4, 4, [90, 90, 90]);
        // dst (x, y) pulls from src (x + 10, y): entirely outside.
        let shift = Homography::from_array([[1.0, 0.0, 10.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        let out = warp_perspective_rgb(&img.view(), &shift, 4, 4);
        assert!(out.data.iter().all(|&v| v == 0));
    }
}
