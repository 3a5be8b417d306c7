use me_core::ImageView;

use crate::masks::MaskBank;
use crate::site::EdgeSite;

/// Oriented mask response at one position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Response {
    /// Weighted sum, positive when the edge has the site's polarity.
    pub response: f32,
    /// `response` over the kernel's maximum energy, in `[-1, 1]`.
    pub normalized: f32,
}

/// Correlates the kernel matching `site`'s normal with the image around the
/// site's rounded pixel.
///
/// Returns a zero response when the footprint does not fit in the image.
pub fn evaluate(img: &ImageView<'_, u8>, site: &EdgeSite, bank: &MaskBank) -> Response {
    let choice = bank.quantize(site.normal_angle());
    let size = bank.size();
    let (before, _) = bank.reach();

    let (px, py) = site.position.round();
    let x0 = px - before as isize;
    let y0 = py - before as isize;
    if x0 < 0
        || y0 < 0
        || x0 as usize + size > img.width()
        || y0 as usize + size > img.height()
    {
        return Response::default();
    }
    let (x0, y0) = (x0 as usize, y0 as usize);

    let kernel = bank.kernel(choice.bin);
    let mut acc = 0.0f32;
    for (r, coeffs) in kernel.chunks_exact(size).enumerate() {
        let pixels = &img.row(y0 + r)[x0..x0 + size];
        for (&k, &v) in coeffs.iter().zip(pixels) {
            acc += k * f32::from(v);
        }
    }

    let mut orient = bank.convention().bright_side(site.polarity());
    if choice.reversed {
        orient = -orient;
    }
    let response = orient * acc;
    Response {
        response,
        normalized: response / bank.max_energy(choice.bin),
    }
}

#[cfg(test)]
mod tests {
    use core::f32::consts::PI;

    use me_core::Image;

    use super::{Response, evaluate};
    use crate::config::SignConvention;
    use crate::masks::MaskBank;
    use crate::site::{EdgeSite, Polarity};

    fn vertical_step(width: usize, dark: u8, bright: u8, edge_col: usize) -> Image<u8> {
        Image::from_fn(width, 11, |x, _| if x >= edge_col { bright } else { dark })
    }

    fn site_at(row: f32, col: f32, alpha: f32, polarity: Polarity) -> EdgeSite {
        let mut s = EdgeSite::with_angle(row, col, alpha);
        s.set_polarity(polarity);
        s
    }

    #[test]
    fn peaks_on_first_bright_column() {
        let img = vertical_step(11, 50, 200, 5);
        let view = img.as_view();
        let bank = MaskBank::new(180, 6).expect("valid bank");

        let resp: Vec<f32> = (3..=8)
            .map(|c| evaluate(&view, &site_at(5.0, c as f32, 0.0, Polarity::Positive), &bank))
            .map(|r| r.response)
            .collect();

        // Column weights of the disc kernel are [-4, -6, -6, 6, 6, 4].
        let expected = [600.0, 1500.0, 2400.0, 1500.0, 600.0, 0.0];
        for (got, want) in resp.iter().zip(expected) {
            assert!((got - want).abs() < 0.5, "got {resp:?}");
        }

        let at_edge = evaluate(&view, &site_at(5.0, 5.0, 0.0, Polarity::Positive), &bank);
        assert!((at_edge.normalized - 2400.0 / 4080.0).abs() < 1e-4);
    }

    #[test]
    fn polarity_and_reversed_normals_agree() {
        let img = vertical_step(11, 50, 200, 5);
        let view = img.as_view();
        let bank = MaskBank::new(180, 6).expect("valid bank");

        let pos = evaluate(&view, &site_at(5.0, 5.0, 0.0, Polarity::Positive), &bank);
        let neg = evaluate(&view, &site_at(5.0, 5.0, 0.0, Polarity::Negative), &bank);
        assert!(pos.response > 0.0);
        assert!((pos.response + neg.response).abs() < 1e-3);

        // Normal pointing left: the bright side is now on the negative side.
        let back = evaluate(&view, &site_at(5.0, 5.0, PI, Polarity::Negative), &bank);
        assert!((back.response - pos.response).abs() < 1e-3);

        let inverted = bank.clone().with_convention(SignConvention::BrightOnNegativeSide);
        let inv = evaluate(&view, &site_at(5.0, 5.0, 0.0, Polarity::Negative), &inverted);
        assert!((inv.response - pos.response).abs() < 1e-3);
    }

    #[test]
    fn footprint_outside_image_gives_zero() {
        let img = vertical_step(11, 50, 200, 5);
        let view = img.as_view();
        let bank = MaskBank::new(180, 6).expect("valid bank");

        for (row, col) in [(5.0, 2.0), (5.0, 9.0), (0.0, 5.0), (-3.0, -3.0), (40.0, 5.0)] {
            let r = evaluate(&view, &site_at(row, col, 0.0, Polarity::Positive), &bank);
            assert_eq!(r, Response::default(), "({row}, {col})");
        }
    }

    #[test]
    fn response_grows_with_step_amplitude() {
        let bank = MaskBank::new(180, 6).expect("valid bank");
        let mut last = 0.0f32;
        for amp in [10u8, 50, 150] {
            let img = vertical_step(11, 50, 50 + amp, 5);
            let r = evaluate(
                &img.as_view(),
                &site_at(5.0, 5.0, 0.0, Polarity::Positive),
                &bank,
            );
            assert!(r.response.abs() >= last);
            last = r.response.abs();
        }
        assert!(last > 0.0);
    }

    #[test]
    fn deterministic_for_same_bin() {
        let img = Image::from_fn(24, 24, |x, y| ((x * 13 + y * 7) % 256) as u8);
        let view = img.as_view();
        let bank = MaskBank::new(180, 5).expect("valid bank");
        let site = site_at(12.0, 11.0, 0.52, Polarity::Positive);

        let first = evaluate(&view, &site, &bank);
        for _ in 0..4 {
            assert_eq!(evaluate(&view, &site, &bank), first);
        }

        // Angles that land in the same bin give the same response.
        let nearby = site_at(12.0, 11.0, 0.52 + 0.001, Polarity::Positive);
        assert_eq!(evaluate(&view, &nearby, &bank), first);
    }
}
