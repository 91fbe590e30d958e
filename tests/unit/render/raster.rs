use super::*;

use vello_cpu::peniko::{Compose, Mix};

fn pixel(pm: &vello_cpu::Pixmap, x: usize, y: usize) -> [u8; 4] {
    let w = pm.width() as usize;
    let i = (y * w + x) * 4;
    let d = pm.data_as_u8_slice();
    [d[i], d[i + 1], d[i + 2], d[i + 3]]
}

fn base(w: u32, h: u32, px: [u8; 4]) -> ImagePaint {
    image_paint(&px.repeat((w * h) as usize), w, h).unwrap()
}

fn solid_layer(transform: Affine, local: Rect, rgba: [f32; 4], mix: Mix, opacity: f32) -> Layer {
    Layer {
        transform,
        local,
        fill: LayerFill::Solid(CssColor::rgba(rgba[0], rgba[1], rgba[2], rgba[3])),
        opacity,
        blend: peniko::BlendMode::new(mix, Compose::SrcOver),
    }
}

fn close(a: [u8; 4], b: [u8; 4], tol: u8) -> bool {
    a.iter().zip(b).all(|(x, y)| x.abs_diff(y) <= tol)
}

#[test]
fn surface_size_is_validated() {
    assert!(matches!(image_paint(&[], 0, 10), Err(PhotoveilError::Render(_))));
    assert!(matches!(image_paint(&[], 10, 0), Err(PhotoveilError::Render(_))));
    assert!(matches!(
        image_paint(&[0; 4], 70_000, 10),
        Err(PhotoveilError::Render(_))
    ));
}

#[test]
fn pixmap_from_premul_bytes_checks_length() {
    assert!(pixmap_from_premul_bytes(&[0; 12], 2, 2).is_err());
    let pm = pixmap_from_premul_bytes(&[10, 20, 30, 255].repeat(4), 2, 2).unwrap();
    assert_eq!(pixel(&pm, 1, 1), [10, 20, 30, 255]);
}

#[test]
fn base_is_copied_pixel_for_pixel() {
    let mut bytes = Vec::new();
    for i in 0..16u8 {
        bytes.extend_from_slice(&[i * 10, 255 - i * 10, i, 255]);
    }
    let photo = image_paint(&bytes, 4, 4).unwrap();
    let pm = Rasterizer::new().render(&photo, &[]).unwrap();
    assert_eq!(pm.data_as_u8_slice(), bytes.as_slice());
}

#[test]
fn layer_is_clipped_to_the_photo() {
    let mut r = Rasterizer::new();
    // A 10x10 box centered on x=20 only covers the right half of the photo.
    let layer = solid_layer(
        Affine::translate((20.0, 5.0)),
        Rect::new(-5.0, -5.0, 5.0, 5.0),
        [1.0, 0.0, 0.0, 1.0],
        Mix::Normal,
        1.0,
    );
    let pm = r.render(&base(20, 10, [0, 0, 255, 255]), &[layer]).unwrap();
    assert_eq!(pixel(&pm, 17, 5), [255, 0, 0, 255]);
    assert_eq!(pixel(&pm, 5, 5), [0, 0, 255, 255]);
}

#[test]
fn reused_context_starts_from_a_clean_frame() {
    let mut r = Rasterizer::new();
    let photo = base(8, 8, [0, 0, 0, 255]);
    let red = |x0| {
        solid_layer(
            Affine::IDENTITY,
            Rect::new(x0, 0.0, x0 + 4.0, 8.0),
            [1.0, 0.0, 0.0, 1.0],
            Mix::Normal,
            1.0,
        )
    };
    r.render(&photo, &[red(0.0)]).unwrap();
    let pm = r.render(&photo, &[red(4.0)]).unwrap();
    assert_eq!(pixel(&pm, 1, 4), [0, 0, 0, 255]);
    assert_eq!(pixel(&pm, 6, 4), [255, 0, 0, 255]);
}

#[test]
fn layer_mix_and_opacity_apply_against_the_backdrop() {
    let mut r = Rasterizer::new();
    let photo = base(4, 4, [128, 128, 128, 255]);
    let full = Rect::new(0.0, 0.0, 4.0, 4.0);
    let gray = [128.0 / 255.0, 128.0 / 255.0, 128.0 / 255.0, 1.0];

    let pm = r
        .render(&photo, &[solid_layer(Affine::IDENTITY, full, gray, Mix::Multiply, 1.0)])
        .unwrap();
    assert!(close(pixel(&pm, 2, 2), [64, 64, 64, 255], 2));

    let pm = r
        .render(&photo, &[solid_layer(Affine::IDENTITY, full, [1.0; 4], Mix::Normal, 0.5)])
        .unwrap();
    assert!(close(pixel(&pm, 2, 2), [191, 191, 191, 255], 2));

    let pm = r
        .render(&photo, &[solid_layer(Affine::IDENTITY, full, [1.0; 4], Mix::Difference, 1.0)])
        .unwrap();
    assert!(close(pixel(&pm, 2, 2), [127, 127, 127, 255], 2));
}

#[test]
fn gradient_fill_uses_its_paint_transform() {
    let mut r = Rasterizer::new();
    let fill = crate::assets::gradient::FlatFill::parse("linear-gradient(to right, black, white)")
        .unwrap();
    let crate::assets::gradient::FlatFill::Gradient(g) = fill else {
        panic!("expected a gradient");
    };
    let local = Rect::new(-16.0, -8.0, 16.0, 8.0);
    let layer = Layer {
        transform: Affine::translate((16.0, 8.0)),
        local,
        fill: LayerFill::Gradient(g.paint(local)),
        opacity: 1.0,
        blend: peniko::BlendMode::default(),
    };
    let pm = r.render(&base(32, 16, [255, 0, 0, 255]), &[layer]).unwrap();
    let (left, right) = (pixel(&pm, 0, 8), pixel(&pm, 31, 8));
    assert!(left[0] < 20 && left[3] == 255, "{left:?}");
    assert!(right[0] > 235 && right[1] > 235, "{right:?}");
}

#[test]
fn image_fill_stretches_over_the_box() {
    let mut r = Rasterizer::new();
    let green = image_paint(&[0, 255, 0, 255].repeat(4), 2, 2).unwrap();
    let layer = Layer {
        transform: Affine::IDENTITY,
        local: Rect::new(0.0, 0.0, 16.0, 16.0),
        fill: LayerFill::Image(green),
        opacity: 1.0,
        blend: peniko::BlendMode::default(),
    };
    let pm = r.render(&base(16, 16, [0, 0, 0, 255]), &[layer]).unwrap();
    assert_eq!(pixel(&pm, 8, 8), [0, 255, 0, 255]);
    assert_eq!(pixel(&pm, 1, 14)[1], 255);
}
