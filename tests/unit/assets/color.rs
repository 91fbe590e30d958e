use super::*;

fn rgba8(s: &str) -> [u8; 4] {
    parse_css_color(s).unwrap().to_rgba8()
}

#[test]
fn parses_hex_forms() {
    assert_eq!(rgba8("#ff0000"), [255, 0, 0, 255]);
    assert_eq!(rgba8("#F00"), [255, 0, 0, 255]);
    assert_eq!(rgba8("#0000ff80"), [0, 0, 255, 128]);
    assert_eq!(rgba8("#0f08"), [0, 255, 0, 136]);

    assert!(parse_css_color("#12345").is_err());
    assert!(parse_css_color("#zzzzzz").is_err());
}

#[test]
fn parses_rgb_comma_and_space_syntax() {
    assert_eq!(rgba8("rgb(255, 128, 0)"), [255, 128, 0, 255]);
    assert_eq!(rgba8("rgba(0, 0, 0, 0.25)")[3], 64);
    assert_eq!(rgba8("rgb(100% 0% 50% / 50%)"), [255, 0, 128, 128]);
    assert!(parse_css_color("rgb(1, 2)").is_err());
}

#[test]
fn parses_every_css_color_function() {
    assert_eq!(rgba8("hsl(0, 100%, 50%)"), [255, 0, 0, 255]);
    assert_eq!(rgba8("hsla(120deg 100% 25% / 0.5)"), [0, 128, 0, 128]);
    assert_eq!(rgba8("hwb(120 0% 0%)"), [0, 255, 0, 255]);

    let lab = rgba8("lab(50% 40 59)");
    assert!(lab[0] > lab[2], "{lab:?}");
    assert_eq!(rgba8("oklch(100% 0 0)"), [255, 255, 255, 255]);
    assert_eq!(rgba8("color(srgb 1 0 0)"), [255, 0, 0, 255]);
}

#[test]
fn named_colors_cover_the_whole_css_table() {
    assert_eq!(rgba8("  Navy "), [0, 0, 128, 255]);
    assert_eq!(rgba8("rebeccapurple"), [102, 51, 153, 255]);
    assert_eq!(rgba8("lightgoldenrodyellow"), [250, 250, 210, 255]);
    assert_eq!(parse_css_color("transparent").unwrap().alpha(), 0.0);

    let err = parse_css_color("notacolor").unwrap_err();
    assert!(matches!(err, PhotoveilError::Validation(_)));
    assert!(err.to_string().contains("notacolor"));
}

#[test]
fn premultiplies_on_quantize() {
    let c = CssColor::rgba(1.0, 0.5, 0.0, 0.5).to_rgba8_premul();
    assert_eq!(c.to_array(), [128, 64, 0, 128]);
}
