use chrono::TimeZone as _;

use super::*;

fn frame(data: Vec<u8>, w: u32, h: u32) -> FrameRGBA {
    FrameRGBA {
        width: w,
        height: h,
        data,
        premultiplied: true,
    }
}

#[test]
fn png_round_trips_with_straight_alpha() {
    // Half-transparent red, premultiplied.
    let f = frame([128, 0, 0, 128].repeat(6), 3, 2);
    let png = encode_png(&f).unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (3, 2));
    assert_eq!(decoded.get_pixel(2, 1).0, [255, 0, 0, 128]);
}

#[test]
fn mismatched_frames_are_export_errors() {
    let f = frame(vec![0; 10], 3, 2);
    assert!(matches!(encode_png(&f), Err(PhotoveilError::Export(_))));
    let f = frame(Vec::new(), 0, 0);
    assert!(matches!(straight_rgba(&f), Err(PhotoveilError::Export(_))));
}

#[test]
fn straight_frames_are_left_alone() {
    let mut f = frame([10, 20, 30, 40].to_vec(), 1, 1);
    f.premultiplied = false;
    assert_eq!(straight_rgba(&f).unwrap(), vec![10, 20, 30, 40]);
}

#[test]
fn filename_and_data_url() {
    let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
    assert_eq!(
        export_filename(DEFAULT_FILENAME_PREFIX, at),
        "edited-image-1700000000123.png"
    );

    let out = export_png_at(&frame([0, 0, 0, 255].to_vec(), 1, 1), "shot", at).unwrap();
    assert_eq!(out.filename, "shot-1700000000123.png");
    let url = out.data_url();
    assert!(url.starts_with("data:image/png;base64,iVBORw0KGgo"), "{url}");
}
