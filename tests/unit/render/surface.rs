use super::*;

#[test]
fn new_surface_is_transparent() {
    let s = Surface::new(3, 2);
    assert_eq!(s.data().len(), 3 * 2 * 4);
    assert!(s.data().iter().all(|&b| b == 0));
    assert_eq!(s.pixel(3, 0), None);
}

#[test]
fn fill_then_clear() {
    let mut s = Surface::new(2, 2);
    s.fill(Rgba8Premul::opaque(9, 8, 7));
    assert_eq!(s.pixel(1, 1), Some(Rgba8Premul::opaque(9, 8, 7)));
    s.clear();
    assert_eq!(s.pixel(1, 1), Some(Rgba8Premul::transparent()));
}

#[test]
fn draw_image_clips_to_bounds() {
    let mut s = Surface::new(4, 4);
    let red = [255u8, 0, 0, 255].repeat(2 * 2);
    s.draw_rgba8_premul(3, -1, 2, 2, &red, 1.0).unwrap();
    assert_eq!(s.pixel(3, 0), Some(Rgba8Premul::opaque(255, 0, 0)));
    assert_eq!(s.pixel(2, 0), Some(Rgba8Premul::transparent()));
    assert_eq!(s.pixel(3, 1), Some(Rgba8Premul::transparent()));
}

#[test]
fn draw_image_fully_outside_is_noop() {
    let mut s = Surface::new(2, 2);
    let px = [1u8, 2, 3, 255];
    s.draw_rgba8_premul(5, 5, 1, 1, &px, 1.0).unwrap();
    assert!(s.data().iter().all(|&b| b == 0));
}

#[test]
fn draw_image_rejects_wrong_buffer_length() {
    let mut s = Surface::new(2, 2);
    assert!(s.draw_rgba8_premul(0, 0, 2, 2, &[0u8; 4], 1.0).is_err());
}

#[test]
fn later_draws_land_on_top() {
    let mut s = Surface::new(1, 1);
    s.draw_rgba8_premul(0, 0, 1, 1, &[255, 0, 0, 255], 1.0)
        .unwrap();
    s.draw_rgba8_premul(0, 0, 1, 1, &[0, 0, 255, 255], 1.0)
        .unwrap();
    assert_eq!(s.pixel(0, 0), Some(Rgba8Premul::opaque(0, 0, 255)));
}
