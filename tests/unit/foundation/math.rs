use super::*;

#[test]
fn mul_div255_edges() {
    assert_eq!(mul_div255_u16(0, 255), 0);
    assert_eq!(mul_div255_u16(255, 255), 255);
    assert_eq!(mul_div255_u16(255, 128), 128);
    assert_eq!(mul_div255_u8(200, 255), 200);
}
