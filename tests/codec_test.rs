//! Tests for square-number encoding.

use checkers_client::{
    CodecError, MoveKind, Position, encode_path, parse_move, to_position, to_square_number,
};

#[test]
fn test_every_playable_position_round_trips() {
    for pos in Position::playable() {
        let num = to_square_number(pos).expect("playable position encodes");
        assert_eq!(to_position(num.into()).expect("decodes"), pos);
    }
}

#[test]
fn test_every_square_number_round_trips() {
    for num in 1..=32u32 {
        let pos = to_position(num).expect("valid square number");
        assert!(pos.is_playable());
        assert_eq!(u32::from(to_square_number(pos).expect("encodes")), num);
    }
}

#[test]
fn test_every_light_square_rejected() {
    for row in 0..8 {
        for col in 0..8 {
            let pos = Position::new(row, col);
            if !pos.is_playable() {
                assert_eq!(to_square_number(pos), Err(CodecError::InvalidPosition(pos)));
            }
        }
    }
}

#[test]
fn test_encode_paths() {
    let simple = [Position::new(2, 1), Position::new(3, 2)];
    assert_eq!(encode_path(&simple, MoveKind::Simple).expect("encodes"), "9-14");

    let chain = [Position::new(2, 3), Position::new(4, 5), Position::new(6, 7)];
    assert_eq!(encode_path(&chain, MoveKind::Capture).expect("encodes"), "10x19x28");

    let bad = [Position::new(2, 2), Position::new(3, 3)];
    assert!(encode_path(&bad, MoveKind::Simple).is_err());
}

#[test]
fn test_parse_inverts_encode() {
    let chain = [Position::new(2, 3), Position::new(4, 5), Position::new(6, 7)];
    let text = encode_path(&chain, MoveKind::Capture).expect("encodes");
    let parsed = parse_move(&text).expect("parses");
    assert!(*parsed.capture());
    let positions: Vec<Position> = parsed
        .squares()
        .iter()
        .map(|n| to_position((*n).into()).expect("decodes"))
        .collect();
    assert_eq!(positions, chain);
}
