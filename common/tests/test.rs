use common::shapes::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn test_new_and_getters() {
    let region = Region::new(2.0, 3.0, 4.0, 6.0);
    assert_eq!(region.width(), 4.0);
    assert_eq!(region.height(), 6.0);
    assert_eq!(region.left(), 2.0);
    assert_eq!(region.right(), 6.0);
    assert_eq!(region.bottom(), 3.0);
    assert_eq!(region.top(), 9.0);
    assert_eq!(region.center(), (4.0, 6.0));
}

#[test]
fn test_contains_interior_point() {
    let region = Region::new(0.0, 0.0, 4.0, 6.0);
    assert!(region.contains(Position::new(2.0, 3.0)));
    assert!(!region.contains(Position::new(-1.0, 3.0)));
    assert!(!region.contains(Position::new(2.0, 7.0)));
}

#[test]
fn test_contains_half_open_edges() {
    let region = Region::new(0.0, 0.0, 4.0, 4.0);
    // Lesser edges are inside, greater edges belong to the neighbor.
    assert!(region.contains(Position::new(0.0, 0.0)));
    assert!(region.contains(Position::new(0.0, 3.9)));
    assert!(!region.contains(Position::new(4.0, 2.0)));
    assert!(!region.contains(Position::new(2.0, 4.0)));
    assert!(!region.contains(Position::new(4.0, 4.0)));
}

#[test]
fn test_position_carries_z() {
    let position = Position::with_z(1.0, 2.0, 7.5);
    assert_eq!(position.z, 7.5);
    assert_eq!(Position::new(1.0, 2.0).z, 0.0);
}

#[test]
fn test_random_position_inside() {
    let region = Region::new(2.0, 3.0, 6.0, 8.0);

    // Use a fixed seed for reproducibility.
    let mut rng: StdRng = SeedableRng::seed_from_u64(123);

    for _ in 0..10 {
        let position = region.random_position_inside(&mut rng);
        assert!(region.contains(position));
    }
}

#[test]
fn test_random_position_inside_degenerate_region() {
    let region = Region::new(2.0, 3.0, 0.0, 0.0);

    let mut rng: StdRng = SeedableRng::seed_from_u64(123);

    let position = region.random_position_inside(&mut rng);
    // A zero-sized region pins the result to its corner.
    assert_eq!(position.x, 2.0);
    assert_eq!(position.y, 3.0);
}
