use super::KeyRotator;

fn keys(names: &[&str]) -> Vec<String> {
    return names.iter().map(|e| return e.to_string()).collect();
}

#[test]
fn it_requires_a_key() {
    assert!(KeyRotator::new(vec![]).is_err());
}

#[test]
fn it_starts_at_the_first_key() {
    let rotator = KeyRotator::new(keys(&["a", "b", "c"])).unwrap();
    assert_eq!(rotator.current_key(), "a");
    assert_eq!(rotator.pool_size(), 3);
}

#[test]
fn it_rotates_circularly() {
    let rotator = KeyRotator::new(keys(&["a", "b", "c"])).unwrap();

    assert_eq!(rotator.rotate(), 1);
    assert_eq!(rotator.current_key(), "b");
    assert_eq!(rotator.rotate(), 2);
    assert_eq!(rotator.current_key(), "c");
    assert_eq!(rotator.rotate(), 0);
    assert_eq!(rotator.current_key(), "a");
}

#[test]
fn it_wraps_onto_itself_with_one_key() {
    let rotator = KeyRotator::new(keys(&["only"])).unwrap();
    assert_eq!(rotator.rotate(), 0);
    assert_eq!(rotator.current_key(), "only");
}

#[test]
fn it_keeps_separate_cursors_per_instance() {
    let first = KeyRotator::new(keys(&["a", "b"])).unwrap();
    let second = KeyRotator::new(keys(&["a", "b"])).unwrap();

    first.rotate();
    assert_eq!(first.current_key(), "b");
    assert_eq!(second.current_key(), "a");
}
