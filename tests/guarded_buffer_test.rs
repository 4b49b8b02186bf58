use kernbench::guarded_buffer::{GUARD_PATTERN, GuardedBuffer, check_match};

#[test]
fn test_sixteen_byte_buffer_guard_positions() {
    let mut buffer = GuardedBuffer::<u8>::allocate(16).expect("allocation should succeed");
    assert_eq!(buffer.logical_bytes(), 16);
    assert_eq!(buffer.guard_bytes(), GUARD_PATTERN);

    // A conforming kernel writes exactly the logical region.
    for (i, byte) in buffer.as_mut_slice().iter_mut().enumerate() {
        *byte = i as u8;
    }
    assert!(buffer.check_guard());

    // One byte into the guard (offset 17) is an overrun.
    unsafe { *buffer.as_mut_ptr().add(17) = 0 };
    assert!(!buffer.check_guard());
    assert_eq!(buffer.guard_bytes(), [0xfe, 0x00, 0xad, 0xde]);
}

#[test]
fn test_from_slice_round_trips_values() {
    let values = [1.5f64, -2.25, 1e9];
    let buffer = GuardedBuffer::from_slice(&values).unwrap();
    assert_eq!(buffer.as_slice(), &values);
    assert!(buffer.matches(&values));
    assert!(buffer.check_guard());
}

#[test]
fn test_value_mismatch_is_independent_of_guard() {
    let mut buffer = GuardedBuffer::<i32>::allocate(4).unwrap();
    buffer.as_mut_slice().copy_from_slice(&[1, 2, 3, 5]);
    assert!(!buffer.matches(&[1, 2, 3, 4]));
    assert!(buffer.check_guard());
}

#[test]
fn test_float_epsilon_boundary() {
    assert!(check_match(&[0.0f32], &[0.00009]));
    assert!(!check_match(&[0.0f32], &[0.0002]));
}
