use async_logger::loggable::MAX_NUMERIC_SIZE;
use async_logger::{FixedBuffer, LogStream, Loggable};
use proptest::prelude::*;

fn render<T: Loggable>(value: T) -> String {
    let mut stream = LogStream::new();
    stream.append(value);
    String::from_utf8(stream.buffer().as_bytes().to_vec()).unwrap()
}

#[test]
fn test_integer_minimums_and_zero() {
    assert_eq!(render(i8::MIN), i8::MIN.to_string());
    assert_eq!(render(i16::MIN), i16::MIN.to_string());
    assert_eq!(render(i32::MIN), i32::MIN.to_string());
    assert_eq!(render(i64::MIN), i64::MIN.to_string());
    assert_eq!(render(i128::MIN), i128::MIN.to_string());
    assert_eq!(render(isize::MIN), isize::MIN.to_string());

    assert_eq!(render(0i8), "0");
    assert_eq!(render(0i16), "0");
    assert_eq!(render(0i32), "0");
    assert_eq!(render(0i64), "0");
    assert_eq!(render(0i128), "0");
    assert_eq!(render(0u8), "0");
    assert_eq!(render(0u16), "0");
    assert_eq!(render(0u32), "0");
    assert_eq!(render(0u64), "0");
    assert_eq!(render(0u128), "0");
    assert_eq!(render(0usize), "0");
}

#[test]
fn test_integer_maximums() {
    assert_eq!(render(u8::MAX), "255");
    assert_eq!(render(u64::MAX), "18446744073709551615");
    assert_eq!(render(i64::MAX), "9223372036854775807");
    assert_eq!(render(u128::MAX), u128::MAX.to_string());
}

#[test]
fn test_mixed_record_body() {
    let mut stream = LogStream::new();
    stream
        .append("Status: ")
        .append(true)
        .append(", Count: ")
        .append(42u64)
        .append(", Temp: ")
        .append(25.5f32)
        .append(", Missing: ")
        .append(None::<&str>);
    assert_eq!(
        stream.buffer().as_bytes(),
        b"Status: 1, Count: 42, Temp: 25.5, Missing: (null)"
    );
}

proptest! {
    #[test]
    fn prop_buffer_round_trip(
        prefix in 0usize..256,
        data in proptest::collection::vec(any::<u8>(), 0..=256),
    ) {
        let mut buffer = FixedBuffer::<512>::new();
        prop_assert!(buffer.append(&vec![b'p'; prefix]));
        prop_assert!(data.len() <= buffer.avail());
        prop_assert!(buffer.append(&data));
        prop_assert_eq!(&buffer.as_bytes()[prefix..], &data[..]);
        prop_assert_eq!(buffer.len(), prefix + data.len());
    }

    #[test]
    fn prop_append_beyond_capacity_is_refused(
        fill in 0usize..=64,
        extra in 1usize..64,
    ) {
        let mut buffer = FixedBuffer::<64>::new();
        prop_assert!(buffer.append(&vec![1u8; fill]));
        let overflow = vec![2u8; 64 - fill + extra];
        prop_assert!(!buffer.append(&overflow));
        prop_assert_eq!(buffer.len(), fill);
    }

    #[test]
    fn prop_i64_matches_std(value in any::<i64>()) {
        prop_assert_eq!(render(value), value.to_string());
    }

    #[test]
    fn prop_i32_matches_std(value in any::<i32>()) {
        prop_assert_eq!(render(value), value.to_string());
    }

    #[test]
    fn prop_i128_matches_std(value in any::<i128>()) {
        prop_assert_eq!(render(value), value.to_string());
    }

    #[test]
    fn prop_u64_matches_std(value in any::<u64>()) {
        prop_assert_eq!(render(value), value.to_string());
    }

    #[test]
    fn prop_f64_round_trips(value in any::<f64>()) {
        prop_assume!(value.is_finite());
        let text = render(value);
        prop_assert!(text.len() <= MAX_NUMERIC_SIZE);
        prop_assert_eq!(text.parse::<f64>().unwrap(), value);
    }
}
