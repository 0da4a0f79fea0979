use std::{io::Write, time::Duration};

use sluice::{
    Conduit, FilterFunc, MapFunc, ReduceFunc, Value, just, just_of, nothing,
    sources::{from_lines, from_sequence, from_words, integer_range, values},
};

#[test]
fn test_take_non_positive_leaves_conduit_untouched() {
    let mut conduit = integer_range(0, 5);
    assert!(conduit.take(0).is_empty());
    assert_eq!(conduit.first(), Some(0));
}

#[test]
fn test_take_random_counts() {
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    for _ in 0..50 {
        let len = rng.i64(0..40);
        let n = rng.usize(0..60);
        let mut conduit = integer_range(0, len);
        let taken = conduit.take(n);

        let expected: Vec<i64> = (0..len).take(n).collect();
        assert_eq!(taken, expected);

        let rest = conduit.take_all();
        let expected_rest: Vec<i64> = (0..len).skip(n).collect();
        assert_eq!(rest, expected_rest);
    }
}

#[test]
fn test_take_past_end_reaches_end_of_sequence() {
    let mut conduit = values(vec![1, 2, 3]);
    assert_eq!(conduit.take(5), vec![1, 2, 3]);
    assert_eq!(conduit.first(), None);
    assert!(conduit.producer().wait().is_completed());
}

#[test]
fn test_dynamic_pipeline_end_to_end() {
    let inc = MapFunc::new(|v: i64| v + 1).unwrap();
    let double = MapFunc::new(|v: i64| v * 2).unwrap();
    let small = FilterFunc::new(|v: i64| v < 9).unwrap();
    let add = ReduceFunc::new(|v: i64, acc: i64| v + acc).unwrap();

    let list = Value::from(vec![
        Value::from(1),
        Value::from(2),
        Value::from(3),
        Value::from(4),
    ]);
    // [1,2,3,4] -> [4,6,8,10] -> [4,6,8] -> 18
    let total = from_sequence(list)
        .unwrap()
        .map_with([inc, double])
        .filter_with(small)
        .reduce_with(&add, Value::from(0));
    assert_eq!(total, Value::from(18));
}

#[test]
fn test_mixed_typed_and_dynamic_stages() {
    let shout = MapFunc::new(|s: String| s.to_uppercase()).unwrap();
    let words = from_words(std::io::Cursor::new("to be or\nnot to be"))
        .filter(|w| w.len() == 2)
        .map(Value::from)
        .map_with([shout])
        .take_all();
    assert_eq!(
        words,
        ["TO", "BE", "OR", "TO", "BE"]
            .into_iter()
            .map(Value::from)
            .collect::<Vec<_>>()
    );
}

#[test]
fn test_lines_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "first line\nsecond line\nunterminated").unwrap();
    file.flush().unwrap();

    let reader = std::io::BufReader::new(file.reopen().unwrap());
    let lines = from_lines(reader).take_all();
    assert_eq!(lines, vec!["first line", "second line", "unterminated"]);
}

#[test]
fn test_maybe_over_conduit_values() {
    let inc = MapFunc::new(|v: i64| v + 1).unwrap();
    let mut conduit = values(vec![Value::from(1)]);
    assert_eq!(conduit.first_maybe().map(&inc), just(2));
    assert_eq!(conduit.first_maybe().map(&inc), nothing());
    assert_eq!(just(just(1)).join(), just(1));
    assert_eq!(just_of(String::from("x")), just("x"));
}

/// A conduit that is kept but no longer read leaves its producers blocked on the
/// full slot. Dropping it releases the whole chain.
#[test]
fn test_partially_consumed_chain_blocks_until_dropped() {
    let source = integer_range(0, 1_000_000);
    let source_task = source.producer().clone();
    let mut mapped = source.map(|v| v * 2);
    let map_task = mapped.producer().clone();

    assert_eq!(mapped.take(2), vec![0, 2]);

    assert_eq!(map_task.wait_timeout(Duration::from_millis(100)), None);
    assert!(!source_task.is_finished());

    drop(mapped);
    assert!(
        map_task
            .wait_timeout(Duration::from_secs(5))
            .is_some_and(|outcome| outcome.is_completed())
    );
    assert!(
        source_task
            .wait_timeout(Duration::from_secs(5))
            .is_some_and(|outcome| outcome.is_completed())
    );
}

#[test]
fn test_fully_drained_chain_finishes() {
    let source = integer_range(0, 100);
    let source_task = source.producer().clone();
    let filtered = source.filter(|v| v % 3 == 0);
    let filter_task = filtered.producer().clone();

    assert_eq!(filtered.take_all().len(), 34);
    assert!(filter_task.wait().is_completed());
    assert!(source_task.wait().is_completed());
}

#[test]
fn test_custom_generator_stops_on_cancel() {
    let mut conduit = Conduit::new(|out| {
        let mut n = 1u64;
        loop {
            out.send(n)?;
            n = n.saturating_mul(3);
        }
    });
    assert_eq!(conduit.take(4), vec![1, 3, 9, 27]);
    let producer = conduit.producer().clone();
    conduit.cancel();
    assert!(producer.wait_timeout(Duration::from_secs(5)).is_some());
}
