//! Source generators: each runs as one task that writes its values into a fresh
//! conduit and closes it.

use std::io::{self, BufRead};

use sluice_common::{Result, error::Error, verify_arg};
use sluice_dynamic::Value;

use crate::conduit::{Cancelled, Conduit};

/// A conduit over the given values, in order.
pub fn values<T: Send + 'static>(values: Vec<T>) -> Conduit<T> {
    Conduit::spawn("values", move |out| {
        for value in values {
            out.send(value)?;
        }
        Ok(())
    })
}

/// A conduit over the items of an iterator. The iterator is driven on the producer
/// task.
pub fn from_iter<I>(iter: I) -> Conduit<I::Item>
where
    I: IntoIterator + Send + 'static,
    I::Item: Send + 'static,
{
    Conduit::spawn("iter", move |out| {
        for value in iter {
            out.send(value)?;
        }
        Ok(())
    })
}

/// Integers from `start` (inclusive) to `end` (exclusive), counting up if
/// `start <= end` and down otherwise.
///
/// `integer_range(0, 4)` yields `0, 1, 2, 3`; `integer_range(0, -4)` yields
/// `0, -1, -2, -3`.
pub fn integer_range(start: i64, end: i64) -> Conduit<i64> {
    let step = if start <= end { 1 } else { -1 };
    range_task(start, end, step)
}

/// Integers from `start` towards `end` (exclusive) by `step`.
///
/// A positive step yields values while `i < end`, a negative one while `i > end`; a
/// step pointing away from `end` yields nothing. A zero step is rejected.
pub fn integer_range_step(start: i64, end: i64, step: i64) -> Result<Conduit<i64>> {
    verify_arg!(step, step != 0);
    Ok(range_task(start, end, step))
}

fn range_task(start: i64, end: i64, step: i64) -> Conduit<i64> {
    Conduit::spawn("range", move |out| {
        let mut i = start;
        while (step > 0 && i < end) || (step < 0 && i > end) {
            out.send(i)?;
            i = match i.checked_add(step) {
                Some(next) => next,
                None => break,
            };
        }
        Ok(())
    })
}

/// A conduit over the elements of a [`Value::List`].
///
/// Any other value is rejected when the source is built.
pub fn from_sequence(sequence: Value) -> Result<Conduit<Value>> {
    match sequence {
        Value::List(items) => Ok(values(items)),
        other => Err(Error::not_a_sequence(other.shape().to_string())),
    }
}

/// The lines of `reader`, without their terminators.
///
/// Lines end at `\n`; a `\r` before it is removed as well. A final line without a
/// terminator is still emitted, but input ending in `\n` produces no trailing empty
/// line. Bytes that are not valid UTF-8 are replaced. A read error ends the
/// sequence and is logged; a partial line read before the error is still emitted.
pub fn from_lines<R>(reader: R) -> Conduit<String>
where
    R: BufRead + Send + 'static,
{
    Conduit::spawn("lines", move |out| scan_lines(reader, |line| out.send(line)))
}

/// The whitespace-separated words of `reader`. Runs of whitespace, including line
/// breaks, separate words; no empty words are produced.
pub fn from_words<R>(reader: R) -> Conduit<String>
where
    R: BufRead + Send + 'static,
{
    Conduit::spawn("words", move |out| {
        scan_lines(reader, |line| {
            for word in line.split_whitespace() {
                out.send(word.to_string())?;
            }
            Ok(())
        })
    })
}

fn scan_lines<R, F>(mut reader: R, mut emit: F) -> std::result::Result<(), Cancelled>
where
    R: BufRead,
    F: FnMut(String) -> std::result::Result<(), Cancelled>,
{
    let mut buf = Vec::new();
    loop {
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => return Ok(()),
            Ok(_) => {
                emit(line_text(&mut buf))?;
                buf.clear();
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                log::warn!("text source stopped on read error: {e}");
                if !buf.is_empty() {
                    emit(line_text(&mut buf))?;
                }
                return Ok(());
            }
        }
    }
}

fn line_text(buf: &mut Vec<u8>) -> String {
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    String::from_utf8_lossy(buf).into_owned()
}

/// Builds a `Conduit<Value>` from heterogeneous literals.
///
/// ```
/// let mut conduit = sluice::conduit![1, "two", 3.5];
/// assert_eq!(conduit.take(3).len(), 3);
/// ```
#[macro_export]
macro_rules! conduit {
    ($($value:expr),* $(,)?) => {
        $crate::sources::values(vec![$($crate::Value::from($value)),*])
    };
}
