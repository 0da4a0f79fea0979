//! Map, filter and reduce adapters.
//!
//! Each adapter wraps a [`Callable`] after checking that its signature has the
//! shape the pipeline will use it in:
//!
//! | adapter        | inputs | outputs                                   |
//! |----------------|--------|-------------------------------------------|
//! | [`MapFunc`]    | 1      | exactly 1, any shape                      |
//! | [`FilterFunc`] | 1      | exactly 1, `Bool`                         |
//! | [`ReduceFunc`] | 2      | exactly 1, same shape as the second input |
//!
//! All checks happen in the constructors. A constructed adapter is immutable and
//! never reports a type error when called.

use sluice_common::{Result, error::Error};

use crate::{
    callable::{Callable, IntoCallable, Signature},
    value::{Shape, Value},
};

fn check_counts(adapter: &'static str, signature: &Signature, inputs: usize) -> Result<()> {
    if signature.inputs.len() != inputs {
        return Err(Error::arity(adapter, inputs, signature.inputs.len()));
    }
    if signature.outputs.len() != 1 {
        return Err(Error::output_count(adapter, 1, signature.outputs.len()));
    }
    Ok(())
}

fn single_output(mut outputs: Vec<Value>) -> Value {
    outputs.pop().unwrap_or_default()
}

/// A validated unary transform.
#[derive(Debug, Clone)]
pub struct MapFunc {
    callable: Callable,
    output: Shape,
}

impl MapFunc {
    pub fn new<M>(f: impl IntoCallable<M>) -> Result<MapFunc> {
        Self::from_callable(f.into_callable())
    }

    pub fn from_callable(callable: Callable) -> Result<MapFunc> {
        check_counts("map", callable.signature(), 1)?;
        let output = callable.signature().outputs[0];
        Ok(MapFunc { callable, output })
    }

    /// Wraps a [`Value::Func`]; any other value is rejected as not callable.
    pub fn from_value(value: Value) -> Result<MapFunc> {
        Self::from_callable(Callable::try_from(value)?)
    }

    pub fn input(&self) -> Shape {
        self.callable.signature().inputs[0]
    }

    pub fn output(&self) -> Shape {
        self.output
    }

    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    pub fn call(&self, value: Value) -> Value {
        single_output(self.callable.call(vec![value]))
    }
}

/// A validated predicate.
#[derive(Debug, Clone)]
pub struct FilterFunc {
    callable: Callable,
}

impl FilterFunc {
    pub fn new<M>(f: impl IntoCallable<M>) -> Result<FilterFunc> {
        Self::from_callable(f.into_callable())
    }

    pub fn from_callable(callable: Callable) -> Result<FilterFunc> {
        let signature = callable.signature();
        check_counts("filter", signature, 1)?;
        if signature.outputs[0] != Shape::Bool {
            return Err(Error::return_shape(
                "filter",
                Shape::Bool.to_string(),
                signature.outputs[0].to_string(),
            ));
        }
        Ok(FilterFunc { callable })
    }

    pub fn from_value(value: Value) -> Result<FilterFunc> {
        Self::from_callable(Callable::try_from(value)?)
    }

    pub fn input(&self) -> Shape {
        self.callable.signature().inputs[0]
    }

    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    pub fn call(&self, value: &Value) -> bool {
        matches!(
            single_output(self.callable.call(vec![value.clone()])),
            Value::Bool(true)
        )
    }

    /// Returns a predicate that holds exactly when this one does not.
    pub fn negate(&self) -> FilterFunc {
        let inner = self.callable.clone();
        let callable = Callable::from_parts(inner.signature().clone(), move |args| {
            let holds = matches!(single_output(inner.call(args)), Value::Bool(true));
            vec![Value::Bool(!holds)]
        });
        FilterFunc { callable }
    }
}

/// Negates a predicate.
pub fn not(pred: &FilterFunc) -> FilterFunc {
    pred.negate()
}

/// A validated fold step, called as `(value, accumulator) -> accumulator`.
#[derive(Debug, Clone)]
pub struct ReduceFunc {
    callable: Callable,
    accumulator: Shape,
}

impl ReduceFunc {
    pub fn new<M>(f: impl IntoCallable<M>) -> Result<ReduceFunc> {
        Self::from_callable(f.into_callable())
    }

    pub fn from_callable(callable: Callable) -> Result<ReduceFunc> {
        let signature = callable.signature();
        check_counts("reduce", signature, 2)?;
        let accumulator = signature.inputs[1];
        let output = signature.outputs[0];
        if accumulator != output {
            return Err(Error::accumulator(
                accumulator.to_string(),
                output.to_string(),
            ));
        }
        Ok(ReduceFunc {
            callable,
            accumulator,
        })
    }

    pub fn from_value(value: Value) -> Result<ReduceFunc> {
        Self::from_callable(Callable::try_from(value)?)
    }

    /// Shape of the accumulator, which is also the shape of the result.
    pub fn accumulator(&self) -> Shape {
        self.accumulator
    }

    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    pub fn call(&self, value: Value, accumulator: Value) -> Value {
        single_output(self.callable.call(vec![value, accumulator]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_common::error::ErrorKind;

    #[test]
    fn test_map_func() {
        let inc = MapFunc::new(|v: i64| v + 1).unwrap();
        assert_eq!(inc.input(), Shape::Int);
        assert_eq!(inc.output(), Shape::Int);
        assert_eq!(inc.call(Value::from(1)), Value::from(2));

        let describe = MapFunc::new(|v: Value| v.to_string()).unwrap();
        assert_eq!(describe.input(), Shape::Any);
        assert_eq!(describe.call(Value::from(true)), Value::from("true"));
    }

    #[test]
    fn test_map_func_rejects_bad_shapes() {
        let err = MapFunc::new(|a: i64, b: i64| a + b).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::ArityMismatch {
                adapter: "map",
                expected: 1,
                found: 2
            }
        ));

        let err = MapFunc::new(|_: i64| {}).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::OutputCountMismatch { found: 0, .. }
        ));

        let err = MapFunc::from_value(Value::from("not a function")).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::NotCallable { .. }));
    }

    #[test]
    fn test_filter_func() {
        let even = FilterFunc::new(|v: i64| v % 2 == 0).unwrap();
        assert!(even.call(&Value::from(4)));
        assert!(!even.call(&Value::from(3)));

        let odd = not(&even);
        assert!(odd.call(&Value::from(3)));
        assert!(!odd.call(&Value::from(4)));
        assert_eq!(odd.input(), Shape::Int);
    }

    #[test]
    fn test_filter_func_requires_bool() {
        // Fails at construction, before the predicate is ever invoked.
        let err = FilterFunc::new(|v: i64| -> i64 { panic!("invoked with {v}") }).unwrap_err();
        match err.kind() {
            ErrorKind::ReturnShapeMismatch {
                adapter,
                expected,
                found,
            } => {
                assert_eq!(*adapter, "filter");
                assert_eq!(expected, "Bool");
                assert_eq!(found, "Int");
            }
            other => panic!("unexpected error kind: {other:?}"),
        }

        let err = FilterFunc::new(|v: i64| (v > 0, v < 10)).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::OutputCountMismatch { found: 2, .. }
        ));

        // A raw Value result is not statically boolean either.
        assert!(FilterFunc::new(|v: Value| v).is_err());
    }

    #[test]
    fn test_reduce_func() {
        let add = ReduceFunc::new(|v: i64, acc: i64| v + acc).unwrap();
        assert_eq!(add.accumulator(), Shape::Int);
        assert_eq!(add.call(Value::from(2), Value::from(40)), Value::from(42));

        let join = ReduceFunc::new(|v: String, acc: String| format!("{acc}{v}")).unwrap();
        assert_eq!(
            join.call(Value::from("b"), Value::from("a")),
            Value::from("ab")
        );
    }

    #[test]
    fn test_reduce_func_rejects_bad_shapes() {
        let err = ReduceFunc::new(|v: i64, acc: String| acc.len() as i64 + v).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::AccumulatorMismatch { .. }));

        let err = ReduceFunc::new(|v: i64| v).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::ArityMismatch {
                adapter: "reduce",
                expected: 2,
                found: 1
            }
        ));

        // Input and output may be different shapes as long as the accumulator agrees.
        let count = ReduceFunc::new(|_: String, acc: i64| acc + 1).unwrap();
        assert_eq!(count.call(Value::from("x"), Value::from(0)), Value::from(1));
    }

    #[test]
    fn test_adapters_from_curried_callables() {
        let add = Callable::new(|a: i64, b: i64| a + b);
        let add_five = MapFunc::from_callable(add.curry([Value::from(5)]).unwrap()).unwrap();
        assert_eq!(add_five.call(Value::from(1)), Value::from(6));

        let gt = Callable::new(|a: i64, b: i64| a > b);
        let below_ten = FilterFunc::from_callable(gt.curry([Value::from(10)]).unwrap()).unwrap();
        assert!(below_ten.call(&Value::from(3)));
        assert!(!below_ten.call(&Value::from(30)));
    }
}
