//! Type-erased callables with a runtime-inspectable signature.
//!
//! A [`Callable`] is built from an ordinary Rust closure or function whose argument
//! and return types implement [`ValueType`]. The shapes of those types are recorded
//! in a [`Signature`] when the callable is built. The adapters in
//! [`crate::adapter`] validate against that signature before anything is invoked.
//!
//! Invocation boxes every argument as a [`Value`], calls through the erased closure,
//! and boxes the results again. Passing an argument whose shape disagrees with the
//! signature is a contract violation and panics; it is never reported as an error.

use std::{fmt, sync::Arc};

use sluice_common::{Result, error::Error, verify_arg};

use crate::value::{Shape, Value, ValueType};

/// Input and output shapes of a [`Callable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub inputs: Vec<Shape>,
    pub outputs: Vec<Shape>,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "func(")?;
        for (i, shape) in self.inputs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{shape}")?;
        }
        write!(f, ")")?;
        match self.outputs.as_slice() {
            [] => Ok(()),
            [single] => write!(f, " -> {single}"),
            many => {
                write!(f, " -> (")?;
                for (i, shape) in many.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{shape}")?;
                }
                write!(f, ")")
            }
        }
    }
}

type Invoker = dyn Fn(Vec<Value>) -> Vec<Value> + Send + Sync;

/// A shareable, immutable, type-erased function over [`Value`]s.
#[derive(Clone)]
pub struct Callable {
    signature: Arc<Signature>,
    invoke: Arc<Invoker>,
}

impl Callable {
    /// Wraps a Rust closure or function.
    pub fn new<M>(f: impl IntoCallable<M>) -> Callable {
        f.into_callable()
    }

    pub(crate) fn from_parts(
        signature: Signature,
        invoke: impl Fn(Vec<Value>) -> Vec<Value> + Send + Sync + 'static,
    ) -> Callable {
        Callable {
            signature: Arc::new(signature),
            invoke: Arc::new(invoke),
        }
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn arity(&self) -> usize {
        self.signature.inputs.len()
    }

    /// Returns `true` if both handles refer to the same underlying function.
    pub fn ptr_eq(&self, other: &Callable) -> bool {
        Arc::ptr_eq(&self.invoke, &other.invoke)
    }

    /// Invokes the function.
    ///
    /// # Panics
    ///
    /// Panics if the number of arguments differs from the arity, or if an argument's
    /// shape does not match the signature.
    pub fn call(&self, args: Vec<Value>) -> Vec<Value> {
        assert_eq!(
            args.len(),
            self.arity(),
            "{} called with {} argument(s)",
            self.signature,
            args.len()
        );
        (self.invoke)(args)
    }

    /// Binds the leading arguments, returning a callable that awaits the rest.
    ///
    /// Fails if more arguments are supplied than the callable takes, or if an
    /// argument's shape does not match the corresponding input.
    pub fn curry(&self, args: impl IntoIterator<Item = Value>) -> Result<Callable> {
        let bound: Vec<Value> = args.into_iter().collect();
        verify_arg!(args, bound.len() <= self.arity());
        for (position, (arg, shape)) in bound.iter().zip(&self.signature.inputs).enumerate() {
            if !shape.accepts(arg) {
                return Err(Error::argument_shape(
                    position,
                    shape.to_string(),
                    arg.shape().to_string(),
                ));
            }
        }

        let signature = Signature {
            inputs: self.signature.inputs[bound.len()..].to_vec(),
            outputs: self.signature.outputs.clone(),
        };
        let inner = self.clone();
        Ok(Callable::from_parts(signature, move |rest| {
            let mut args = bound.clone();
            args.extend(rest);
            inner.call(args)
        }))
    }

    /// Swaps the first two inputs.
    pub fn flip(&self) -> Result<Callable> {
        let arity = self.arity();
        verify_arg!(arity, arity >= 2);

        let mut signature = (*self.signature).clone();
        signature.inputs.swap(0, 1);
        let inner = self.clone();
        Ok(Callable::from_parts(signature, move |mut args| {
            args.swap(0, 1);
            inner.call(args)
        }))
    }

    /// Swaps the first two inputs, then binds `args` as the leading arguments of the
    /// flipped callable.
    pub fn flip_curry(&self, args: impl IntoIterator<Item = Value>) -> Result<Callable> {
        self.flip()?.curry(args)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callable").field(&self.signature).finish()
    }
}

impl TryFrom<Value> for Callable {
    type Error = Error;

    /// Rejects every value that is not a function.
    fn try_from(value: Value) -> Result<Callable> {
        match value {
            Value::Func(callable) => Ok(callable),
            other => Err(Error::not_callable(other.shape().to_string())),
        }
    }
}

/// The return side of a wrappable function: one value, nothing, or a pair.
pub trait Returns: Send + 'static {
    fn shapes() -> Vec<Shape>;

    fn into_values(self) -> Vec<Value>;
}

impl<T: ValueType> Returns for T {
    fn shapes() -> Vec<Shape> {
        vec![T::SHAPE]
    }

    fn into_values(self) -> Vec<Value> {
        vec![self.into_value()]
    }
}

impl Returns for () {
    fn shapes() -> Vec<Shape> {
        Vec::new()
    }

    fn into_values(self) -> Vec<Value> {
        Vec::new()
    }
}

impl<A: ValueType, B: ValueType> Returns for (A, B) {
    fn shapes() -> Vec<Shape> {
        vec![A::SHAPE, B::SHAPE]
    }

    fn into_values(self) -> Vec<Value> {
        vec![self.0.into_value(), self.1.into_value()]
    }
}

/// Conversion of closures and functions into a [`Callable`].
///
/// The `Marker` parameter only disambiguates the implementations (`fn(A) -> R`
/// for unary functions, `fn(A, B) -> R` for binary ones); callers never name it.
pub trait IntoCallable<Marker> {
    fn into_callable(self) -> Callable;
}

impl IntoCallable<Callable> for Callable {
    fn into_callable(self) -> Callable {
        self
    }
}

impl<F, A, R> IntoCallable<fn(A) -> R> for F
where
    F: Fn(A) -> R + Send + Sync + 'static,
    A: ValueType,
    R: Returns,
{
    fn into_callable(self) -> Callable {
        let signature = Signature {
            inputs: vec![A::SHAPE],
            outputs: R::shapes(),
        };
        Callable::from_parts(signature, move |args| {
            let mut args = args.into_iter();
            let a = unbox::<A>(args.next(), 0);
            self(a).into_values()
        })
    }
}

impl<F, A, B, R> IntoCallable<fn(A, B) -> R> for F
where
    F: Fn(A, B) -> R + Send + Sync + 'static,
    A: ValueType,
    B: ValueType,
    R: Returns,
{
    fn into_callable(self) -> Callable {
        let signature = Signature {
            inputs: vec![A::SHAPE, B::SHAPE],
            outputs: R::shapes(),
        };
        Callable::from_parts(signature, move |args| {
            let mut args = args.into_iter();
            let a = unbox::<A>(args.next(), 0);
            let b = unbox::<B>(args.next(), 1);
            self(a, b).into_values()
        })
    }
}

fn unbox<T: ValueType>(arg: Option<Value>, position: usize) -> T {
    match T::from_value(arg.unwrap_or_default()) {
        Ok(value) => value,
        Err(value) => panic!(
            "argument #{position} must be {}, got {}",
            T::SHAPE,
            value.shape()
        ),
    }
}
