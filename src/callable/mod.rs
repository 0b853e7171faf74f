//! Type-erased call adapter.
//!
//! A [`Callable`] wraps an ordinary Rust function or closure together with a
//! [`Signature`] describing its argument and return types. The adapter is
//! generated at compile time per arity through the [`Function`] trait, so the
//! cache can later call it with a runtime-checked [`Args`] list.
//!
//! The constructor picks the return shape:
//! - [`Callable::new`] - a single value (`()` counts as no value)
//! - [`Callable::fallible`] - `Result<T, E>`, a value plus an error
//! - [`Callable::multi`] - a tuple of several plain values

mod args;
pub(crate) mod invoke;
mod signature;

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

pub use args::{Arg, Args};
pub use signature::{Descriptor, ReturnSlot, Signature, TypeDesc, validate};

use crate::error::{BoxError, CallError, ConstructionError};

/// Values produced by one invocation, before normalization.
pub(crate) struct Returned {
    pub values: Vec<Box<dyn Any + Send>>,
    pub error: Option<BoxError>,
}

type ErasedFn = dyn Fn(Args) -> Result<Returned, CallError> + Send + Sync;

/// A function of a fixed arity whose arguments can be supplied type-erased.
///
/// Implemented for every `Fn(A1, .., An) -> R` with up to eight arguments.
/// `Marker` is the matching `fn(A1, .., An) -> R` pointer type and only serves
/// to keep the per-arity impls apart.
pub trait Function<Marker>: Send + Sync + 'static {
    type Output: Send + 'static;

    /// Argument types, in order.
    fn inputs() -> Vec<TypeDesc>;

    /// Downcast every argument to its declared type and call the function.
    fn call(&self, args: Args) -> Result<Self::Output, CallError>;
}

/// Pull the next argument and downcast it to `A`.
fn take<A: 'static>(
    args: &mut impl Iterator<Item = (usize, Arg)>,
    arity: usize,
) -> Result<A, CallError> {
    let Some((index, arg)) = args.next() else {
        return Err(CallError::ArgumentCountMismatch {
            expected: arity,
            actual: arity - 1,
        });
    };
    let actual = arg.type_desc();
    arg.downcast::<A>()
        .map_err(|_| CallError::ArgumentTypeMismatch {
            index,
            expected: TypeDesc::of::<A>(),
            actual,
        })
}

macro_rules! impl_function {
    ($($arg:ident),*) => {
        impl<F, R, $($arg,)*> Function<fn($($arg,)*) -> R> for F
        where
            F: Send + Sync + 'static,
            F: Fn($($arg),*) -> R,
            R: Send + 'static,
            $($arg: 'static,)*
        {
            type Output = R;

            fn inputs() -> Vec<TypeDesc> {
                vec![$(TypeDesc::of::<$arg>()),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn call(&self, args: Args) -> Result<R, CallError> {
                let arity = <Self as Function<fn($($arg,)*) -> R>>::inputs().len();
                if args.len() != arity {
                    return Err(CallError::ArgumentCountMismatch {
                        expected: arity,
                        actual: args.len(),
                    });
                }
                let mut args = args.into_iter().enumerate();
                $(let $arg = take::<$arg>(&mut args, arity)?;)*
                Ok((self)($($arg),*))
            }
        }
    };
}

impl_function!();
impl_function!(A1);
impl_function!(A1, A2);
impl_function!(A1, A2, A3);
impl_function!(A1, A2, A3, A4);
impl_function!(A1, A2, A3, A4, A5);
impl_function!(A1, A2, A3, A4, A5, A6);
impl_function!(A1, A2, A3, A4, A5, A6, A7);
impl_function!(A1, A2, A3, A4, A5, A6, A7, A8);

/// Tuples returned by functions wrapped with [`Callable::multi`].
pub trait Tuple: Send + 'static {
    fn slots() -> Vec<ReturnSlot>;

    fn into_values(self) -> Vec<Box<dyn Any + Send>>;
}

macro_rules! impl_tuple {
    ($($ty:ident),+) => {
        impl<$($ty: Send + 'static),+> Tuple for ($($ty,)+) {
            fn slots() -> Vec<ReturnSlot> {
                vec![$(ReturnSlot::value::<$ty>()),+]
            }

            #[allow(non_snake_case)]
            fn into_values(self) -> Vec<Box<dyn Any + Send>> {
                let ($($ty,)+) = self;
                vec![$(Box::new($ty) as Box<dyn Any + Send>),+]
            }
        }
    };
}

impl_tuple!(A, B);
impl_tuple!(A, B, C);
impl_tuple!(A, B, C, D);

/// A wrapped function together with its signature.
///
/// Cloning is cheap and shares the same function.
#[derive(Clone)]
pub struct Callable {
    signature: Signature,
    erased: Arc<ErasedFn>,
}

impl Callable {
    /// Wrap a function returning a single value.
    ///
    /// A function returning `()` is treated as returning no value at all.
    pub fn new<F, M>(f: F) -> Self
    where
        F: Function<M>,
        M: 'static,
    {
        let outputs = if TypeId::of::<F::Output>() == TypeId::of::<()>() {
            Vec::new()
        } else {
            vec![ReturnSlot::value::<F::Output>()]
        };

        Self {
            signature: Signature {
                inputs: F::inputs(),
                outputs,
            },
            erased: Arc::new(move |args: Args| -> Result<Returned, CallError> {
                let value = f.call(args)?;
                Ok(Returned {
                    values: vec![Box::new(value) as Box<dyn Any + Send>],
                    error: None,
                })
            }),
        }
    }

    /// Wrap a function returning `Result<T, E>`.
    ///
    /// The `Ok` value is what gets cached; an `Err` is reported to the caller
    /// and never cached.
    pub fn fallible<F, M, T, E>(f: F) -> Self
    where
        F: Function<M, Output = Result<T, E>>,
        M: 'static,
        T: Send + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            signature: Signature {
                inputs: F::inputs(),
                outputs: vec![ReturnSlot::value::<T>(), ReturnSlot::error::<E>()],
            },
            erased: Arc::new(move |args: Args| -> Result<Returned, CallError> {
                Ok(match f.call(args)? {
                    Ok(value) => Returned {
                        values: vec![Box::new(value) as Box<dyn Any + Send>],
                        error: None,
                    },
                    Err(err) => Returned {
                        values: Vec::new(),
                        error: Some(Box::new(err) as BoxError),
                    },
                })
            }),
        }
    }

    /// Wrap a function returning a tuple; each element is a separate value.
    pub fn multi<F, M>(f: F) -> Self
    where
        F: Function<M>,
        F::Output: Tuple,
        M: 'static,
    {
        Self {
            signature: Signature {
                inputs: F::inputs(),
                outputs: <F::Output as Tuple>::slots(),
            },
            erased: Arc::new(move |args: Args| -> Result<Returned, CallError> {
                Ok(Returned {
                    values: f.call(args)?.into_values(),
                    error: None,
                })
            }),
        }
    }

    /// Recover a `Callable` from an opaque value.
    pub fn from_any(value: Box<dyn Any + Send>) -> Result<Self, ConstructionError> {
        value
            .downcast::<Self>()
            .map(|callable| *callable)
            .map_err(|_| ConstructionError::NotCallable)
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub(crate) fn call_erased(&self, args: Args) -> Result<Returned, CallError> {
        (self.erased)(args)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("signature", &self.signature)
            .finish()
    }
}
