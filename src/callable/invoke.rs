//! Checked invocation of a wrapped function.

use super::{Arg, Args, Callable, Descriptor, TypeDesc};
use crate::error::CallError;

/// Verify `args` against the validated argument types.
///
/// Types must match exactly; no conversion is attempted.
pub(crate) fn check_arguments(descriptor: &Descriptor, args: &[Arg]) -> Result<(), CallError> {
    if args.len() != descriptor.arity() {
        return Err(CallError::ArgumentCountMismatch {
            expected: descriptor.arity(),
            actual: args.len(),
        });
    }

    for (index, (arg, expected)) in args.iter().zip(descriptor.inputs()).enumerate() {
        let actual = arg.type_desc();
        if actual != *expected {
            return Err(CallError::ArgumentTypeMismatch {
                index,
                expected: *expected,
                actual,
            });
        }
    }

    Ok(())
}

/// Call the wrapped function and normalize its result to `T`.
///
/// `args` are expected to have passed [`check_arguments`] already; the adapter
/// still refuses a value it cannot downcast. A reported failure becomes
/// [`CallError::Underlying`] with the original error kept as its source.
pub(crate) fn call<T: 'static>(callable: &Callable, args: Args) -> Result<T, CallError> {
    let returned = callable.call_erased(args)?;
    if let Some(err) = returned.error {
        return Err(CallError::underlying(err));
    }

    returned
        .values
        .into_iter()
        .next()
        .and_then(|value| value.downcast::<T>().ok())
        .map(|value| *value)
        .ok_or(CallError::UnexpectedOutput {
            expected: TypeDesc::of::<T>(),
        })
}
