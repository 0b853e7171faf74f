//! Function signatures and construction-time validation.

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::ConstructionError;

/// Runtime description of a concrete type.
///
/// Two descriptions are equal when they name the same `TypeId`; the name is
/// only carried for messages.
#[derive(Clone, Copy)]
pub struct TypeDesc {
    id: TypeId,
    name: &'static str,
}

impl TypeDesc {
    /// Describe `T`.
    pub fn of<T: 'static + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Check whether this describes `T`.
    pub fn is<T: 'static + ?Sized>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeDesc {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDesc {}

impl Hash for TypeDesc {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// One value returned by a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnSlot {
    pub ty: TypeDesc,
    /// Whether the slot carries an error (the `E` of a `Result<T, E>`).
    pub is_error: bool,
}

impl ReturnSlot {
    /// A plain value of type `T`.
    pub fn value<T: 'static>() -> Self {
        Self {
            ty: TypeDesc::of::<T>(),
            is_error: false,
        }
    }

    /// An error of type `E`.
    pub fn error<E: 'static>() -> Self {
        Self {
            ty: TypeDesc::of::<E>(),
            is_error: true,
        }
    }
}

/// Shape of a function: ordered argument types and ordered return values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub inputs: Vec<TypeDesc>,
    pub outputs: Vec<ReturnSlot>,
}

/// A signature that passed validation against a cache's value type.
///
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    inputs: Vec<TypeDesc>,
    output: TypeDesc,
    returns_error: bool,
}

impl Descriptor {
    /// Expected argument types, in order.
    pub fn inputs(&self) -> &[TypeDesc] {
        &self.inputs
    }

    pub fn arity(&self) -> usize {
        self.inputs.len()
    }

    /// Type of the cached value.
    pub fn output(&self) -> TypeDesc {
        self.output
    }

    /// Whether the function reports failures through a second return value.
    pub fn returns_error(&self) -> bool {
        self.returns_error
    }
}

/// Validate that `signature` can back a cache of `T` values.
///
/// Checks run in order and the first failure is returned.
pub fn validate<T: 'static>(signature: &Signature) -> Result<Descriptor, ConstructionError> {
    if signature.inputs.is_empty() {
        return Err(ConstructionError::MissingArguments);
    }

    let first = match signature.outputs.as_slice() {
        [] => return Err(ConstructionError::MissingReturnValue),
        [_, _, _, ..] => {
            return Err(ConstructionError::TooManyReturnValues {
                count: signature.outputs.len(),
            });
        }
        [first, ..] => first,
    };

    let expected = TypeDesc::of::<T>();
    if first.ty != expected || first.is_error {
        return Err(ConstructionError::ReturnTypeMismatch {
            expected,
            actual: first.ty,
        });
    }

    let returns_error = match signature.outputs.get(1) {
        Some(second) if !second.is_error => {
            return Err(ConstructionError::SecondReturnMustBeError { actual: second.ty });
        }
        Some(_) => true,
        None => false,
    };

    Ok(Descriptor {
        inputs: signature.inputs.clone(),
        output: expected,
        returns_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Failure;

    fn signature(inputs: Vec<TypeDesc>, outputs: Vec<ReturnSlot>) -> Signature {
        Signature { inputs, outputs }
    }

    #[test]
    fn test_type_desc_equality() {
        assert_eq!(TypeDesc::of::<u32>(), TypeDesc::of::<u32>());
        assert_ne!(TypeDesc::of::<u32>(), TypeDesc::of::<i32>());
        assert_ne!(TypeDesc::of::<Box<u32>>(), TypeDesc::of::<u32>());
        assert!(TypeDesc::of::<String>().is::<String>());
        assert_eq!(TypeDesc::of::<u8>().to_string(), "u8");
    }

    #[test]
    fn test_validate_plain_function() {
        let sig = signature(
            vec![TypeDesc::of::<u32>(), TypeDesc::of::<String>()],
            vec![ReturnSlot::value::<u64>()],
        );

        let descriptor = validate::<u64>(&sig).unwrap();
        assert_eq!(descriptor.arity(), 2);
        assert_eq!(descriptor.inputs()[1], TypeDesc::of::<String>());
        assert!(!descriptor.returns_error());
    }

    #[test]
    fn test_validate_fallible_function() {
        let sig = signature(
            vec![TypeDesc::of::<u32>()],
            vec![ReturnSlot::value::<u64>(), ReturnSlot::error::<Failure>()],
        );

        assert!(validate::<u64>(&sig).unwrap().returns_error());
    }

    #[test]
    fn test_validate_rejects_bad_shapes() {
        let no_args = signature(vec![], vec![ReturnSlot::value::<u64>()]);
        assert!(matches!(
            validate::<u64>(&no_args),
            Err(ConstructionError::MissingArguments)
        ));

        let no_returns = signature(vec![TypeDesc::of::<u32>()], vec![]);
        assert!(matches!(
            validate::<u64>(&no_returns),
            Err(ConstructionError::MissingReturnValue)
        ));

        let three_returns = signature(
            vec![TypeDesc::of::<u32>()],
            vec![
                ReturnSlot::value::<u64>(),
                ReturnSlot::value::<u64>(),
                ReturnSlot::value::<u64>(),
            ],
        );
        assert!(matches!(
            validate::<u64>(&three_returns),
            Err(ConstructionError::TooManyReturnValues { count: 3 })
        ));

        let wrong_first = signature(vec![TypeDesc::of::<u32>()], vec![ReturnSlot::value::<i8>()]);
        match validate::<u64>(&wrong_first) {
            Err(ConstructionError::ReturnTypeMismatch { expected, actual }) => {
                assert!(expected.is::<u64>());
                assert!(actual.is::<i8>());
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let plain_second = signature(
            vec![TypeDesc::of::<u32>()],
            vec![ReturnSlot::value::<u64>(), ReturnSlot::value::<String>()],
        );
        assert!(matches!(
            validate::<u64>(&plain_second),
            Err(ConstructionError::SecondReturnMustBeError { .. })
        ));
    }
}
