//! Type-erased argument lists.

use std::any::Any;
use std::fmt;

use super::TypeDesc;

/// Object-safe view of an argument value.
trait Value: Any + fmt::Debug + Send {
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<T> Value for T
where
    T: Any + fmt::Debug + Send,
{
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

/// One type-erased argument.
///
/// Any `'static + Debug + Send` value can be wrapped. Its `Debug` output is
/// what the cache key is built from, so it must depend on the value only
/// (prefer `BTreeMap` over `HashMap` for map arguments).
pub struct Arg {
    ty: TypeDesc,
    value: Box<dyn Value>,
}

impl Arg {
    pub fn new<T>(value: T) -> Self
    where
        T: Any + fmt::Debug + Send,
    {
        Self {
            ty: TypeDesc::of::<T>(),
            value: Box::new(value),
        }
    }

    /// Runtime type of the wrapped value.
    pub fn type_desc(&self) -> TypeDesc {
        self.ty
    }

    /// Take the value back out as `T`.
    ///
    /// Returns the argument unchanged if it holds a different type.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        if !self.ty.is::<T>() {
            return Err(self);
        }
        let ty = self.ty;
        match self.value.into_any().downcast::<T>() {
            Ok(value) => Ok(*value),
            // unreachable after the type check above
            Err(_) => Err(Self::new(format!("<lost value of {}>", ty))),
        }
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.value, f)
    }
}

/// Ordered argument list for one call.
pub type Args = Vec<Arg>;

/// Build an [`Args`] list from expressions.
///
/// ```
/// let args = recall::args![1u32, String::from("a")];
/// assert_eq!(args.len(), 2);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Arg::new($arg)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn test_args_keep_runtime_types() {
        let args: Args = crate::args![7u16, String::from("seven"), Box::new(7i64)];

        assert_eq!(args.len(), 3);
        assert!(args[0].type_desc().is::<u16>());
        assert!(args[1].type_desc().is::<String>());
        assert!(args[2].type_desc().is::<Box<i64>>());
    }

    #[test]
    fn test_downcast() {
        let arg = Arg::new(Point { x: 1, y: 2 });
        assert_eq!(arg.downcast::<Point>().unwrap(), Point { x: 1, y: 2 });

        let arg = Arg::new(5u8);
        let arg = arg.downcast::<u16>().unwrap_err();
        assert_eq!(arg.downcast::<u8>().unwrap(), 5);
    }

    #[test]
    fn test_debug_shows_value() {
        let arg = Arg::new(Box::new(Point { x: 1, y: 2 }));
        assert_eq!(format!("{:?}", arg), "Point { x: 1, y: 2 }");
    }
}
