//! The bridge between Rust parameter/return types and the dynamic `Value` model.

use cmdpack::TypeDescriptor;
use cmdpack::Value;

/// A Rust type that can cross the call boundary.
///
/// `from_value` only ever sees values decoded against `descriptor()`, so it returns `None`
/// solely for values built by hand that do not conform.
pub trait NativeType: Sized {
    fn descriptor() -> TypeDescriptor;
    fn into_value(self) -> Value;
    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! signed {
    ($($ty:ty => $desc:ident),*) => {$(
        impl NativeType for $ty {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::$desc
            }

            fn into_value(self) -> Value {
                Value::Int(i64::from(self))
            }

            fn from_value(value: Value) -> Option<Self> {
                value.as_i64().and_then(|v| <$ty>::try_from(v).ok())
            }
        }
    )*};
}

macro_rules! unsigned {
    ($($ty:ty => $desc:ident),*) => {$(
        impl NativeType for $ty {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::$desc
            }

            fn into_value(self) -> Value {
                Value::UInt(u64::from(self))
            }

            fn from_value(value: Value) -> Option<Self> {
                value.as_u64().and_then(|v| <$ty>::try_from(v).ok())
            }
        }
    )*};
}

signed!(i8 => I8, i16 => I16, i32 => I32, i64 => I64);
unsigned!(u8 => U8, u16 => U16, u32 => U32, u64 => U64);

impl NativeType for f32 {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::F32
    }

    fn into_value(self) -> Value {
        Value::Float(f64::from(self))
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(v as f32),
            _ => None,
        }
    }
}

impl NativeType for f64 {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::F64
    }

    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(v),
            _ => None,
        }
    }
}

impl NativeType for bool {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Bool
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl NativeType for String {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::String
    }

    fn into_value(self) -> Value {
        Value::String(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl NativeType for () {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Void
    }

    fn into_value(self) -> Value {
        Value::Void
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Void => Some(()),
            _ => None,
        }
    }
}

impl<T: NativeType> NativeType for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::sequence(T::descriptor())
    }

    fn into_value(self) -> Value {
        Value::Seq(self.into_iter().map(T::into_value).collect())
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Seq(items) => items.into_iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

impl<T: NativeType, const N: usize> NativeType for [T; N] {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::array(T::descriptor(), N as u64)
    }

    fn into_value(self) -> Value {
        Value::Seq(self.into_iter().map(T::into_value).collect())
    }

    fn from_value(value: Value) -> Option<Self> {
        let items: Vec<T> = Vec::from_value(value)?;
        items.try_into().ok()
    }
}
