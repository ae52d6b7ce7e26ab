//! Per-trait async adapters.
//!
//! [`async_capability!`](crate::async_capability) declares a mirror of an
//! existing trait in which every method returns a pending result, and
//! implements that mirror for `AsyncProxy<T>` whenever `T` implements the
//! original trait. The proxy then exposes the same capability set as its
//! target, only asynchronously.

/// Declares the async mirror of a trait and implements it for [`AsyncProxy`](crate::AsyncProxy).
///
/// Methods are listed with their plain return type. Methods whose real
/// signature returns `Result<R, E>` are written `-> R | E`: an `Err` is then
/// captured as [`ExecutionError::Failed`](crate::ExecutionError::Failed)
/// instead of being handed back as a value.
///
/// Arguments are moved into the deferred call, so they must be owned
/// (`Send + 'static`).
///
/// ```rust
/// use offload::prelude::*;
/// use std::sync::Arc;
///
/// pub trait Calculator: Send + Sync {
///     fn add(&self, a: i32, b: i32) -> i32;
///     fn divide(&self, a: i32, b: i32) -> Result<i32, std::io::Error>;
/// }
///
/// offload::async_capability! {
///     pub trait CalculatorAsync: Calculator {
///         fn add(&self, a: i32, b: i32) -> i32;
///         fn divide(&self, a: i32, b: i32) -> i32 | std::io::Error;
///     }
/// }
///
/// struct Basic;
///
/// impl Calculator for Basic {
///     fn add(&self, a: i32, b: i32) -> i32 {
///         a + b
///     }
///     fn divide(&self, a: i32, b: i32) -> Result<i32, std::io::Error> {
///         a.checked_div(b)
///             .ok_or_else(|| std::io::Error::other("division by zero"))
///     }
/// }
///
/// let pool = WorkerPool::new(PoolConfig::new().with_workers(2)).unwrap();
/// let proxy = AsyncProxy::with_pool(Arc::new(Basic), &pool);
///
/// assert_eq!(proxy.add(2, 3).unwrap().get().unwrap(), 5);
/// assert!(proxy.divide(1, 0).unwrap().get().is_err());
/// ```
#[macro_export]
macro_rules! async_capability {
    (
        $(#[$meta:meta])*
        $vis:vis trait $name:ident : $cap:path {
            $(
                $(#[$method_meta:meta])*
                fn $method:ident(&self $(, $arg:ident : $arg_ty:ty)*) -> $ret:ty $(| $err:ty)?;
            )*
        }
    ) => {
        $(#[$meta])*
        $vis trait $name {
            $(
                $(#[$method_meta])*
                fn $method(
                    &self $(, $arg: $arg_ty)*
                ) -> ::core::result::Result<$crate::PendingResult<$ret>, $crate::SubmitError>;
            )*
        }

        impl<__Target> $name for $crate::AsyncProxy<__Target>
        where
            __Target: ?Sized + $cap + ::core::marker::Send + ::core::marker::Sync + 'static,
        {
            $(
                fn $method(
                    &self $(, $arg: $arg_ty)*
                ) -> ::core::result::Result<$crate::PendingResult<$ret>, $crate::SubmitError> {
                    $crate::__async_capability_call!(
                        self, __Target, $cap, $method ($($arg),*) $(| $err)?
                    )
                }
            )*
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __async_capability_call {
    ($proxy:expr, $target:ident, $cap:path, $method:ident ($($arg:ident),*) | $err:ty) => {
        $proxy.try_call(::core::stringify!($method), move |target: &$target| {
            <$target as $cap>::$method(target $(, $arg)*)
        })
    };
    ($proxy:expr, $target:ident, $cap:path, $method:ident ($($arg:ident),*)) => {
        $proxy.call(::core::stringify!($method), move |target: &$target| {
            <$target as $cap>::$method(target $(, $arg)*)
        })
    };
}
