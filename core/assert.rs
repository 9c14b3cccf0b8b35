/// pgex_assert! is a direct replacement for the assert! builtin used for internal
/// consistency checks. A failure means an upstream contract was broken (for example a
/// plan tree handed to the engine that is not actually a tree), never bad user input,
/// so the message is prefixed to make that distinction obvious in a panic report.
#[macro_export]
macro_rules! pgex_assert {
    ($cond:expr, $msg:literal, $($optional:tt)+) => {
        assert!($cond, concat!("internal consistency violation: ", $msg), $($optional)+);
    };
    ($cond:expr, $msg:literal) => {
        assert!($cond, concat!("internal consistency violation: ", $msg));
    };
}

/// Assert that a type implements both Send and Sync at compile time.
/// Usage: assert_send_sync!(MyType);
/// Usage: assert_send_sync!(Type1, Type2, Type3);
macro_rules! assert_send_sync {
    ($($t:ty),+ $(,)?) => {
        #[cfg(test)]
        $(const _: () = {
            const fn _assert_send<T: ?Sized + Send>() {}
            const fn _assert_sync<T: ?Sized + Sync>() {}
            _assert_send::<$t>();
            _assert_sync::<$t>();
        };)+
    };
}
pub(crate) use assert_send_sync;
