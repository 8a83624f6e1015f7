//! Logging facade
//!
//! Forwards to `defmt` on the target. Host builds (`std` feature) compile
//! the macros to nothing so the functional core stays testable without a
//! defmt logger. Arguments are still borrowed so unused-variable lints match
//! between both builds.

#![allow(unused_macros)]

#[cfg(feature = "embedded")]
macro_rules! trace {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        ::defmt::trace!($fmt $(, $arg)*)
    };
}

#[cfg(feature = "embedded")]
macro_rules! debug {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        ::defmt::debug!($fmt $(, $arg)*)
    };
}

#[cfg(feature = "embedded")]
macro_rules! info {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        ::defmt::info!($fmt $(, $arg)*)
    };
}

#[cfg(feature = "embedded")]
macro_rules! warn {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        ::defmt::warn!($fmt $(, $arg)*)
    };
}

#[cfg(feature = "embedded")]
macro_rules! error {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        ::defmt::error!($fmt $(, $arg)*)
    };
}

#[cfg(not(feature = "embedded"))]
macro_rules! trace {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        $(let _ = &$arg;)*
    }};
}

#[cfg(not(feature = "embedded"))]
macro_rules! debug {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        $(let _ = &$arg;)*
    }};
}

#[cfg(not(feature = "embedded"))]
macro_rules! info {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        $(let _ = &$arg;)*
    }};
}

#[cfg(not(feature = "embedded"))]
macro_rules! warn {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        $(let _ = &$arg;)*
    }};
}

#[cfg(not(feature = "embedded"))]
macro_rules! error {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        $(let _ = &$arg;)*
    }};
}
