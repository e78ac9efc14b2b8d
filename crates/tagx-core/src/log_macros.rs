/// Domain-aware logging macros.
///
/// Each macro injects a `domain` field so callers never spell the literal.
/// Domains used by this crate: `compile`, `cache`, `eval`, `valid`.
///
/// ```ignore
/// tx_debug!(cache, ty = name, programs = 3, "program published");
/// tx_warn!(compile, field = %path, error = %e, "annotation rejected");
/// ```

#[doc(hidden)]
macro_rules! tx_log {
    ($level:ident, $domain:ident, $($field:tt)*) => {
        tracing::$level!(domain = stringify!($domain), $($field)*)
    };
}

/// Log at WARN level with an automatic `domain` field.
macro_rules! tx_warn {
    ($domain:ident, $($rest:tt)*) => {
        tx_log!(warn, $domain, $($rest)*)
    };
}

/// Log at DEBUG level with an automatic `domain` field.
macro_rules! tx_debug {
    ($domain:ident, $($rest:tt)*) => {
        tx_log!(debug, $domain, $($rest)*)
    };
}

/// Log at TRACE level with an automatic `domain` field.
macro_rules! tx_trace {
    ($domain:ident, $($rest:tt)*) => {
        tx_log!(trace, $domain, $($rest)*)
    };
}
