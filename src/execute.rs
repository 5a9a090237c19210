//! Protected calls: run host callbacks without letting their failures escape.

use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};

use crate::error::CallError;
use crate::DEBUG;

/// Invokes `f(args)` and returns its result, or the caught panic as a
/// [`CallError`].
///
/// Several arguments travel as a tuple: `execute(|(a, b)| a + b, (2, 3))`.
///
/// # Errors
///
/// Returns a [`CallError`] carrying the panic message if `f` panics.
pub fn execute<A, R, F>(f: F, args: A) -> Result<R, CallError>
where
    F: FnOnce(A) -> R,
{
    panic::catch_unwind(AssertUnwindSafe(move || f(args)))
        .map_err(|payload| contained(CallError::new(panic_message(&*payload))))
}

/// Like [`execute`], for callbacks that report failure through `Result`.
///
/// An `Err` from the callback and a panic come back the same way.
///
/// # Errors
///
/// Returns a [`CallError`] if `f` panics or returns `Err`.
pub fn execute_fallible<A, R, E, F>(f: F, args: A) -> Result<R, CallError>
where
    E: Display,
    F: FnOnce(A) -> Result<R, E>,
{
    execute(f, args)?.map_err(|err| contained(CallError::new(err.to_string())))
}

/// Like [`execute`], for callbacks that may not be set. An absent callback
/// is not run and yields `None`.
pub fn execute_optional<A, R, F>(f: Option<F>, args: A) -> Option<Result<R, CallError>>
where
    F: FnOnce(A) -> R,
{
    f.map(|f| execute(f, args))
}

fn contained(err: CallError) -> CallError {
    if DEBUG {
        tracing::warn!(error = %err.message, "contained callback failure");
    } else {
        tracing::debug!(error = %err.message, "contained callback failure");
    }
    err
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "callback panicked with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_result_computed_from_args() {
        let result = execute(|(a, b): (i32, i32)| a * 10 + b, (4, 2));
        assert_eq!(result, Ok(42));
    }

    #[test]
    fn panic_becomes_error_value() {
        let result: Result<(), _> = execute(|()| panic!("boom"), ());
        assert_eq!(result, Err(CallError::new("boom")));
    }

    #[test]
    fn formatted_panic_message_is_kept() {
        let result: Result<(), _> = execute(|n: u32| panic!("bad input {n}"), 7);
        assert_eq!(result.unwrap_err().message, "bad input 7");
    }

    #[test]
    fn non_string_payload_still_contained() {
        let result: Result<(), _> = execute(|()| std::panic::panic_any(17_u8), ());
        assert!(result.is_err());
    }

    #[test]
    fn err_result_folds_into_call_error() {
        let result: Result<u8, _> = execute_fallible(|()| Err::<u8, _>("not found"), ());
        assert_eq!(result, Err(CallError::new("not found")));
    }

    #[test]
    fn ok_result_passes_through() {
        let result = execute_fallible(|s: &str| s.parse::<u16>(), "8080");
        assert_eq!(result, Ok(8080));
    }

    #[test]
    fn absent_callback_is_skipped() {
        let f: Option<fn(u8) -> u8> = None;
        assert_eq!(execute_optional(f, 1), None);
    }

    #[test]
    fn present_callback_runs() {
        assert_eq!(execute_optional(Some(|x: u8| x + 1), 1), Some(Ok(2)));
    }
}
