//! Diagnostic sink for recoverable dictionary conditions.
//!
//! Nothing here is fatal: rejected updates come back as
//! [`DictError`](crate::DictError), and cross-type reads succeed. The sink
//! only decides where the report goes. [`LogDiagnostics`] forwards to the
//! `log` facade so any logger the application installs picks it up.

use crate::error::DictError;
use crate::value::DataType;

/// Target used for every record emitted by [`LogDiagnostics`].
pub const LOG_TARGET: &str = "lp_typed_dict";

/// Receives the conditions a [`TypedDict`](crate::TypedDict) reports.
pub trait Diagnostics {
    /// An update of `key` was refused; the dictionary is unchanged.
    fn update_rejected(&self, key: &str, error: &DictError);

    /// `key` holds a `stored` value but was read as `requested`.
    fn type_mismatch(&self, key: &str, stored: DataType, requested: DataType);
}

impl<D: Diagnostics + ?Sized> Diagnostics for &D {
    fn update_rejected(&self, key: &str, error: &DictError) {
        (**self).update_rejected(key, error);
    }

    fn type_mismatch(&self, key: &str, stored: DataType, requested: DataType) {
        (**self).type_mismatch(key, stored, requested);
    }
}

/// Reports through `log::error!` and `log::warn!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn update_rejected(&self, key: &str, error: &DictError) {
        log::error!(target: LOG_TARGET, "update of key {key} rejected: {error}");
    }

    fn type_mismatch(&self, key: &str, stored: DataType, requested: DataType) {
        log::warn!(
            target: LOG_TARGET,
            "value for key {key} is {stored}, does not match type requested ({requested})"
        );
    }
}

/// Drops every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentDiagnostics;

impl Diagnostics for SilentDiagnostics {
    fn update_rejected(&self, _key: &str, _error: &DictError) {}

    fn type_mismatch(&self, _key: &str, _stored: DataType, _requested: DataType) {}
}
