//! Macros for column mapping error handling.

/// Creates a [`crate::error::MappingError`] from error kind and description.
///
/// Accepts an optional dynamic detail and an optional source error. Errors raised for one table
/// take `table: (schema, table)` before the detail, which renders the detail as
/// `schema.table: detail` so every per-table failure names its table the same way.
#[macro_export]
macro_rules! mapping_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::MappingError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, table: ($schema:expr, $table:expr), $detail:expr) => {
        $crate::error::MappingError::from((
            $kind,
            $desc,
            ::std::format!("{}.{}: {}", $schema, $table, $detail),
        ))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        $crate::error::MappingError::from(($kind, $desc)).with_source($source)
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::MappingError::from(($kind, $desc, $detail.to_string()))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        $crate::error::MappingError::from(($kind, $desc, $detail.to_string()))
            .with_source($source)
    };
}

/// Creates and returns a [`crate::error::MappingError`] from the current function.
///
/// Supports the same table, detail and source arguments as [`mapping_error!`].
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return ::core::result::Result::Err($crate::mapping_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, table: ($schema:expr, $table:expr), $detail:expr) => {
        return ::core::result::Result::Err($crate::mapping_error!(
            $kind,
            $desc,
            table: ($schema, $table),
            $detail
        ))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::mapping_error!($kind, $desc, source: $source))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return ::core::result::Result::Err($crate::mapping_error!($kind, $desc, $detail))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::mapping_error!(
            $kind,
            $desc,
            $detail,
            source: $source
        ))
    };
}
