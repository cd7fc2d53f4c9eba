use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The partition bit widths leave no room in the 63-bit identifier space.
    #[error(
        "Invalid partition config: `instance_bits` + `schema_bits` + `table_bits` is {total}, which exceeds 63"
    )]
    PartitionBitsExceeded { total: u32 },
}
