use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Bit layout of the partition identifier embedded into mapped primary keys.
///
/// The high-order bits of the 63 usable bits of an `i64` (the sign bit is never set) are split,
/// from most to least significant, into instance, schema and table identity. Whatever remains
/// holds the row's original value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PartitionConfig {
    /// Number of bits reserved for the source instance identity.
    #[serde(default)]
    pub instance_bits: u8,
    /// Number of bits reserved for the schema identity.
    #[serde(default)]
    pub schema_bits: u8,
    /// Number of bits reserved for the table identity.
    #[serde(default)]
    pub table_bits: u8,
}

impl PartitionConfig {
    /// Number of usable bits in the identifier space.
    pub const USABLE_BITS: u32 = 63;

    /// Creates a partition config from the three bit widths.
    pub fn new(instance_bits: u8, schema_bits: u8, table_bits: u8) -> Self {
        Self {
            instance_bits,
            schema_bits,
            table_bits,
        }
    }

    /// Returns the total number of bits reserved for the identity prefix.
    pub fn reserved_bits(&self) -> u32 {
        u32::from(self.instance_bits) + u32::from(self.schema_bits) + u32::from(self.table_bits)
    }

    /// Ensures the three fields fit into the usable bits.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let total = self.reserved_bits();
        if total > Self::USABLE_BITS {
            return Err(ValidationError::PartitionBitsExceeded { total });
        }

        Ok(())
    }
}
