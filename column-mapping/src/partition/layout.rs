use crate::error::{MappingError, MappingResult};
use crate::types::PartitionConfig;

/// Validated bit layout of partition identifiers.
///
/// From the most significant usable bit down: `instance_bits` of instance identity,
/// `schema_bits` of schema identity, `table_bits` of table identity, then the original value.
/// Bit 63 is never used, so packed identifiers stay non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PartitionLayout {
    instance_bits: u8,
    schema_bits: u8,
    table_bits: u8,
}

impl PartitionLayout {
    /// Creates a layout, failing if the fields do not fit into 63 bits.
    pub fn new(instance_bits: u8, schema_bits: u8, table_bits: u8) -> MappingResult<Self> {
        PartitionConfig::new(instance_bits, schema_bits, table_bits).try_into()
    }

    pub fn instance_bits(&self) -> u8 {
        self.instance_bits
    }

    pub fn schema_bits(&self) -> u8 {
        self.schema_bits
    }

    pub fn table_bits(&self) -> u8 {
        self.table_bits
    }

    /// Offset of the lowest instance identity bit.
    pub fn instance_shift(&self) -> u32 {
        PartitionConfig::USABLE_BITS - u32::from(self.instance_bits)
    }

    /// Offset of the lowest schema identity bit.
    pub fn schema_shift(&self) -> u32 {
        self.instance_shift() - u32::from(self.schema_bits)
    }

    /// Offset of the lowest table identity bit; also the width left for original values.
    pub fn table_shift(&self) -> u32 {
        self.schema_shift() - u32::from(self.table_bits)
    }

    /// Exclusive upper bound for original values that can be packed without loss.
    pub fn max_origin_id(&self) -> u64 {
        1 << self.table_shift()
    }
}

impl TryFrom<PartitionConfig> for PartitionLayout {
    type Error = MappingError;

    fn try_from(config: PartitionConfig) -> Result<Self, Self::Error> {
        config.validate()?;

        Ok(Self {
            instance_bits: config.instance_bits,
            schema_bits: config.schema_bits,
            table_bits: config.table_bits,
        })
    }
}

impl From<PartitionLayout> for PartitionConfig {
    fn from(layout: PartitionLayout) -> Self {
        PartitionConfig::new(layout.instance_bits, layout.schema_bits, layout.table_bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_max_origin_id() {
        let layout = PartitionLayout::new(4, 7, 8).unwrap();
        assert_eq!(layout.instance_bits(), 4);
        assert_eq!(layout.schema_bits(), 7);
        assert_eq!(layout.table_bits(), 8);
        assert_eq!(layout.max_origin_id(), 1 << 44);

        let layout = PartitionLayout::new(0, 3, 4).unwrap();
        assert_eq!(layout.max_origin_id(), 1 << 56);

        assert_eq!(PartitionLayout::default().max_origin_id(), 1 << 63);
    }

    #[test]
    fn test_shifts() {
        let layout = PartitionLayout::new(4, 7, 8).unwrap();
        assert_eq!(layout.instance_shift(), 59);
        assert_eq!(layout.schema_shift(), 52);
        assert_eq!(layout.table_shift(), 44);

        let layout = PartitionLayout::new(0, 0, 3).unwrap();
        assert_eq!(layout.table_shift(), 60);
    }

    #[test]
    fn test_fields_are_disjoint() {
        for instance_bits in 0..=21u8 {
            for schema_bits in 0..=21u8 {
                for table_bits in [0u8, 1, 8, 20] {
                    let layout = PartitionLayout::new(instance_bits, schema_bits, table_bits).unwrap();

                    let field = |bits: u8, shift: u32| -> u64 { ((1u64 << bits) - 1) << shift };
                    let instance = field(instance_bits, layout.instance_shift());
                    let schema = field(schema_bits, layout.schema_shift());
                    let table = field(table_bits, layout.table_shift());
                    let origin = layout.max_origin_id() - 1;

                    assert_eq!(instance & schema, 0);
                    assert_eq!(instance & table, 0);
                    assert_eq!(schema & table, 0);
                    assert_eq!((instance | schema | table) & origin, 0);
                    assert_eq!((instance | schema | table | origin) >> 63, 0);
                    assert_eq!(
                        layout.max_origin_id(),
                        1u64 << (63 - u32::from(instance_bits + schema_bits + table_bits))
                    );
                }
            }
        }
    }

    #[test]
    fn test_oversized_layout_is_rejected() {
        let err = PartitionLayout::new(32, 16, 16).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPartitionLayout);
        assert!(PartitionLayout::new(21, 21, 21).is_ok());
    }
}
