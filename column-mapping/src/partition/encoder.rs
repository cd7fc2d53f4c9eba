use crate::bail;
use crate::error::{ErrorKind, MappingResult};
use crate::mapping_error;
use crate::partition::PartitionLayout;
use crate::rule::Rule;
use crate::types::Cell;

/// Pre-shifted identity fields of one shard.
///
/// Each field is already positioned at its offset in the layout it was computed with, so packing
/// a row value is a single bitwise OR with [`PartitionPrefix::combined`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PartitionPrefix {
    pub instance_id: i64,
    pub schema_id: i64,
    pub table_id: i64,
}

impl PartitionPrefix {
    /// Returns the three fields OR-ed together.
    pub fn combined(&self) -> i64 {
        self.instance_id | self.schema_id | self.table_id
    }
}

/// Computes the identity prefix of the shard `schema`.`table` for a `PartitionId` rule.
///
/// The rule arguments are the instance identity, the schema name prefix and the table name
/// prefix. The schema and table identities are the integers left after stripping the prefixes
/// from the names, written as canonical decimals. A field with zero bits in `layout` is left at
/// `0` and its argument is not inspected.
pub fn compute_partition_id(
    schema: &str,
    table: &str,
    rule: &Rule,
    layout: &PartitionLayout,
) -> MappingResult<PartitionPrefix> {
    let [instance_literal, schema_prefix, table_prefix] = rule.arguments.as_slice() else {
        bail!(
            ErrorKind::ArgumentCountMismatch,
            "Partition id rules take exactly three arguments",
            format!(
                "expected instance id, schema prefix and table prefix, got {} argument(s)",
                rule.arguments.len()
            )
        );
    };

    let mut prefix = PartitionPrefix::default();

    if layout.instance_bits() > 0 {
        let instance_id = instance_literal.parse::<i64>().map_err(|err| {
            mapping_error!(
                ErrorKind::InvalidInstanceLiteral,
                "Instance id is not an integer",
                format!("instance id `{instance_literal}`"),
                source: err
            )
        })?;
        if instance_id < 0 {
            bail!(
                ErrorKind::InvalidInstanceLiteral,
                "Instance id must not be negative",
                format!("instance id `{instance_literal}`")
            );
        }
        check_fits("instance", instance_id, layout.instance_bits())?;
        prefix.instance_id = instance_id << layout.instance_shift();
    }

    if layout.schema_bits() > 0 {
        let schema_id = strip_identity(schema, schema_prefix)?;
        check_fits("schema", schema_id, layout.schema_bits())?;
        prefix.schema_id = schema_id << layout.schema_shift();
    }

    if layout.table_bits() > 0 {
        let table_id = strip_identity(table, table_prefix)?;
        check_fits("table", table_id, layout.table_bits())?;
        prefix.table_id = table_id << layout.table_shift();
    }

    Ok(prefix)
}

/// Packs `prefix` into an original key value.
///
/// Integers stay integers and numeric strings stay strings, so the column keeps its type
/// downstream. The original value must be in `0..max_origin_id`.
pub fn apply_partition_id(
    value: &Cell,
    prefix: &PartitionPrefix,
    layout: &PartitionLayout,
) -> MappingResult<Cell> {
    let (origin, is_text) = match value {
        Cell::I64(origin) => (*origin, false),
        Cell::String(text) => {
            let origin = text.parse::<i64>().map_err(|err| {
                mapping_error!(
                    ErrorKind::UnsupportedValueType,
                    "Partition id requires a numeric value",
                    format!("string value `{text}`"),
                    source: err
                )
            })?;
            (origin, true)
        }
        Cell::Null => bail!(
            ErrorKind::UnsupportedValueType,
            "Partition id requires a numeric value",
            format!("got a {} value", value.type_name())
        ),
    };

    let max_origin_id = layout.max_origin_id();
    if origin < 0 || origin as u64 >= max_origin_id {
        bail!(
            ErrorKind::OriginValueOverflow,
            "Original value does not fit below the partition prefix",
            format!("value must be in [0, {max_origin_id}), got {origin}")
        );
    }

    let packed = prefix.combined() | origin;
    Ok(if is_text {
        Cell::String(packed.to_string())
    } else {
        Cell::I64(packed)
    })
}

/// Strips `prefix` from `name` and parses the remainder as the shard identity.
///
/// The remainder must be a canonical decimal: ASCII digits only, no sign, and no leading zero
/// unless it is `0` itself. Every identity therefore has exactly one spelling, and two distinct
/// names never share one.
fn strip_identity(name: &str, prefix: &str) -> MappingResult<i64> {
    let Some(remainder) = name.strip_prefix(prefix) else {
        bail!(
            ErrorKind::PrefixMismatch,
            "Name does not start with the configured prefix",
            format!("name `{name}`, prefix `{prefix}`")
        );
    };

    if !is_canonical_decimal(remainder) {
        bail!(
            ErrorKind::PrefixMismatch,
            "Name does not end with a canonical non-negative integer after its prefix",
            format!("name `{name}`, prefix `{prefix}`, remainder `{remainder}`")
        );
    }

    remainder.parse::<i64>().map_err(|err| {
        mapping_error!(
            ErrorKind::IdentityOverflow,
            "Identity does not fit in a 64-bit integer",
            format!("name `{name}`, prefix `{prefix}`"),
            source: err
        )
    })
}

fn is_canonical_decimal(text: &str) -> bool {
    match text.as_bytes() {
        [] => false,
        [b'0'] => true,
        [b'0', ..] => false,
        digits => digits.iter().all(u8::is_ascii_digit),
    }
}

fn check_fits(field: &str, id: i64, bits: u8) -> MappingResult<()> {
    let limit = 1u64 << bits;
    if id as u64 >= limit {
        bail!(
            ErrorKind::IdentityOverflow,
            "Identity does not fit in its partition field",
            format!("{field} id must be less than {limit}, got {id}")
        );
    }

    Ok(())
}
