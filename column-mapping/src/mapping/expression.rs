use std::borrow::Cow;

use crate::bail;
use crate::error::{ErrorKind, MappingResult};
use crate::mapping::MappingInfo;
use crate::partition::{PartitionLayout, apply_partition_id};
use crate::rule::Rule;
use crate::types::{Cell, Expression};

/// Applies the matched rule's expression to a row in place.
///
/// Only the target column changes, and only once the new value has been computed: on error
/// `values` is left exactly as it was passed in.
pub fn apply_expression(
    info: &MappingInfo,
    values: &mut [Cell],
    layout: &PartitionLayout,
) -> MappingResult<()> {
    let mapped = match &info.rule.expression {
        Expression::AddPrefix | Expression::AddSuffix => add_affix(info, values)?,
        Expression::PartitionId => partition_id(info, values, layout)?,
        Expression::Unknown(name) => bail!(
            ErrorKind::UnknownExpression,
            "Rule uses an unknown expression",
            format!("expression `{name}`")
        ),
    };

    values[info.target_position] = mapped;
    Ok(())
}

/// Returns the partition-packed form of the target value.
pub fn partition_id(
    info: &MappingInfo,
    values: &[Cell],
    layout: &PartitionLayout,
) -> MappingResult<Cell> {
    let target = value_at(values, info.target_position, &info.rule.target_column)?;
    apply_partition_id(target, &info.partition, layout)
}

/// Returns the argument concatenated before or after the input value.
///
/// The input is the source column when the rule has one, otherwise the target column itself.
fn add_affix(info: &MappingInfo, values: &[Cell]) -> MappingResult<Cell> {
    let rule = &info.rule;
    let affix = single_argument(rule)?;

    // The target must exist even when the input comes from another column.
    value_at(values, info.target_position, &rule.target_column)?;
    let input = match info.source_position {
        Some(position) => value_at(values, position, &rule.source_column)?,
        None => &values[info.target_position],
    };

    let input: Cow<'_, str> = match input {
        Cell::String(text) => Cow::Borrowed(text),
        Cell::I64(number) => Cow::Owned(number.to_string()),
        Cell::Null => bail!(
            ErrorKind::UnsupportedValueType,
            "Prefix and suffix expressions cannot be applied to a null value",
            format!("column `{}`", rule.target_column)
        ),
    };

    let mut output = String::with_capacity(affix.len() + input.len());
    if rule.expression == Expression::AddPrefix {
        output.push_str(affix);
        output.push_str(&input);
    } else {
        output.push_str(&input);
        output.push_str(affix);
    }

    Ok(Cell::String(output))
}

fn single_argument(rule: &Rule) -> MappingResult<&str> {
    match rule.arguments.as_slice() {
        [argument] => Ok(argument),
        arguments => bail!(
            ErrorKind::ArgumentCountMismatch,
            "Rule has the wrong number of arguments for its expression",
            format!(
                "expression `{}` takes 1 argument, got {}",
                rule.expression,
                arguments.len()
            )
        ),
    }
}

fn value_at<'a>(values: &'a [Cell], position: usize, column: &str) -> MappingResult<&'a Cell> {
    match values.get(position) {
        Some(value) => Ok(value),
        None => bail!(
            ErrorKind::RowShapeMismatch,
            "Row has fewer values than its mapped column position",
            format!(
                "column `{column}` is at position {position}, row has {} value(s)",
                values.len()
            )
        ),
    }
}
