//! Column conversion helpers shared by the query modules.

use std::{fmt::Display, str::FromStr};

use rusqlite::{types::Type, Row};

/// Conversion failure for a text column that held an unexpected value.
pub(crate) fn conversion_error(index: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, message.into())
}

/// Read a text column and parse it.
pub(crate) fn parse_column<T>(row: &Row, index: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw: String = row.get(index)?;
    raw.parse()
        .map_err(|e| conversion_error(index, format!("Invalid value '{raw}': {e}")))
}

/// Read a nullable text column and parse it when present.
pub(crate) fn parse_optional_column<T>(row: &Row, index: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = row.get(index)?;
    raw.map(|raw| {
        raw.parse()
            .map_err(|e| conversion_error(index, format!("Invalid value '{raw}': {e}")))
    })
    .transpose()
}

/// Read a nullable integer column holding an unsigned value.
pub(crate) fn optional_u32(row: &Row, index: usize) -> rusqlite::Result<Option<u32>> {
    Ok(row.get::<_, Option<i64>>(index)?.map(|value| value as u32))
}
