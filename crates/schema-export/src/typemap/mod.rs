//! Type mapping from source type codes to portable types.
//!
//! Source columns report their type as an OLE DB `DBTYPE` code (the
//! `DATA_TYPE` field of the `Columns` collection). Codes are grouped into the
//! seven portable types by a fixed table; anything not listed is a BLOB.

use crate::core::PortableType;

pub const BOOLEAN_CODES: &[i32] = &[11];
pub const DATETIME_CODES: &[i32] = &[7, 64, 133, 134, 135];
pub const DECIMAL_CODES: &[i32] = &[6, 14, 131, 139];
pub const DOUBLE_CODES: &[i32] = &[4, 5];
pub const INTEGER_CODES: &[i32] = &[2, 3, 16, 17, 18, 19, 20, 21];
pub const STRING_CODES: &[i32] = &[8, 129, 130, 200, 201, 202, 203];

/// Map a source type code to a portable type.
///
/// Total: unknown codes map to [`PortableType::Blob`].
pub fn map_type_code(code: i32) -> PortableType {
    match code {
        // Boolean
        11 => PortableType::Boolean,

        // Date/time: date, filetime, dbdate, dbtime, dbtimestamp
        7 | 64 | 133 | 134 | 135 => PortableType::DateTime,

        // Fixed point: currency, decimal, numeric, varnumeric
        6 | 14 | 131 | 139 => PortableType::Decimal,

        // Floating point: single, double
        4 | 5 => PortableType::Double,

        // Integer widths: i2, i4, i1, ui1, ui2, ui4, i8, ui8
        2 | 3 | 16 | 17 | 18 | 19 | 20 | 21 => PortableType::Integer,

        // Text: bstr, char, wchar, varchar, longvarchar, varwchar, longvarwchar
        8 | 129 | 130 | 200 | 201 | 202 | 203 => PortableType::String,

        // Binary, GUID, variant and everything else
        _ => PortableType::Blob,
    }
}
