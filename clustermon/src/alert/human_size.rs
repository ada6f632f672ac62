use byte_unit::Byte;
use byte_unit::UnitType;

/// Format a number of bytes with one decimal and a decimal unit, e.g.
/// `512.0 MB`.
pub fn human_data_size(bytes: u64) -> String {
    let adjusted =
        Byte::from_u64(bytes).get_appropriate_unit(UnitType::Decimal);

    format!("{:.1} {}", adjusted.get_value(), adjusted.get_unit())
}
