/// Column-name and rule constants shared across the pipeline stages.
/// Header matching against these is case-insensitive after trimming.

// Well-known column headers
pub const COL_NAME: &str = "Name";
pub const COL_ADDRESS_1: &str = "Address 1";
pub const COL_ADDRESS_2: &str = "Address 2";
pub const COL_CITY: &str = "City";
pub const COL_STATE: &str = "State";
pub const COL_ZIP: &str = "Zip";
pub const COL_STATUS: &str = "Status";
pub const COL_RACE: &str = "Race";
pub const COL_CAPTURE_DATE: &str = "Capture Date";

/// Target column order for cleaned output; passthrough columns keep their
/// original relative order after these.
pub const CANONICAL_COLUMN_ORDER: [&str; 12] = [
    "Name",
    "Address 1",
    "Address 2",
    "City",
    "State",
    "Zip",
    "Case Number",
    "Status",
    "Sex",
    "Race",
    "Phone",
    "Public Defender",
];

// Addresses removed unconditionally by the row filter
pub const BLACKLIST_KENTUCKY_AVE: &str = "814 north kentucky avenue";
pub const BLACKLIST_CENTRAL_AVE: &str = "180 east central avenue";

// Substring matches removed by the row filter
pub const GENERAL_DELIVERY: &str = "general delivery";
pub const HOMELESS: &str = "homeless";

/// Status value that marks a case as closed out of the export
pub const STATUS_DISPOSED: &str = "disposed";

/// Name suffixes preserved verbatim by the name normalizer
pub const NAME_SUFFIXES: [&str; 6] = ["Jr.", "Sr.", "II", "III", "IV", "V"];

/// Headers forced onto columns C-K before validation-mode processing.
/// The source export sometimes arrives with these shifted or unnamed.
pub const VALIDATION_HEADERS: [&str; 9] = [
    "Name",
    "Address 1",
    "City",
    "State",
    "Zip",
    "Sex",
    "Race",
    "Public Defender",
    "Capture Date",
];

/// First column index the validation headers are written to (column C)
pub const VALIDATION_HEADER_OFFSET: usize = 2;

/// Minimum column count validation mode pads a table out to
pub const VALIDATION_MIN_COLUMNS: usize = 11;
