//! Span and field names shared across crates
//!
//! Field constants match the field identifiers declared in the span macros,
//! so spans can be filled in later with `Span::record(fields::X, ..)`.

/// Standard field names
pub mod fields {
    pub const VERSIONS: &str = "versions";
    pub const STATEMENTS: &str = "statements";
    pub const SKIPPED: &str = "skipped";
    pub const FAILED: &str = "failed";
}

/// Standard span names
pub mod spans {
    // Statement log and index
    pub const APPEND: &str = "append";
    pub const REBUILD: &str = "rebuild";
    pub const IMPORT: &str = "import";

    // Version history
    pub const HEAD: &str = "head";
    pub const SCAN_VERSIONS: &str = "scan_versions";

    // Content
    pub const LIST: &str = "list";
    pub const GET: &str = "get";
}
