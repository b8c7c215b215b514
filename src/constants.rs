//! Constants used throughout the glaze engine

/// Opening delimiter of an expression span
pub const OPEN_MARKER: &str = "{{";

/// Closing delimiter of an expression span
pub const CLOSE_MARKER: &str = "}}";

/// Opening of a long comment, which may contain the closing delimiter
pub const LONG_COMMENT_OPEN: &str = "{{!--";

/// Closing of a long comment
pub const LONG_COMMENT_CLOSE: &str = "--}}";

/// Whitespace control character placed next to a delimiter
pub const TRIM_MARKER: char = '~';

/// Default limit for nested helper calls inside one expression
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default limit for nested blocks, counted across partials
pub const DEFAULT_MAX_BLOCK_DEPTH: usize = 64;

/// Default limit for nested partial inclusion
pub const DEFAULT_MAX_PARTIAL_DEPTH: usize = 32;

/// Configuration file names in order of preference
pub const CONFIG_FILENAMES: &[&str] = &["glaze.json", "glaze.yaml", "glaze.yml"];

/// STDIN indicator for CLI arguments
pub const STDIN_INDICATOR: &str = "-";

/// Prefix marking a CLI context argument as a file path
pub const FILE_INDICATOR: char = '@';

/// Built-in block helper names
pub mod blocks {
    pub const IF: &str = "if";
    pub const UNLESS: &str = "unless";
    pub const EACH: &str = "each";
    pub const WITH: &str = "with";
    pub const ELSE: &str = "else";
}

/// Names resolved specially by the variable resolver
pub mod keywords {
    pub const THIS: &str = "this";
    pub const INDEX: &str = "@index";
    pub const KEY: &str = "@key";
    pub const FIRST: &str = "@first";
    pub const LAST: &str = "@last";
    pub const ROOT: &str = "@root";
    pub const PARENT: &str = "../";
}

/// Exit codes
pub mod exit_codes {
    pub const FAILURE: i32 = 1;
}

/// Verbosity levels
pub mod verbosity {
    pub const OFF: u8 = 0;
    pub const INFO: u8 = 1;
    pub const DEBUG: u8 = 2;
    pub const TRACE: u8 = 3;
}
