//! The built-in prelude: core classes and `Kernel` functions, written as a
//! declaration-mode `.trb` file and bound before any user file.

use std::sync::{Arc, LazyLock};

use trc_parser::{ParseOptions, ParsedFile, parse_source};

pub const PRELUDE_FILE_NAME: &str = "<prelude>";

pub const PRELUDE_SOURCE: &str = include_str!("prelude.trb");

static PRELUDE: LazyLock<Arc<ParsedFile>> = LazyLock::new(|| {
    let options = ParseOptions {
        declaration_mode: true,
        ..ParseOptions::default()
    };
    Arc::new(parse_source(PRELUDE_FILE_NAME, PRELUDE_SOURCE, options))
});

/// The parsed prelude, shared by every compilation in the process.
pub fn prelude_file() -> Arc<ParsedFile> {
    Arc::clone(&PRELUDE)
}
