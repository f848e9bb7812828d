use crate::core::io::output::{OutputKind, OutputParsers};
use once_cell::sync::Lazy;

static ELSCATA_PATTERNS: [(&str, OutputKind); 6] = [
    ("dpwa", OutputKind::Opaque),
    ("input", OutputKind::Opaque),
    ("dcs_.*", OutputKind::Table),
    ("scatamp", OutputKind::Table),
    ("scfield", OutputKind::Table),
    ("tcstable", OutputKind::Table),
];

static ELSCATA_PARSERS: Lazy<OutputParsers> = Lazy::new(|| {
    ELSCATA_PATTERNS
        .iter()
        .try_fold(OutputParsers::new(), |parsers, (pattern, kind)| {
            parsers.with(pattern, *kind)
        })
        .expect("static output patterns are valid")
});

/// How each `.dat` file written by `elscata` is handled, keyed by file stem.
pub fn elscata_outputs() -> OutputParsers {
    ELSCATA_PARSERS.clone()
}
