use nutype::nutype;

pub const DEFAULT_SYNTAX: &str = "plain";

/// Syntax highlighting hint attached to a paste.
///
/// Only ASCII letters and digits survive. A hint made entirely of other
/// characters becomes empty. [`DEFAULT_SYNTAX`] is what callers send when the
/// submitter gave no hint at all.
#[nutype(
    sanitize(with = |raw: String| strip_syntax(&raw)),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize,
    )
)]
pub struct Syntax(String);

fn strip_syntax(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_alphanumeric).collect()
}
