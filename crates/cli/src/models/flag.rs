//! Feature flags.

/// A named global toggle. Flags are seeded elsewhere; this tool only flips them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    pub name: String,
    pub value: bool,
}
