/// Aggregated view of session progress, useful for status lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub all_answered: bool,
}
