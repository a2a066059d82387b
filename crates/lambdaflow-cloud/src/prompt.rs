//! Interactive prompting capability

use crate::error::Result;

/// Questions the deployment flow may ask the operator
pub trait Prompter: Send + Sync {
    /// Free-form answer; may be empty
    fn prompt_for_string(&self, label: &str) -> Result<String>;

    /// Pick one of `options`. With `allow_empty`, the operator may pick
    /// nothing, reported as `None`.
    fn prompt_for_choice(
        &self,
        label: &str,
        options: &[String],
        allow_empty: bool,
    ) -> Result<Option<String>>;

    fn prompt_to_confirm(&self, label: &str) -> Result<bool>;
}
