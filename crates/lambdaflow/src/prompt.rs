//! Terminal prompts backed by dialoguer

use dialoguer::{Confirm, Input, Select};
use lambdaflow_cloud::{CloudError, Prompter};

/// Label of the extra entry offered when no selection is allowed
const NONE_ITEM: &str = "(none, create a new one)";

pub struct DialoguerPrompter;

fn prompt_error(label: &str, err: dialoguer::Error) -> CloudError {
    let dialoguer::Error::IO(err) = err;
    if err.kind() == std::io::ErrorKind::Interrupted {
        CloudError::UserAbort(label.to_string())
    } else {
        CloudError::Io(err)
    }
}

impl Prompter for DialoguerPrompter {
    fn prompt_for_string(&self, label: &str) -> lambdaflow_cloud::Result<String> {
        Input::<String>::new()
            .with_prompt(label)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| prompt_error(label, e))
    }

    fn prompt_for_choice(
        &self,
        label: &str,
        options: &[String],
        allow_empty: bool,
    ) -> lambdaflow_cloud::Result<Option<String>> {
        let mut items: Vec<&str> = options.iter().map(String::as_str).collect();
        if allow_empty {
            items.push(NONE_ITEM);
        }
        if items.is_empty() {
            return Ok(None);
        }

        let selection = Select::new()
            .with_prompt(label)
            .items(&items)
            .default(0)
            .interact_opt()
            .map_err(|e| prompt_error(label, e))?;

        match selection {
            Some(index) if index < options.len() => Ok(Some(options[index].clone())),
            Some(_) => Ok(None),
            None if allow_empty => Ok(None),
            None => Err(CloudError::UserAbort(label.to_string())),
        }
    }

    fn prompt_to_confirm(&self, label: &str) -> lambdaflow_cloud::Result<bool> {
        Confirm::new()
            .with_prompt(label)
            .default(false)
            .interact()
            .map_err(|e| prompt_error(label, e))
    }
}
