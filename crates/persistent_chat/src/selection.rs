//! Startup model choice.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("No previous model found. Please select a model.")]
    NoPrevious,
    #[error("Invalid selection. Please choose 1-{max}")]
    OutOfRange { max: usize },
    #[error("Invalid input. Please enter a number.")]
    NotANumber,
}

/// Numbered menu lines, marking the previously used model.
pub fn model_menu(models: &[String], last_model: Option<&str>) -> Vec<String> {
    models
        .iter()
        .enumerate()
        .map(|(index, model)| {
            let marker = if Some(model.as_str()) == last_model {
                " (last used)"
            } else {
                ""
            };
            format!("{}. {model}{marker}", index + 1)
        })
        .collect()
}

/// Resolves one line of menu input.
///
/// A blank line reuses `last_model` even when it is no longer listed; the
/// server reports a missing model on the first turn.
pub fn resolve_selection(
    input: &str,
    models: &[String],
    last_model: Option<&str>,
) -> Result<String, SelectionError> {
    let choice = input.trim();
    if choice.is_empty() {
        return last_model
            .map(str::to_string)
            .ok_or(SelectionError::NoPrevious);
    }

    let index: usize = choice.parse().map_err(|_| SelectionError::NotANumber)?;
    match index.checked_sub(1).and_then(|index| models.get(index)) {
        Some(model) => Ok(model.clone()),
        None => Err(SelectionError::OutOfRange { max: models.len() }),
    }
}
