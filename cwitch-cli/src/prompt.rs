//! Interactive prompts: index selection and format picking.
//!
//! Validation runs inside the prompt so the user is re-prompted in place on
//! a bad line; the same parser that validates is used to produce the final
//! [`Selection`].

use crate::error::{CliError, Result};
use crate::quality::{Quality, resolve_format};
use crate::select::{DisplaySet, Selection, parse_selection};
use inquire::autocompletion::{Autocomplete, Replacement};
use inquire::validator::Validation;
use inquire::{CustomUserError, Text};
use twitch_extractor::Format;

/// Prompt for a selection of the displayed items.
pub fn pick_media(display: &DisplaySet, what: &str) -> Result<Selection> {
    let indices: Vec<usize> = display.indices().collect();

    let display_for_validation = display.clone();
    let line = Text::new(&format!("Pick {what} to watch:"))
        .with_help_message(&format!("{indices:?} (or x[n] to list more)"))
        .with_autocomplete(IndexCompleter::new(display))
        .with_validator(move |input: &str| {
            match parse_selection(input, &display_for_validation) {
                Ok(_) => Ok(Validation::Valid),
                Err(e) => Ok(Validation::Invalid(e.to_string().into())),
            }
        })
        .prompt()
        .map_err(|_| CliError::user_cancelled())?;

    parse_selection(&line, display).map_err(|e| CliError::invalid_input(e.to_string()))
}

/// Resolve one format for an item: quality shortcut when it applies, the
/// only format when there is just one, otherwise an explicit prompted pick
/// over the format identifiers.
pub fn pick_format<'a>(formats: &'a [Format], quality: Option<Quality>) -> Result<&'a Format> {
    if let Some(format) = resolve_format(formats, quality) {
        return Ok(format);
    }

    match formats {
        [] => Err(CliError::invalid_input("no formats available")),
        [only] => Ok(only),
        _ => {
            let ids: Vec<String> = formats.iter().map(|f| f.format_id.clone()).collect();
            let default = ids.last().cloned().unwrap_or_default();

            let ids_for_validation = ids.clone();
            let picked = Text::new("Pick a format:")
                .with_help_message(&format!("{ids:?}"))
                .with_default(&default)
                .with_autocomplete(FormatCompleter { ids })
                .with_validator(move |input: &str| {
                    let trimmed = input.trim();
                    if ids_for_validation.iter().any(|id| id == trimmed) {
                        Ok(Validation::Valid)
                    } else {
                        Ok(Validation::Invalid(
                            format!("{trimmed} is not a valid format").into(),
                        ))
                    }
                })
                .prompt()
                .map_err(|_| CliError::user_cancelled())?;

            let picked = picked.trim();
            formats
                .iter()
                .find(|f| f.format_id == picked)
                .ok_or_else(|| CliError::invalid_input(format!("{picked} is not a valid format")))
        }
    }
}

/// Completion over the remaining display indices plus the `x[n]` directive.
#[derive(Clone)]
struct IndexCompleter {
    entries: Vec<(usize, String)>,
}

impl IndexCompleter {
    fn new(display: &DisplaySet) -> Self {
        Self {
            entries: display
                .iter()
                .map(|(i, title)| (i, title.to_string()))
                .collect(),
        }
    }
}

impl Autocomplete for IndexCompleter {
    fn get_suggestions(&mut self, input: &str) -> std::result::Result<Vec<String>, CustomUserError> {
        let picked: Vec<&str> = input.split_whitespace().collect();
        let partial = current_token(input);

        let mut suggestions: Vec<String> = self
            .entries
            .iter()
            .filter(|(i, _)| {
                let key = i.to_string();
                !picked.contains(&key.as_str()) && key.starts_with(partial)
            })
            .map(|(i, title)| format!("{i}: {title}"))
            .collect();

        if "x".starts_with(partial) || partial.starts_with('x') {
            suggestions.push("x: list extra videos (e.g. x2 or x13)".to_string());
        }

        Ok(suggestions)
    }

    fn get_completion(
        &mut self,
        input: &str,
        highlighted_suggestion: Option<String>,
    ) -> std::result::Result<Replacement, CustomUserError> {
        Ok(highlighted_suggestion
            .map(|suggestion| replace_current_token(input, suggestion_value(&suggestion))))
    }
}

/// Completion over the available format identifiers.
#[derive(Clone)]
struct FormatCompleter {
    ids: Vec<String>,
}

impl Autocomplete for FormatCompleter {
    fn get_suggestions(&mut self, input: &str) -> std::result::Result<Vec<String>, CustomUserError> {
        let input = input.trim();
        Ok(self
            .ids
            .iter()
            .filter(|id| id.to_lowercase().starts_with(&input.to_lowercase()))
            .cloned()
            .collect())
    }

    fn get_completion(
        &mut self,
        _input: &str,
        highlighted_suggestion: Option<String>,
    ) -> std::result::Result<Replacement, CustomUserError> {
        Ok(highlighted_suggestion)
    }
}

/// The token currently being typed (after the last whitespace).
fn current_token(input: &str) -> &str {
    input
        .rsplit_once(char::is_whitespace)
        .map(|(_, tail)| tail)
        .unwrap_or(input)
}

/// The value a suggestion inserts, i.e. the part before the `:` label.
fn suggestion_value(suggestion: &str) -> &str {
    suggestion
        .split_once(':')
        .map(|(value, _)| value)
        .unwrap_or(suggestion)
        .trim()
}

/// Replace the token currently being typed with `value`.
fn replace_current_token(input: &str, value: &str) -> String {
    match input.rsplit_once(char::is_whitespace) {
        Some((head, _)) => format!("{} {}", head.trim_end(), value),
        None => value.to_string(),
    }
}
