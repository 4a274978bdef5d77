//! Interactive editing support
//!
//! Opens $EDITOR for editing block text, and prompts for confirmation.

use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::process::Command;

/// Edit block text in the user's preferred editor
///
/// Returns `None` when the text comes back unchanged. The trailing newline
/// most editors append is dropped.
pub fn edit_text(initial: &str) -> Result<Option<String>> {
    let editor = find_editor()?;

    let temp_path = env::temp_dir().join(format!("folio_edit_{}.txt", std::process::id()));
    fs::write(&temp_path, initial)
        .with_context(|| format!("Failed to create temp file: {:?}", temp_path))?;

    let status = Command::new(&editor)
        .arg(&temp_path)
        .status()
        .with_context(|| format!("Failed to run editor: {}", editor));

    let content = match status {
        Ok(status) if status.success() => fs::read_to_string(&temp_path)
            .with_context(|| format!("Failed to read edited file: {:?}", temp_path)),
        Ok(_) => Err(anyhow::anyhow!(
            "Editor '{}' exited with non-zero status. Check that your editor is configured correctly.",
            editor
        )),
        Err(e) => Err(e),
    };
    let _ = fs::remove_file(&temp_path);

    Ok(changed_text(initial, &content?))
}

fn changed_text(initial: &str, edited: &str) -> Option<String> {
    let edited = edited.strip_suffix('\n').unwrap_or(edited);
    let edited = edited.strip_suffix('\r').unwrap_or(edited);
    (edited != initial).then(|| edited.to_string())
}

/// Find the user's preferred editor
fn find_editor() -> Result<String> {
    for var in ["EDITOR", "VISUAL"] {
        if let Ok(editor) = env::var(var) {
            if !editor.is_empty() {
                return Ok(editor);
            }
        }
    }

    for editor in ["nano", "vim", "vi", "notepad"] {
        if command_exists(editor) {
            return Ok(editor.to_string());
        }
    }

    bail!(
        "No editor found. Set $EDITOR environment variable, or pass the text with --text.\n\
         Example: export EDITOR=nano"
    )
}

/// Check if a command exists in PATH
fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Prompt for confirmation
///
/// Returns true if user confirms, false otherwise.
/// In non-interactive mode (no TTY), returns false.
pub fn confirm(prompt: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    read_confirmation(io::stdin().lock())
}

fn read_confirmation(mut reader: impl BufRead) -> Result<bool> {
    let mut input = String::new();
    reader.read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_text() {
        assert_eq!(changed_text("hello", "hello\n"), None);
        assert_eq!(changed_text("hello", "hello"), None);
        assert_eq!(
            changed_text("hello", "hello world\r\n"),
            Some("hello world".to_string())
        );
        assert_eq!(changed_text("", "new\n\n"), Some("new\n".to_string()));
    }

    #[test]
    fn test_read_confirmation() {
        assert!(read_confirmation("y\n".as_bytes()).unwrap());
        assert!(read_confirmation(" YES \n".as_bytes()).unwrap());
        assert!(!read_confirmation("n\n".as_bytes()).unwrap());
        assert!(!read_confirmation("".as_bytes()).unwrap());
    }

    #[test]
    fn test_command_exists() {
        // "ls" should exist on Unix systems
        #[cfg(unix)]
        assert!(command_exists("ls"));

        // Random nonsense should not exist
        assert!(!command_exists("definitely_not_a_real_command_12345"));
    }
}
