//! Interactive chat loop over a [`SessionController`].

use std::io::Write;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::{Context, Result};
use chat_provider::CancelSignal;
use colored::Colorize;

use crate::commands::{parse_slash_command, SlashCommand, COMMAND_HELP};
use crate::input::{clean_input, read_file_input};
use crate::readline::{LineReader, ReadLine};
use crate::selection::{model_menu, resolve_selection};
use crate::session::{SessionController, TurnOutcome, FAILURE_PREFIX};
use crate::summary::ChatSummary;

const FILE_PREVIEW_CHARS: usize = 100;

/// Whether the loop keeps reading after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct ChatApp<R, W> {
    session: SessionController,
    reader: R,
    out: W,
    cancel: CancelSignal,
    model: String,
}

impl<R: LineReader, W: Write> ChatApp<R, W> {
    /// `cancel` is raised to interrupt a streaming reply; it is reset before
    /// every turn.
    pub fn new(session: SessionController, reader: R, out: W, cancel: CancelSignal) -> Self {
        Self {
            session,
            reader,
            out,
            cancel,
            model: String::new(),
        }
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn into_session(self) -> SessionController {
        self.session
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Runs the whole session: banner, model choice, then the prompt loop
    /// until `/quit`, `/goodbye`, Ctrl-C, or end of input.
    pub fn run(&mut self, preset_model: Option<String>) -> Result<()> {
        writeln!(self.out, "{}", "Persistent Ollama Chat".cyan())?;
        writeln!(self.out, "{}", "======================".cyan())?;
        self.print_load_notice()?;
        self.print_summary()?;

        let Some(model) = self.choose_model(preset_model)? else {
            return Ok(());
        };
        self.model = model;
        self.print_startup()?;

        let prompt = format!("\n{} ", "You:".blue());
        loop {
            match self.reader.read_line(&prompt)? {
                ReadLine::Line(raw) => {
                    if self.handle_line(&raw)? == Flow::Exit {
                        break;
                    }
                }
                ReadLine::Interrupted => {
                    writeln!(
                        self.out,
                        "\n{}",
                        "Chat interrupted. Your history has been saved. Goodbye!".green()
                    )?;
                    break;
                }
                ReadLine::Eof => {
                    writeln!(
                        self.out,
                        "\n{}",
                        "Chat ended. Your history has been saved. Goodbye!".green()
                    )?;
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handles one line typed at the prompt.
    pub fn handle_line(&mut self, raw: &str) -> Result<Flow> {
        let line = clean_input(raw);
        if line.is_empty() {
            return Ok(Flow::Continue);
        }
        self.reader.add_history(&line);

        let text = match parse_slash_command(&line) {
            None => line,
            Some(SlashCommand::Quit) => {
                writeln!(self.out, "{}", "Goodbye! Your chat history has been saved.".green())?;
                return Ok(Flow::Exit);
            }
            Some(SlashCommand::Goodbye) => {
                writeln!(
                    self.out,
                    "{}",
                    "Goodbye! Thank you for chatting. Your conversation history has been preserved for next time.".magenta()
                )?;
                return Ok(Flow::Exit);
            }
            Some(SlashCommand::Help) => {
                self.print_help()?;
                return Ok(Flow::Continue);
            }
            Some(SlashCommand::System) => {
                self.edit_system_prompt()?;
                return Ok(Flow::Continue);
            }
            Some(SlashCommand::Clear) => {
                self.clear_history()?;
                return Ok(Flow::Continue);
            }
            Some(SlashCommand::Summary) => {
                self.print_summary()?;
                return Ok(Flow::Continue);
            }
            Some(SlashCommand::Multiline) => match self.read_multiline()? {
                Some(text) => text,
                None => return Ok(Flow::Continue),
            },
            Some(SlashCommand::File) => {
                // Paths keep their exact spelling, so read them from the raw line.
                let inline_path = raw
                    .trim()
                    .split_once(char::is_whitespace)
                    .map(|(_, rest)| rest.trim().to_string());
                match self.read_file(inline_path)? {
                    Some(text) => text,
                    None => return Ok(Flow::Continue),
                }
            }
            Some(SlashCommand::Unknown(command)) => {
                writeln!(
                    self.out,
                    "{}",
                    format!("Unknown command '{command}'. Type /help for commands.").yellow()
                )?;
                return Ok(Flow::Continue);
            }
        };

        self.send_turn(&text)?;
        Ok(Flow::Continue)
    }

    /// Streams one turn to the output and reports how it ended.
    pub fn send_turn(&mut self, text: &str) -> Result<TurnOutcome> {
        self.cancel.store(false, Ordering::SeqCst);
        writeln!(self.out, "{}", "Assistant:".green())?;

        let out = &mut self.out;
        let mut write_error = None;
        let outcome = self
            .session
            .run_turn(&self.model, text, Arc::clone(&self.cancel), |chunk| {
                if write_error.is_none() {
                    if let Err(error) = write!(out, "{chunk}").and_then(|()| out.flush()) {
                        write_error = Some(error);
                    }
                }
            })
            .context("failed to save the conversation")?;

        if let Some(error) = write_error {
            return Err(error).context("failed to display the reply");
        }

        writeln!(self.out)?;
        match &outcome {
            TurnOutcome::Committed(_) => {}
            TurnOutcome::Cancelled { .. } => {
                writeln!(
                    self.out,
                    "{}",
                    "Response interrupted; the partial reply was not saved.".yellow()
                )?;
            }
            TurnOutcome::Failed { error, recorded } => {
                writeln!(self.out, "{}", format!("{FAILURE_PREFIX}: {error}").red())?;
                if recorded.is_some() {
                    writeln!(self.out, "{}", "The error was recorded in the chat history.".yellow())?;
                }
            }
        }
        self.out.flush()?;

        Ok(outcome)
    }

    fn choose_model(&mut self, preset: Option<String>) -> Result<Option<String>> {
        if let Some(model) = preset.map(|model| model.trim().to_string()) {
            if !model.is_empty() {
                self.remember_model(&model)?;
                return Ok(Some(model));
            }
        }

        let models = self.session.list_models();
        // Listing can block on the server and the CLI fallback; Ctrl-C there
        // only raises the cancel flag.
        if self.cancel.swap(false, Ordering::SeqCst) {
            writeln!(self.out, "\n{}", "Interrupted while listing models. Goodbye!".yellow())?;
            return Ok(None);
        }
        if models.is_empty() {
            writeln!(
                self.out,
                "{}",
                "No Ollama models found. Please install a model first using 'ollama pull <model_name>'".red()
            )?;
            return Ok(None);
        }

        let last_model = self
            .session
            .store()
            .config()
            .last_model()
            .map(str::to_string);

        writeln!(self.out, "\n{}", "Available models:".cyan())?;
        for line in model_menu(&models, last_model.as_deref()) {
            writeln!(self.out, "  {line}")?;
        }

        let prompt = format!(
            "\n{} ",
            format!("Select model (1-{}) or press Enter for last used:", models.len()).yellow()
        );
        loop {
            let choice = match self.reader.read_line(&prompt)? {
                ReadLine::Line(choice) => choice,
                ReadLine::Interrupted | ReadLine::Eof => return Ok(None),
            };

            match resolve_selection(&choice, &models, last_model.as_deref()) {
                Ok(model) => {
                    self.remember_model(&model)?;
                    return Ok(Some(model));
                }
                Err(error) => writeln!(self.out, "{}", error.to_string().red())?,
            }
        }
    }

    fn remember_model(&mut self, model: &str) -> Result<()> {
        if self.session.store().config().last_model() == Some(model) {
            return Ok(());
        }

        self.session
            .store_mut()
            .config_mut()
            .update_last_model(model)
            .context("failed to save the selected model")
    }

    fn print_load_notice(&mut self) -> Result<()> {
        let log = self.session.store().log();
        let rejected = log.rejected_on_load();
        if rejected > 0 {
            writeln!(
                self.out,
                "{}",
                format!(
                    "Skipped {rejected} unreadable history entries; the original file was copied to {}.corrupt.",
                    log.path().display()
                )
                .yellow()
            )?;
        }
        let dropped = log.truncated_on_load();
        if dropped > 0 {
            writeln!(
                self.out,
                "{}",
                format!(
                    "Dropped {dropped} oldest messages to stay within max_history_length ({}).",
                    log.max_history_length()
                )
                .yellow()
            )?;
        }
        Ok(())
    }

    fn print_startup(&mut self) -> Result<()> {
        let paths = self.session.store().paths().clone();
        writeln!(self.out, "\n{}", format!("Using model: {}", self.model).green())?;
        writeln!(
            self.out,
            "{}",
            format!("System prompt loaded from: {}", paths.system_prompt.display()).green()
        )?;
        writeln!(
            self.out,
            "{}",
            format!("Chat history loaded from: {}", paths.history.display()).green()
        )?;
        self.print_help()?;
        writeln!(
            self.out,
            "\n{}",
            "Start chatting! (Type your message and press Enter)".cyan()
        )?;
        writeln!(self.out, "{}", "=".repeat(50))?;
        Ok(())
    }

    fn print_help(&mut self) -> Result<()> {
        writeln!(self.out, "\n{}", "Commands:".yellow())?;
        for (command, description) in COMMAND_HELP {
            writeln!(self.out, "  {command:<11}- {description}")?;
        }
        Ok(())
    }

    fn print_summary(&mut self) -> Result<()> {
        let Some(summary) = ChatSummary::from_log(self.session.store().log()) else {
            writeln!(self.out, "{}", "No previous chat history found.".yellow())?;
            return Ok(());
        };

        writeln!(self.out, "\n{}", "=== Chat History Summary ===".cyan())?;
        writeln!(
            self.out,
            "{}",
            format!("Total messages: {}", summary.total).green()
        )?;
        writeln!(self.out, "\n{}", "Recent messages:".cyan())?;
        for entry in &summary.recent {
            let label = format!("{}:", entry.label);
            let label = if entry.is_user { label.blue() } else { label.green() };
            writeln!(self.out, "  {label} {}", entry.preview)?;
        }
        if summary.remaining > 0 {
            writeln!(
                self.out,
                "  {}",
                format!("... and {} more messages", summary.remaining).yellow()
            )?;
        }
        Ok(())
    }

    fn edit_system_prompt(&mut self) -> Result<()> {
        writeln!(self.out, "\n{}", "Current system prompt:".cyan())?;
        writeln!(self.out, "{}", self.session.store().system_prompt().text())?;
        writeln!(
            self.out,
            "\n{}",
            "Enter new system prompt (or press Enter to keep current):".yellow()
        )?;

        let replacement = match self.reader.read_line("> ")? {
            ReadLine::Line(line) => line.trim().to_string(),
            ReadLine::Interrupted | ReadLine::Eof => String::new(),
        };

        if replacement.is_empty() {
            writeln!(self.out, "{}", "System prompt unchanged.".yellow())?;
            return Ok(());
        }

        self.session
            .store_mut()
            .system_prompt_mut()
            .replace(replacement)
            .context("failed to save the system prompt")?;
        writeln!(self.out, "{}", "System prompt updated!".green())?;
        Ok(())
    }

    fn clear_history(&mut self) -> Result<()> {
        let prompt = format!(
            "{} ",
            "Are you sure you want to clear all chat history? (yes/no):".yellow()
        );
        let confirmed = match self.reader.read_line(&prompt)? {
            ReadLine::Line(answer) => answer.trim().eq_ignore_ascii_case("yes"),
            ReadLine::Interrupted | ReadLine::Eof => false,
        };

        if !confirmed {
            writeln!(self.out, "{}", "Chat history preserved.".yellow())?;
            return Ok(());
        }

        self.session
            .store_mut()
            .log_mut()
            .clear()
            .context("failed to clear the chat history")?;
        writeln!(self.out, "{}", "Chat history cleared!".green())?;
        Ok(())
    }

    fn read_multiline(&mut self) -> Result<Option<String>> {
        writeln!(self.out, "\n{}", "Multi-line input mode:".cyan())?;
        writeln!(self.out, "{}", "- Type your message across multiple lines".yellow())?;
        writeln!(self.out, "{}", "- Press Ctrl-D when finished".yellow())?;
        writeln!(self.out, "{}", "- Or type 'END' on a line by itself".yellow())?;
        writeln!(self.out, "{}", "-".repeat(40).cyan())?;

        let mut lines = Vec::new();
        loop {
            match self.reader.read_line("")? {
                ReadLine::Line(line) if line.trim() == "END" => break,
                ReadLine::Line(line) => lines.push(line),
                ReadLine::Eof => break,
                ReadLine::Interrupted => {
                    writeln!(self.out, "\n{}", "Multi-line input cancelled".yellow())?;
                    return Ok(None);
                }
            }
        }

        let text = lines.join("\n").trim().to_string();
        writeln!(self.out, "{}", "-".repeat(40).cyan())?;
        if text.is_empty() {
            writeln!(self.out, "{}", "No input captured.".yellow())?;
            return Ok(None);
        }

        writeln!(
            self.out,
            "{}",
            format!("Multi-line input captured ({} characters)", text.chars().count()).green()
        )?;
        Ok(Some(text))
    }

    fn read_file(&mut self, inline_path: Option<String>) -> Result<Option<String>> {
        let raw_path = match inline_path.filter(|path| !path.is_empty()) {
            Some(path) => path,
            None => {
                writeln!(self.out, "\n{}", "File input mode:".cyan())?;
                writeln!(
                    self.out,
                    "{}",
                    "Enter the path to a text file to use as input:".yellow()
                )?;
                match self.reader.read_line("Path: ")? {
                    ReadLine::Line(path) => path,
                    ReadLine::Interrupted | ReadLine::Eof => return Ok(None),
                }
            }
        };

        match read_file_input(&raw_path) {
            Ok(content) => {
                let count = content.chars().count();
                let head: String = content.chars().take(FILE_PREVIEW_CHARS).collect();
                let ellipsis = if count > FILE_PREVIEW_CHARS { "..." } else { "" };
                writeln!(
                    self.out,
                    "{}",
                    format!("File content loaded ({count} characters)").green()
                )?;
                writeln!(self.out, "{}", format!("Preview: {head}{ellipsis}").cyan())?;
                Ok(Some(content))
            }
            Err(error) => {
                writeln!(self.out, "{}", format!("Error: {error}").red())?;
                Ok(None)
            }
        }
    }
}
