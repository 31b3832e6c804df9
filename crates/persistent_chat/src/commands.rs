#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    System,
    Clear,
    Summary,
    Multiline,
    File,
    Quit,
    Goodbye,
    Unknown(String),
}

/// Help text, one `(command, description)` pair per line.
pub const COMMAND_HELP: &[(&str, &str)] = &[
    ("/help", "Show this help"),
    ("/system", "Edit system prompt"),
    ("/clear", "Clear chat history"),
    ("/summary", "Show chat summary"),
    ("/multiline", "Enter multi-line input mode"),
    ("/file", "Read input from a text file"),
    ("/quit", "Exit the chat"),
    ("/goodbye", "End session with farewell"),
];

/// Parses a line starting with `/` into a command, ignoring case.
/// Lines that do not start with `/` are chat input and yield `None`.
pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let command = trimmed
        .split_whitespace()
        .next()
        .unwrap_or(trimmed)
        .to_lowercase();

    let parsed = match command.as_str() {
        "/help" => SlashCommand::Help,
        "/system" => SlashCommand::System,
        "/clear" => SlashCommand::Clear,
        "/summary" => SlashCommand::Summary,
        "/multiline" => SlashCommand::Multiline,
        "/file" => SlashCommand::File,
        "/quit" => SlashCommand::Quit,
        "/goodbye" => SlashCommand::Goodbye,
        _ => SlashCommand::Unknown(command),
    };

    Some(parsed)
}
