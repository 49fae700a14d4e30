/// In-loop slash commands; anything else is sent to the model as a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Clear,
    Models,
    Model(String),
    Quit,
    Unknown(String),
}

pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let mut parts = trimmed.split_whitespace();
    let command = parts.next().unwrap_or(trimmed);

    let parsed = match command {
        "/help" => SlashCommand::Help,
        "/clear" => SlashCommand::Clear,
        "/models" => SlashCommand::Models,
        "/model" => match parts.next() {
            Some(name) => SlashCommand::Model(name.to_string()),
            None => SlashCommand::Unknown(command.to_string()),
        },
        "/quit" => SlashCommand::Quit,
        _ => SlashCommand::Unknown(command.to_string()),
    };

    Some(parsed)
}
