use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clichat::chat::{ChatConfig, ChatError, ChatService, UsageReport};
use clichat::commands::{parse_slash_command, SlashCommand};
use clichat::config::Config;
use clichat::render::StdoutRenderer;
use clichat::state::{load_state, save_state, SessionState};
use conversation_store::ConversationStore;
use litellm_api::{LiteLlmClient, LiteLlmConfig};
use log::warn;

const DEFAULT_CONVERSATION_ID: &str = "default";

fn main() -> io::Result<()> {
    env_logger::init();

    let config = Config::from_env();
    let mut state = load_state(&config.state_path).unwrap_or_else(|error| {
        warn!("ignoring unreadable session state: {error}");
        SessionState::default()
    });

    // The persisted override wins over the environment; both may be empty,
    // in which case the gateway rejects the first turn with a clear error.
    let model = state
        .model
        .clone()
        .filter(|model| !model.is_empty())
        .unwrap_or_else(|| config.model.clone());
    if model.is_empty() {
        warn!("no model configured; set LLM_MODEL or use /model <name>");
    }

    let store = ConversationStore::open(&config.db_path).map_err(io::Error::other)?;

    let mut client_config = LiteLlmConfig::new(&config.base_url);
    if let Some(api_key) = &config.api_key {
        client_config = client_config.with_api_key(api_key);
    }
    let client = Arc::new(LiteLlmClient::new(client_config).map_err(io::Error::other)?);

    let chat_config = ChatConfig {
        model,
        system_prompt: config.system_prompt.clone(),
        temperature: config.temperature,
        top_p: config.top_p,
        context_window_tokens: (config.context_window_tokens > 0)
            .then_some(config.context_window_tokens),
        history_limit: config.history_limit,
        enable_provider_websearch: config.enable_provider_websearch,
        omit_sampling_params: config.sampling_exclusion(),
    };
    let mut service = ChatService::new(chat_config, store, Arc::clone(&client), StdoutRenderer);

    let cancellation = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&cancellation))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    println!("clichat — enter messages, /help for commands. Conversation: {DEFAULT_CONVERSATION_ID}");
    let stdin = io::stdin();

    loop {
        print!("you> ");
        io::stdout().flush()?;

        let Some(line) = read_input_line(&stdin)? else {
            break;
        };
        // Ctrl+C at the prompt quits; mid-turn it cancels the turn instead.
        if cancellation.swap(false, Ordering::SeqCst) {
            break;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = parse_slash_command(line) {
            match command {
                SlashCommand::Help => print_help(),
                SlashCommand::Quit => break,
                SlashCommand::Clear => {
                    match service.store().clear_conversation(DEFAULT_CONVERSATION_ID) {
                        Ok(()) => println!("conversation history cleared"),
                        Err(error) => println!("error: {error}"),
                    }
                }
                SlashCommand::Models => match runtime.block_on(client.list_models()) {
                    Ok(models) => {
                        for model in models {
                            println!("{}", model.display_name());
                        }
                    }
                    Err(error) => println!("error: {error}"),
                },
                SlashCommand::Model(name) => {
                    state.model = Some(name.clone());
                    match save_state(&config.state_path, &state) {
                        Ok(()) => {
                            service.set_model(name.clone());
                            println!("default model set to: {name}");
                        }
                        Err(error) => println!("error: {error}"),
                    }
                }
                SlashCommand::Unknown(command) => {
                    println!("unknown or incomplete command: {command} (try /help)");
                }
            }
            continue;
        }

        print!("assistant> ");
        io::stdout().flush()?;

        cancellation.store(false, Ordering::SeqCst);
        let turn = runtime.block_on(service.run_turn(
            DEFAULT_CONVERSATION_ID,
            line,
            Some(&cancellation),
        ));
        cancellation.store(false, Ordering::SeqCst);
        println!();

        match turn {
            Ok(outcome) => {
                if let UsageReport::Window {
                    used,
                    capacity,
                    percent,
                } = outcome.usage
                {
                    println!("  [context: {percent} ({used}/{capacity})]");
                }
            }
            Err(ChatError::Cancelled) => println!("(cancelled)"),
            Err(error) => println!("error: {error}"),
        }
    }

    Ok(())
}

/// Reads one line from stdin; `None` means EOF or an interrupted read, both
/// of which end the interactive loop.
fn read_input_line(stdin: &io::Stdin) -> io::Result<Option<String>> {
    let mut line = String::new();
    match stdin.lock().read_line(&mut line) {
        Ok(0) => Ok(None),
        Ok(_) => Ok(Some(line)),
        Err(error) if error.kind() == io::ErrorKind::Interrupted => Ok(None),
        Err(error) => Err(error),
    }
}

fn print_help() {
    println!("commands:");
    println!("  /help           show this help");
    println!("  /models         list models available on the gateway");
    println!("  /model <name>   set and persist the default model");
    println!("  /clear          clear the conversation history");
    println!("  /quit           exit");
    println!("anything else is sent to the model; Ctrl+C cancels a streaming turn");
}
