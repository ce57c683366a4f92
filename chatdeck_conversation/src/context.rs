//! Session context: one conversation plus the dispatcher that answers it.
//!
//! Every user action borrows the context mutably, so actions run one at a
//! time and a dispatch in flight blocks the next input.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use chatdeck_core::{Dispatcher, Role};

use crate::command::ReplCommand;
use crate::config::{ConfigField, ConfigValue, SessionConfig};
use crate::error::{ConversationError, Result};
use crate::session::{ConversationSession, Turn};
use crate::snapshot::SnapshotWarning;

pub struct SessionContext<D = Arc<dyn Dispatcher>>
where
    D: Dispatcher,
{
    dispatcher: D,
    session: ConversationSession,
}

impl<D> SessionContext<D>
where
    D: Dispatcher,
{
    /// Create a context around a fresh, empty session.
    pub fn new(dispatcher: D, config: SessionConfig) -> Self {
        Self::with_session(dispatcher, ConversationSession::with_config(config))
    }

    pub fn with_session(dispatcher: D, session: ConversationSession) -> Self {
        info!(
            "Opening session {} ({}) with dispatcher {}",
            session.id(),
            session.config().session_name(),
            dispatcher.name()
        );
        Self {
            dispatcher,
            session,
        }
    }

    #[must_use]
    pub const fn session(&self) -> &ConversationSession {
        &self.session
    }

    /// Send one user message and record the reply.
    ///
    /// The user turn is appended before dispatching and stays in the
    /// history when the dispatcher fails. A failed or blank reply appends
    /// nothing and is not retried.
    pub async fn send_message(&mut self, text: &str) -> Result<Turn> {
        self.session.append_turn(Role::User, text.trim())?;

        let request = self.session.dispatch_request();
        debug!(
            "Dispatching {} messages to {} (model={})",
            request.messages.len(),
            self.dispatcher.name(),
            request.model
        );

        let reply = match self.dispatcher.dispatch(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Session {}: dispatch failed: {e}", self.session.id());
                return Err(e.into());
            }
        };

        if reply.trim().is_empty() {
            warn!("Session {}: dispatcher returned an empty reply", self.session.id());
            return Err(ConversationError::EmptyReply);
        }

        self.session.append_turn(Role::Assistant, reply)
    }

    pub fn clear(&mut self) {
        self.session.clear();
    }

    pub fn set(&mut self, field: ConfigField, value: ConfigValue) -> Result<ConfigValue> {
        self.session.set_config_field(field, value)
    }

    /// Parse command-line text for `field` and store it.
    pub fn set_from_str(&mut self, field: ConfigField, raw: &str) -> Result<ConfigValue> {
        let value = ConfigValue::parse(field, raw)?;
        self.set(field, value)
    }

    /// File name offered when exporting without an explicit path.
    #[must_use]
    pub fn default_export_path(&self) -> PathBuf {
        let name: String = self
            .session
            .config()
            .session_name()
            .chars()
            .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_') { c } else { '_' })
            .collect();
        PathBuf::from(format!("{name}.json"))
    }

    /// Write the session snapshot to `path`.
    pub fn export_to(&self, path: &Path) -> Result<()> {
        let json = self.session.to_snapshot().to_json()?;
        std::fs::write(path, json)?;
        info!(
            "Exported session {} ({} turns) to {}",
            self.session.id(),
            self.session.turn_count(),
            path.display()
        );
        Ok(())
    }

    /// Replace the session with the snapshot stored at `path`.
    ///
    /// The file is read and decoded completely before anything changes, so
    /// a failed import leaves the current session untouched.
    pub fn import_from(&mut self, path: &Path) -> Result<Vec<SnapshotWarning>> {
        let bytes = std::fs::read(path)?;
        let text = String::from_utf8(bytes)
            .map_err(|e| ConversationError::MalformedSnapshot(format!("not UTF-8: {e}")))?;
        let imported = ConversationSession::import_snapshot_str(&text)?;

        info!(
            "Imported {} turns from {} ({} warnings)",
            imported.session.turn_count(),
            path.display(),
            imported.warnings.len()
        );
        self.session = imported.session;
        Ok(imported.warnings)
    }

    /// Run an interactive conversation loop on stdin/stdout.
    pub async fn run_interactive(&mut self) -> Result<()> {
        println!(
            "=== {} ({}, {}) ===",
            self.session.config().session_name(),
            self.session.config().model_id(),
            self.session.config().display_language().label()
        );
        println!("Type /help for commands, 'exit' or Ctrl+C to leave.\n");

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let mut input = String::new();
            if std::io::stdin().read_line(&mut input)? == 0 {
                break;
            }
            let input = input.trim();

            if input.is_empty() {
                continue;
            }

            match ReplCommand::parse(input) {
                Some(Ok(ReplCommand::Quit)) => break,
                Some(Ok(command)) => self.run_command(command),
                Some(Err(message)) => eprintln!("{message}"),
                None => {
                    println!("...");
                    match self.send_message(input).await {
                        Ok(reply) => println!("\n{}\n", reply.content()),
                        Err(e) => eprintln!("Error: {e}"),
                    }
                }
            }
        }

        println!(
            "\nSession ended. Total turns: {}",
            self.session.turn_count()
        );
        Ok(())
    }

    fn run_command(&mut self, command: ReplCommand) {
        match command {
            ReplCommand::Help => println!("{}", ReplCommand::help_text()),
            ReplCommand::Quit => {}
            ReplCommand::Clear => {
                self.clear();
                println!("History cleared. New session: {}", self.session.config().session_name());
            }
            ReplCommand::Config => self.print_config(),
            ReplCommand::Stats => {
                let stats = self.session.stats();
                println!(
                    "{} turns ({} user, {} assistant), {} characters, ~{} tokens",
                    stats.total_turns,
                    stats.user_turns,
                    stats.assistant_turns,
                    stats.total_characters,
                    stats.estimated_tokens
                );
            }
            ReplCommand::Export(path) => {
                let path = path.unwrap_or_else(|| self.default_export_path());
                match self.export_to(&path) {
                    Ok(()) => println!("Saved to {}", path.display()),
                    Err(e) => eprintln!("Export failed: {e}"),
                }
            }
            ReplCommand::Import(path) => match self.import_from(&path) {
                Ok(warnings) => {
                    println!(
                        "Loaded {} turns as {}",
                        self.session.turn_count(),
                        self.session.config().session_name()
                    );
                    for warning in warnings {
                        println!("  note: {warning}");
                    }
                }
                Err(e) => eprintln!("Import failed: {e}"),
            },
            ReplCommand::Set { field, value } => match self.set_from_str(field, &value) {
                Ok(accepted) => println!("{field} = {accepted}"),
                Err(e) => eprintln!("{e}"),
            },
        }
    }

    fn print_config(&self) {
        let config = self.session.config();
        println!("  session_name:  {}", config.session_name());
        println!(
            "  language:      {} ({})",
            config.display_language(),
            config.display_language().label()
        );
        println!("  model:         {}", config.model_id());
        println!("  temperature:   {}", config.temperature());
        println!("  max_tokens:    {}", config.max_output_tokens());
        if config.system_instruction().is_empty() {
            println!("  system_prompt: (none)");
        } else {
            println!("  system_prompt: {}", config.system_instruction());
        }
    }
}
