//! Multi-turn conversation command.
//!
//! Runs one session against the Gemini API, or against the canned reply
//! book with `--offline`. The session lives only as long as the process;
//! use `/export` or `--export` to keep it.

use chatdeck_config::Config;
use chatdeck_conversation::{ConfigField, SessionContext};
use chatdeck_core::{CannedDispatcher, Dispatcher};
use chatdeck_providers::GeminiProvider;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use super::{apply_overrides, build_session_config};

/// Input parameters for the Chat command strategy.
#[derive(Debug, Clone, Default)]
pub struct ChatInput {
    /// Optional single message to send (non-interactive mode)
    pub message: Option<String>,
    /// Optional model override
    pub model: Option<String>,
    /// Session name override
    pub session_name: Option<String>,
    /// Display language override
    pub language: Option<String>,
    /// Answer from the canned reply book instead of the API
    pub offline: bool,
    /// Snapshot to resume from
    pub import: Option<PathBuf>,
    /// Snapshot file written when the command finishes
    pub export: Option<PathBuf>,
}

/// Strategy for executing the Chat command.
#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let session_config = build_session_config(&config)?;

        // The credential is read once, before any session exists.
        let dispatcher: Arc<dyn Dispatcher> = if input.offline {
            info!("Offline mode: using canned replies");
            Arc::new(CannedDispatcher::default())
        } else {
            let mut provider = GeminiProvider::new(config.api_key()?).with_timeout(config.timeout());
            if let Some(base_url) = config.provider.base_url.clone() {
                provider = provider.with_base_url(base_url);
            }
            Arc::new(provider)
        };

        let mut context = SessionContext::new(dispatcher, session_config);

        if let Some(path) = &input.import {
            let warnings = context.import_from(path)?;
            println!(
                "Resumed {} turns from {}",
                context.session().turn_count(),
                path.display()
            );
            for warning in warnings {
                println!("  note: {warning}");
            }
        }

        apply_overrides(
            &mut context,
            &[
                (ConfigField::Model, input.model.as_deref()),
                (ConfigField::SessionName, input.session_name.as_deref()),
                (ConfigField::DisplayLanguage, input.language.as_deref()),
            ],
        )?;

        let outcome = match input.message {
            // Single message mode
            Some(msg) => context
                .send_message(&msg)
                .await
                .map(|reply| println!("{}", reply.content())),
            None => context.run_interactive().await,
        };

        // A failed dispatch still leaves the user turn worth keeping.
        export_if_requested(&context, input.export.as_deref())?;

        info!(
            "Conversation ended: {} total turns",
            context.session().turn_count()
        );

        Ok(outcome?)
    }
}

fn export_if_requested<D: Dispatcher>(
    context: &SessionContext<D>,
    path: Option<&Path>,
) -> anyhow::Result<()> {
    if let Some(path) = path {
        context.export_to(path)?;
        println!("Saved to {}", path.display());
    }
    Ok(())
}
