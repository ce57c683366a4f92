use std::path::PathBuf;

use crate::config::ConfigField;

/// Slash commands understood by the interactive chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Quit,
    Clear,
    Config,
    Stats,
    /// Export to the given file, or to `<session name>.json`.
    Export(Option<PathBuf>),
    Import(PathBuf),
    Set { field: ConfigField, value: String },
}

impl ReplCommand {
    /// Parse one input line.
    ///
    /// Returns `None` for ordinary chat text and `Some(Err(..))` for a
    /// slash command that could not be understood.
    #[must_use]
    pub fn parse(line: &str) -> Option<Result<Self, String>> {
        let line = line.trim();

        if matches!(line, "exit" | "quit" | "q") {
            return Some(Ok(Self::Quit));
        }

        let rest = line.strip_prefix('/')?;
        let (name, args) = rest
            .split_once(char::is_whitespace)
            .map_or((rest, ""), |(name, args)| (name, args.trim()));

        let command = match name.to_lowercase().as_str() {
            "help" | "h" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            "clear" | "reset" => Ok(Self::Clear),
            "config" => Ok(Self::Config),
            "stats" | "tokens" => Ok(Self::Stats),
            "export" | "save" => Ok(Self::Export(
                (!args.is_empty()).then(|| PathBuf::from(args)),
            )),
            "import" | "load" => {
                if args.is_empty() {
                    Err("usage: /import <file>".to_string())
                } else {
                    Ok(Self::Import(PathBuf::from(args)))
                }
            }
            "set" => Self::parse_set(args),
            other => Err(format!("unknown command '/{other}', try /help")),
        };

        Some(command)
    }

    fn parse_set(args: &str) -> Result<Self, String> {
        let (field, value) = args
            .split_once(char::is_whitespace)
            .map_or((args, ""), |(field, value)| (field, value.trim()));

        if field.is_empty() {
            return Err("usage: /set <field> <value>".to_string());
        }

        let field = ConfigField::parse(field).ok_or_else(|| {
            let names: Vec<&str> = ConfigField::ALL.iter().map(|f| f.name()).collect();
            format!("unknown field '{field}', expected one of: {}", names.join(", "))
        })?;

        Ok(Self::Set {
            field,
            value: value.to_string(),
        })
    }

    #[must_use]
    pub const fn help_text() -> &'static str {
        r"
Commands:
  /help                    show this help
  /clear                   forget the conversation and start a new one
  /export [file]           save the conversation as JSON
  /import <file>           replace the conversation with a saved one
  /set <field> <value>     change model, temperature, max_tokens,
                           system_prompt, language or session_name
  /config                  show the current settings
  /stats                   show message and token counts
  /quit                    leave (also: exit, quit, q)
"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(ReplCommand::parse("hello there"), None);
        assert_eq!(ReplCommand::parse("ดวง?"), None);
    }

    #[test]
    fn exit_words_quit() {
        assert_eq!(ReplCommand::parse("exit"), Some(Ok(ReplCommand::Quit)));
        assert_eq!(ReplCommand::parse(" q "), Some(Ok(ReplCommand::Quit)));
        assert_eq!(ReplCommand::parse("/quit"), Some(Ok(ReplCommand::Quit)));
    }

    #[test]
    fn export_with_and_without_path() {
        assert_eq!(
            ReplCommand::parse("/export"),
            Some(Ok(ReplCommand::Export(None)))
        );
        assert_eq!(
            ReplCommand::parse("/export  /tmp/chat.json "),
            Some(Ok(ReplCommand::Export(Some(PathBuf::from("/tmp/chat.json")))))
        );
    }

    #[test]
    fn import_needs_a_path() {
        assert!(matches!(ReplCommand::parse("/import"), Some(Err(_))));
        assert_eq!(
            ReplCommand::parse("/import chat.json"),
            Some(Ok(ReplCommand::Import(PathBuf::from("chat.json"))))
        );
    }

    #[test]
    fn set_keeps_spaces_in_value() {
        assert_eq!(
            ReplCommand::parse("/set system_prompt You are a fortune teller."),
            Some(Ok(ReplCommand::Set {
                field: ConfigField::SystemInstruction,
                value: "You are a fortune teller.".to_string(),
            }))
        );
        assert!(matches!(ReplCommand::parse("/set colour red"), Some(Err(_))));
        assert!(matches!(ReplCommand::parse("/set"), Some(Err(_))));
    }

    #[test]
    fn unknown_command_is_an_error() {
        assert!(matches!(ReplCommand::parse("/dance"), Some(Err(_))));
    }
}
