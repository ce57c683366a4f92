//! Behavioural properties of a conversation session:
//! 1. Appends keep order and count
//! 2. Blank user input is refused without side effects
//! 3. Clear resets history and name only
//! 4. Temperature is validated, not clamped, on set
//! 5. Snapshots round-trip, including non-ASCII text
//! 6. Import is lenient except for unparseable text

use chatdeck_conversation::{
    ConfigField, ConfigValue, ConversationError, ConversationSession, DEFAULT_OUTPUT_TOKENS,
    DEFAULT_TEMPERATURE, Locale, ModelId, SnapshotWarning,
};
use chatdeck_core::{Role, estimate_token_count};

#[test]
fn successful_appends_are_counted_in_order() {
    let mut session = ConversationSession::new();
    let inputs = ["one", "two", "  three  ", "four"];

    for (i, text) in inputs.iter().enumerate() {
        let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
        assert!(session.append_turn(role, *text).is_ok());
    }
    // Refused calls do not count.
    assert!(session.append_turn(Role::User, " ").is_err());

    assert_eq!(session.turn_count(), inputs.len());
    for (turn, text) in session.turns().iter().zip(inputs) {
        assert_eq!(turn.content(), text);
    }
}

#[test]
fn empty_and_whitespace_user_turns_fail() {
    let mut session = ConversationSession::new();
    assert!(session.append_turn(Role::User, "hello").is_ok());

    for content in ["", "   ", "\n\t"] {
        let result = session.append_turn(Role::User, content);
        assert!(matches!(result, Err(ConversationError::InvalidInput)));
    }
    assert_eq!(session.turn_count(), 1);
}

#[test]
fn clear_keeps_other_config_fields() {
    let mut session = ConversationSession::new();
    let setup = [
        (ConfigField::SessionName, ConfigValue::Text("my chat".to_string())),
        (ConfigField::Model, ConfigValue::Text("gemini-1.5-pro".to_string())),
        (ConfigField::Temperature, ConfigValue::Number(0.9)),
        (ConfigField::MaxOutputTokens, ConfigValue::Integer(512)),
        (ConfigField::SystemInstruction, ConfigValue::Text("Be kind.".to_string())),
        (ConfigField::DisplayLanguage, ConfigValue::Text("th".to_string())),
    ];
    for (field, value) in setup {
        assert!(session.set_config_field(field, value).is_ok());
    }
    assert!(session.append_turn(Role::User, "hello").is_ok());
    assert!(session.append_turn(Role::Assistant, "hi").is_ok());

    session.clear();

    let config = session.config();
    assert!(session.is_empty());
    assert_ne!(config.session_name(), "my chat");
    assert!(config.session_name().starts_with("chat_"));
    assert_eq!(config.model_id(), ModelId::Gemini15Pro);
    assert!((config.temperature() - 0.9).abs() < f64::EPSILON);
    assert_eq!(config.max_output_tokens(), 512);
    assert_eq!(config.system_instruction(), "Be kind.");
    assert_eq!(config.display_language(), Locale::Thai);
}

#[test]
fn temperature_is_refused_out_of_range_and_stored_in_range() {
    let mut session = ConversationSession::new();

    let rejected = session.set_config_field(ConfigField::Temperature, ConfigValue::Number(1.5));
    assert!(matches!(
        rejected,
        Err(ConversationError::InvalidConfig {
            field: ConfigField::Temperature,
            ..
        })
    ));
    assert!((session.config().temperature() - DEFAULT_TEMPERATURE).abs() < f64::EPSILON);

    let accepted = session.set_config_field(ConfigField::Temperature, ConfigValue::Number(0.3));
    assert_eq!(accepted.ok(), Some(ConfigValue::Number(0.3)));
    assert!((session.config().temperature() - 0.3).abs() < f64::EPSILON);
    assert_eq!(
        session.config().get(ConfigField::Temperature),
        ConfigValue::Number(0.3)
    );
}

#[test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
fn three_turn_round_trip_with_thai_text() {
    let mut session = ConversationSession::new();
    assert!(session.append_turn(Role::User, "hello").is_ok());
    assert!(session.append_turn(Role::Assistant, "hi there").is_ok());
    assert!(session.append_turn(Role::User, "ดวง?").is_ok());

    let record = session
        .to_snapshot()
        .to_value()
        .expect("Failed to encode snapshot");
    let restored = ConversationSession::from_snapshot(&record).expect("Failed to decode snapshot");

    let summary = |s: &ConversationSession| -> Vec<(Role, String)> {
        s.turns()
            .iter()
            .map(|t| (t.role(), t.content().to_string()))
            .collect()
    };
    assert_eq!(summary(&restored), summary(&session));
    assert_eq!(restored.turns(), session.turns());
    assert_eq!(restored.turns()[2].content(), "ดวง?");
}

#[test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
fn missing_messages_yields_empty_default_session() {
    let text = r#"{ "conversation_name": "from disk" }"#;

    let imported =
        ConversationSession::import_snapshot_str(text).expect("Failed to import partial snapshot");

    let config = imported.session.config();
    assert!(imported.session.is_empty());
    assert_eq!(config.session_name(), "from disk");
    assert_eq!(config.model_id(), ModelId::default());
    assert_eq!(config.max_output_tokens(), DEFAULT_OUTPUT_TOKENS);
    assert_eq!(config.display_language(), Locale::default());
    assert!(
        imported
            .warnings
            .contains(&SnapshotWarning::MissingField("messages"))
    );
}

#[test]
fn syntactically_invalid_text_is_malformed() {
    for text in ["", "{", "messages: []", "{\"messages\": [}"] {
        let result = ConversationSession::from_snapshot_str(text);
        assert!(
            matches!(result, Err(ConversationError::MalformedSnapshot(_))),
            "{text:?} should be malformed"
        );
    }
}

#[test]
fn token_estimate_examples() {
    assert_eq!(estimate_token_count("abcd"), 1);
    assert_eq!(estimate_token_count(""), 0);
}
