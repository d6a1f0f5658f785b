//! The two behaviors that differ between a human client and an
//! autonomous one.
//!
//! [`ServerApi`](crate::ServerApi) owns reply correlation and transport;
//! what happens when the server complains, and what side effects follow
//! a successful reply, is delegated to a [`ServerApiHooks`] value.

use std::sync::Arc;

use tradewind_protocol::{ErrorMessage, Message, PlayerId};
use tracing::{debug, warn};

use crate::DebugMode;

/// Strategy for complaint surfacing and post-reply processing.
pub trait ServerApiHooks: Send + Sync + 'static {
    /// Called with every application-level complaint from the server.
    fn do_raise_error_message(&self, complaint: &ErrorMessage);

    /// Called after every successful reply that carries content.
    fn do_client_processing_for(&self, reply: &Message);
}

/// Hooks for an autonomous actor: complaints are logged, replies need
/// no extra processing.
#[derive(Debug, Clone)]
pub struct AiHooks {
    player: PlayerId,
}

impl AiHooks {
    pub fn new(player: PlayerId) -> Self {
        Self { player }
    }

    pub fn player(&self) -> &PlayerId {
        &self.player
    }
}

impl ServerApiHooks for AiHooks {
    fn do_raise_error_message(&self, complaint: &ErrorMessage) {
        warn!(
            player = %self.player,
            message_id = complaint.message_id.as_deref().unwrap_or(""),
            message = %complaint.message,
            "server complaint"
        );
    }

    fn do_client_processing_for(&self, _reply: &Message) {}
}

/// The synchronous UI surface a human client provides.
pub trait UserInterface: Send + Sync + 'static {
    fn show_error_message(&self, message_id: Option<&str>, message: &str);

    fn play_sound(&self, sound: &str);

    /// Asks the user to pick one of `options`. `None` means cancelled.
    fn prompt_choice(&self, prompt: &str, options: &[String]) -> Option<String>;
}

/// Hooks for a human client.
pub struct UserHooks<U: UserInterface> {
    ui: Arc<U>,
    debug: DebugMode,
}

impl<U: UserInterface> UserHooks<U> {
    pub fn new(ui: Arc<U>, debug: DebugMode) -> Self {
        Self { ui, debug }
    }

    pub fn ui(&self) -> &Arc<U> {
        &self.ui
    }
}

impl<U: UserInterface> ServerApiHooks for UserHooks<U> {
    fn do_raise_error_message(&self, complaint: &ErrorMessage) {
        if self.debug.comms {
            self.ui
                .show_error_message(complaint.message_id.as_deref(), &complaint.message);
        } else {
            debug!(message = %complaint.message, "server complaint not shown");
        }
    }

    fn do_client_processing_for(&self, reply: &Message) {
        if let Some(sound) = reply.sound().filter(|s| !s.is_empty()) {
            self.ui.play_sound(sound);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use tradewind_protocol::{EndTurn, Update};

    use super::*;

    /// Records every call for assertions.
    #[derive(Default)]
    pub(crate) struct RecordingUi {
        pub(crate) errors: Mutex<Vec<String>>,
        pub(crate) sounds: Mutex<Vec<String>>,
    }

    impl UserInterface for RecordingUi {
        fn show_error_message(&self, _message_id: Option<&str>, message: &str) {
            self.errors.lock().unwrap().push(message.to_string());
        }

        fn play_sound(&self, sound: &str) {
            self.sounds.lock().unwrap().push(sound.to_string());
        }

        fn prompt_choice(&self, _prompt: &str, options: &[String]) -> Option<String> {
            options.first().cloned()
        }
    }

    #[test]
    fn test_user_hooks_hide_complaints_without_debug() {
        let ui = Arc::new(RecordingUi::default());
        let hooks = UserHooks::new(ui.clone(), DebugMode::default());

        hooks.do_raise_error_message(&ErrorMessage::new("Not your turn"));
        assert!(ui.errors.lock().unwrap().is_empty());
    }

    #[test]
    fn test_user_hooks_show_complaints_in_debug() {
        let ui = Arc::new(RecordingUi::default());
        let hooks = UserHooks::new(ui.clone(), DebugMode { comms: true });

        hooks.do_raise_error_message(&ErrorMessage::new("Not your turn"));
        assert_eq!(*ui.errors.lock().unwrap(), vec!["Not your turn".to_string()]);
    }

    #[test]
    fn test_user_hooks_play_reply_sound() {
        let ui = Arc::new(RecordingUi::default());
        let hooks = UserHooks::new(ui.clone(), DebugMode::default());

        hooks.do_client_processing_for(&EndTurn.into());
        hooks.do_client_processing_for(
            &Update {
                sound: Some("sound.attack.naval".into()),
                ..Update::default()
            }
            .into(),
        );
        hooks.do_client_processing_for(
            &Update {
                sound: Some(String::new()),
                ..Update::default()
            }
            .into(),
        );

        assert_eq!(*ui.sounds.lock().unwrap(), vec!["sound.attack.naval".to_string()]);
    }

    #[test]
    fn test_ai_hooks_never_touch_anything() {
        let hooks = AiHooks::new("player:1".into());
        hooks.do_raise_error_message(&ErrorMessage::new("Not your turn"));
        hooks.do_client_processing_for(&EndTurn.into());
        assert_eq!(hooks.player().as_str(), "player:1");
    }
}
