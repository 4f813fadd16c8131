//! Update routing: which handler answers which Telegram message.
//!
//! | Message | Handler |
//! |---------|---------|
//! | `/start`, `/help` | greeting |
//! | any document | conversion workflow (rejects non-EPUB itself) |
//! | other text | usage hint |
//!
//! Everything else (stickers, photos, edits, …) falls through to the
//! dispatcher's default handler and is only logged.

use crate::relay::Relay;
use crate::request::ConversionRequest;
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::Document;
use teloxide::utils::command::BotCommands;

/// Commands listed in the Telegram client's command menu.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "פקודות זמינות:")]
pub enum Command {
    #[command(description = "הודעת פתיחה")]
    Start,
    #[command(description = "איך משתמשים בבוט")]
    Help,
}

/// Build the handler tree passed to teloxide's `Dispatcher`.
///
/// Endpoints expect an `Arc<Relay>` in the dependency map.
pub fn schema() -> UpdateHandler<teloxide::RequestError> {
    Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(on_command),
        )
        .branch(Message::filter_document().endpoint(on_document))
        .branch(Message::filter_text().endpoint(on_text))
}

async fn on_command(msg: Message, cmd: Command, relay: Arc<Relay>) -> ResponseResult<()> {
    tracing::debug!(chat_id = msg.chat.id.0, "Command {:?}", cmd);
    relay.greet(msg.chat.id.0).await;
    Ok(())
}

async fn on_document(msg: Message, doc: Document, relay: Arc<Relay>) -> ResponseResult<()> {
    // Errors were already reported to the sender inside the relay.
    let _ = relay.handle_document(conversion_request(&msg, &doc)).await;
    Ok(())
}

async fn on_text(msg: Message, relay: Arc<Relay>) -> ResponseResult<()> {
    relay.hint(msg.chat.id.0).await;
    Ok(())
}

/// Detach the fields the workflow needs from teloxide's message types.
pub fn conversion_request(msg: &Message, doc: &Document) -> ConversionRequest {
    ConversionRequest {
        chat_id: msg.chat.id.0,
        message_id: msg.id.0,
        file_id: doc.file.id.clone(),
        file_name: doc.file_name.clone().unwrap_or_default(),
        mime_type: doc.mime_type.as_ref().map(|m| m.essence_str().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_greeting_commands() {
        assert_eq!(Command::parse("/start", "epub2pdf_bot").unwrap(), Command::Start);
        assert_eq!(Command::parse("/help", "epub2pdf_bot").unwrap(), Command::Help);
        assert_eq!(
            Command::parse("/help@epub2pdf_bot", "epub2pdf_bot").unwrap(),
            Command::Help
        );
    }

    #[test]
    fn unknown_commands_do_not_parse() {
        assert!(Command::parse("/convert", "epub2pdf_bot").is_err());
        assert!(Command::parse("hello", "epub2pdf_bot").is_err());
    }

    #[test]
    fn command_menu_lists_both_commands() {
        let commands = Command::bot_commands();
        assert_eq!(commands.len(), 2);
        assert!(commands[0].command.ends_with("start"));
        assert!(commands[1].command.ends_with("help"));
    }
}
