//! Display rows for a session's transcript

use crate::content;
use crate::message::{Message, MessageId, Sender};

/// One rendered message, with bot envelopes already unwrapped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLine {
    pub message_id: MessageId,
    pub sender: Sender,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Line(DisplayLine),
    /// Typing indicator, always last
    Typing,
}

/// Render history in order, followed by a typing row while a bot reply is
/// in flight.
pub fn render(messages: &[Message], bot_typing: bool) -> Vec<Row> {
    let mut rows: Vec<Row> = messages
        .iter()
        .map(|message| {
            Row::Line(DisplayLine {
                message_id: message.message_id.clone(),
                sender: message.sender,
                text: content::display_text(message.sender, &message.content).into_owned(),
            })
        })
        .collect();

    if bot_typing {
        rows.push(Row::Typing);
    }
    rows
}
