//! Message formatting utilities for client display.

use beacon_server::domain::{ActivityEvent, ActivityKind, Message, MessageCategory};
use beacon_shared::time::to_rfc3339_utc;

use crate::status::{ConnectionStatus, SessionState};

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a received message
    ///
    /// # Arguments
    ///
    /// * `message` - The received message
    ///
    /// # Returns
    ///
    /// A formatted string with category, content and timestamp
    pub fn format_message(message: &Message) -> String {
        format!(
            "\n\n------------------------------------------------------------\n\
             [{}] {} {}\n\
             sent at {}\n\
             ------------------------------------------------------------\n",
            category_icon(message.category),
            message.category.as_str().to_uppercase(),
            message.content.as_str(),
            to_rfc3339_utc(&message.timestamp.value())
        )
    }

    /// Format a user-activity notification
    pub fn format_activity(activity: &ActivityEvent) -> String {
        let marker = match activity.kind {
            ActivityKind::Connected | ActivityKind::Joined => '+',
            ActivityKind::Disconnected | ActivityKind::Left => '-',
        };
        format!(
            "\n{} {} ({})\n",
            marker,
            activity.description,
            to_rfc3339_utc(&activity.timestamp.value())
        )
    }

    /// Format the connection status record
    pub fn format_status(status: &ConnectionStatus) -> String {
        let mut output = format!("\nStatus: {}\n", status.state);
        if let Some(id) = &status.connection_id {
            output.push_str(&format!("Connection ID: {}\n", id));
        }
        if status.state == SessionState::Reconnecting {
            output.push_str(&format!(
                "Failed reconnect attempts: {}\n",
                status.reconnect_attempts
            ));
        }
        if let Some(last_activity) = &status.last_activity {
            output.push_str(&format!("Last activity: {}\n", to_rfc3339_utc(last_activity)));
        }
        output
    }

    /// Format the local message buffer
    pub fn format_message_list(messages: &[Message]) -> String {
        let mut output = String::new();
        output.push_str("\n============================================================\n");
        output.push_str(&format!("Messages ({}):\n", messages.len()));

        if messages.is_empty() {
            output.push_str("(No messages)\n");
        } else {
            for message in messages {
                output.push_str(&format!(
                    "{} [{}] {}\n",
                    to_rfc3339_utc(&message.timestamp.value()),
                    message.category,
                    message.content.as_str()
                ));
            }
        }

        output.push_str("============================================================\n");
        output
    }

    pub fn format_help() -> String {
        "\nCommands:\n  \
         /join <group>   join a group\n  \
         /leave <group>  leave a group\n  \
         /status         show connection status\n  \
         /messages       list buffered messages\n  \
         /clear          clear buffered messages\n  \
         /quit           disconnect and exit\n"
            .to_string()
    }
}

fn category_icon(category: MessageCategory) -> &'static str {
    match category {
        MessageCategory::Info => "i",
        MessageCategory::Warning => "!",
        MessageCategory::Success => "✓",
        MessageCategory::Error => "x",
    }
}
