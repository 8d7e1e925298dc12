use std::sync::Mutex;

use async_trait::async_trait;

use crate::ports::{
    ButtonLayout, Callback, DeliveryError, NotificationPort, OutboundMessage, RecipientId,
};

use super::output::{self, MessageKind};

/// Prints outbound messages and numbers their buttons so the shell can turn
/// `#N` back into the callback.
#[derive(Debug, Default)]
pub struct ConsolePort {
    buttons: Mutex<Vec<Callback>>,
}

impl ConsolePort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback behind button `number` (1-based) of the latest layout.
    pub fn button(&self, number: usize) -> Option<Callback> {
        let buttons = self.buttons.lock().ok()?;
        number
            .checked_sub(1)
            .and_then(|idx| buttons.get(idx))
            .cloned()
    }

    fn remember(&self, layout: &ButtonLayout) {
        let callbacks = layout.buttons().map(|button| button.callback.clone()).collect();
        match self.buttons.lock() {
            Ok(mut buttons) => *buttons = callbacks,
            Err(poisoned) => *poisoned.into_inner() = callbacks,
        }
    }

    /// Console rendering of one message: the text, then one line per row of
    /// buttons numbered across the whole layout.
    pub fn render(recipient: RecipientId, message: &OutboundMessage) -> String {
        let kind = match recipient {
            RecipientId::Conversation(_) => MessageKind::Reply,
            RecipientId::User(_) => MessageKind::Notification,
        };
        let mut lines = vec![output::style(kind, &message.text)];
        if let Some(layout) = &message.layout {
            let mut number = 0;
            for row in &layout.rows {
                let cells: Vec<String> = row
                    .iter()
                    .map(|button| {
                        number += 1;
                        format!("[#{}] {}", number, button.label)
                    })
                    .collect();
                lines.push(output::style(MessageKind::Buttons, cells.join("   ")));
            }
        }
        lines.join("\n")
    }
}

#[async_trait]
impl NotificationPort for ConsolePort {
    async fn send(
        &self,
        recipient: RecipientId,
        message: OutboundMessage,
    ) -> Result<(), DeliveryError> {
        if let Some(layout) = &message.layout {
            self.remember(layout);
        }
        println!("{}", Self::render(recipient, &message));
        Ok(())
    }

    async fn send_document(
        &self,
        _recipient: RecipientId,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), DeliveryError> {
        output::info(format!("document {} ({} bytes)", file_name, bytes.len()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OwnerId, TenantId};
    use crate::ports::{Button, MenuAction};

    fn layout() -> ButtonLayout {
        ButtonLayout::new()
            .row(vec![
                Button::new(
                    "Lend",
                    Callback::Menu {
                        action: MenuAction::Lend,
                    },
                ),
                Button::new(
                    "Borrow",
                    Callback::Menu {
                        action: MenuAction::Borrow,
                    },
                ),
            ])
            .single(Button::new("Back to menu", Callback::BackToMenu))
    }

    #[test]
    fn buttons_are_numbered_across_rows() {
        colored::control::set_override(false);
        let message = OutboundMessage::text("Pick one").with_layout(layout());
        let rendered = ConsolePort::render(RecipientId::from(TenantId(1)), &message);
        assert_eq!(
            rendered,
            "Pick one\n[#1] Lend   [#2] Borrow\n[#3] Back to menu"
        );
    }

    #[tokio::test]
    async fn latest_layout_backs_button_numbers() {
        let console = ConsolePort::new();
        let message = OutboundMessage::text("Pick one").with_layout(layout());
        console.send(RecipientId::from(TenantId(1)), message).await.unwrap();
        assert_eq!(console.button(3), Some(Callback::BackToMenu));
        assert_eq!(console.button(0), None);
        assert_eq!(console.button(4), None);

        // notifications without buttons keep the previous numbering
        let reminder = OutboundMessage::text("Reminder");
        console.send(RecipientId::from(OwnerId(1)), reminder).await.unwrap();
        assert_eq!(console.button(3), Some(Callback::BackToMenu));
    }
}
