//! Hierarchical message routing.
//!
//! A container routes a [`Message`] by popping the head of its target path
//! and looking it up among its built named objects. With nothing left of
//! the path the message is delivered to that object's receiver; otherwise
//! it is forwarded to that object's router. A message with an empty target
//! is for the container itself.
//!
//! Routing never builds an object, and the first successful delivery ends
//! the walk.

use std::sync::Arc;

use crate::container::Container;
use crate::message::{Message, MessageParseError};
use crate::object::Object;

/// An object that accepts messages addressed directly to it.
pub trait MessageReceiver: Send + Sync {
    /// Handle a message. Returns `true` if it was handled.
    fn receive_message(&self, message: &Message, sender: Option<&dyn Object>) -> bool;
}

/// An object that forwards messages toward nested targets.
pub trait MessageRouter: Send + Sync {
    /// Route a message. Returns `true` if some receiver handled it.
    fn route_message(&self, message: &Message, sender: Option<&dyn Object>) -> bool;
}

/// Handler for messages addressed to a container itself.
pub type MessageHandler = Arc<dyn Fn(&Message, Option<&dyn Object>) -> bool + Send + Sync>;

impl Container {
    /// Install the handler for messages addressed to this container.
    pub fn set_message_handler<F>(&self, handler: F)
    where
        F: Fn(&Message, Option<&dyn Object>) -> bool + Send + Sync + 'static,
    {
        *self.message_handler.write() = Some(Arc::new(handler));
    }

    /// Remove the installed message handler.
    pub fn clear_message_handler(&self) {
        *self.message_handler.write() = None;
    }

    /// Parse a message in textual form, resolve reference parameters and
    /// route it from this container.
    pub fn post_message(&self, text: &str, sender: Option<&dyn Object>) -> Result<bool, MessageParseError> {
        let message = self.resolve_message(Message::parse(text)?, None);
        Ok(self.route_message(&message, sender))
    }
}

impl MessageReceiver for Container {
    fn receive_message(&self, message: &Message, sender: Option<&dyn Object>) -> bool {
        let handler = self.message_handler.read().clone();
        match handler {
            Some(handler) => handler(message, sender),
            None => false,
        }
    }
}

impl MessageRouter for Container {
    fn route_message(&self, message: &Message, sender: Option<&dyn Object>) -> bool {
        let Some(head) = message.target_head() else {
            tracing::trace!(target: "horizon_weave_core::router", name = message.name(), "delivering to container");
            return self.receive_message(message, sender);
        };

        let target = self.graph.lock().named(head);
        let Some(target) = target else {
            tracing::debug!(target: "horizon_weave_core::router", head, name = message.name(), "no named object for target");
            return false;
        };

        let rest = message.pop_target_head();
        let handled = if rest.has_empty_target() {
            target
                .as_receiver()
                .is_some_and(|receiver| receiver.receive_message(&rest, sender))
        } else {
            target
                .as_router()
                .is_some_and(|router| router.route_message(&rest, sender))
        };
        tracing::trace!(target: "horizon_weave_core::router", head, name = message.name(), handled, "routed message");
        handled
    }
}
