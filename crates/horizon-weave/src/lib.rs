//! Horizon Weave - a declarative object-graph builder.
//!
//! Named objects are described in a configuration document, built on first
//! use, wired together through `named:`, `make:` and `post:` references and
//! then started as services. Messages are routed between them by name path.
//!
//! This is the umbrella crate that re-exports all public APIs.
//!
//! # Example
//!
//! ```
//! use horizon_weave::prelude::*;
//!
//! #[derive(Object, Default)]
//! #[object(receiver)]
//! struct Counter {
//!     #[property]
//!     step: Property<i64>,
//!     total: Property<i64>,
//! }
//!
//! impl MessageReceiver for Counter {
//!     fn receive_message(&self, message: &Message, _sender: Option<&dyn Object>) -> bool {
//!         if !message.has_name("bump") {
//!             return false;
//!         }
//!         let step = self.step.get();
//!         self.total.set_silent(self.total.get() + step);
//!         true
//!     }
//! }
//!
//! let container = Container::new();
//! container.register_type("counter", Counter::class_entry());
//! container.configure_with_data(serde_json::json!({
//!     "counter": {"*type": "counter", "step": 2}
//! }));
//!
//! assert_eq!(container.post_message("counter@bump", None), Ok(true));
//! let counter = container.get_named("counter").and_then(object_arc_cast::<Counter>).unwrap();
//! assert_eq!(counter.total.get(), 2);
//! ```

pub use horizon_weave_core::*;
pub use horizon_weave_macros::*;

pub mod file;
pub mod prelude;
