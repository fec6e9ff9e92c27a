//! Prelude module for Horizon Weave.
//!
//! This module re-exports the most commonly used types for convenient importing:
//!
//! ```ignore
//! use horizon_weave::prelude::*;
//! ```

// ============================================================================
// Container
// ============================================================================

pub use crate::{BuildState, Container, Context};

// ============================================================================
// Object System
// ============================================================================

pub use crate::Object;
pub use crate::{object_arc_cast, object_cast, same_object, ObjectId, ObjectRef};
pub use crate::{ClassEntry, Property, Signal};

// ============================================================================
// Configuration
// ============================================================================

pub use crate::{Configurable, Configuration, Configurer, ObjectFactory};
pub use crate::{FromPropertyValue, PropertyValue};
pub use crate::file::{configure_from_file, load_configuration};

// ============================================================================
// Lifecycle and Messaging
// ============================================================================

pub use crate::{ContainerAware, ContextAware, Service};
pub use crate::{Message, MessageReceiver, MessageRouter};

// ============================================================================
// Errors
// ============================================================================

pub use crate::{PropertyError, PropertyResult, ServiceError, ServiceResult, WeaveError};
