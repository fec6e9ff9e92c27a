//! Configuration files.
//!
//! Configuration documents may be written as JSON or TOML. Both load into
//! the same [`Configuration`](horizon_weave_core::Configuration) model, so
//! reserved keys such as `*type` must be quoted in TOML.
//!
//! ```ignore
//! use horizon_weave::file::{configure_from_file, load_configuration};
//! use horizon_weave::Container;
//!
//! let container = Container::new();
//! configure_from_file(&container, "services.toml")?;
//!
//! let config = load_configuration("services.json")?;
//! assert!(config.has_value("svc1.*type"));
//! ```

mod error;
mod load;

pub use error::{FileError, FileErrorKind, FileResult};
pub use load::{
    configure_from_file, load_configuration, load_configuration_as, parse_configuration,
    render_configuration, save_configuration, to_configuration, ConfigFormat,
};
