//! Logging and debugging facilities for Horizon Weave.
//!
//! This module provides:
//! - Integration with the `tracing` crate for structured logging
//! - Debug visualization for a container's object graph
//! - Performance tracing hooks for profiling
//!
//! # Tracing Integration
//!
//! Horizon Weave uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("horizon_weave_core::builder=debug")
//!         .init();
//! }
//! ```
//!
//! # Debug Visualization
//!
//! Use [`ObjectTreeDebug`] to see which objects a container built and which
//! named object's configuration created each nested one:
//!
//! ```ignore
//! use horizon_weave_core::logging::ObjectTreeDebug;
//!
//! let tree = container.with_graph(|graph| ObjectTreeDebug::new().format_all(graph));
//! println!("{tree}");
//! ```

use std::fmt::Write as FmtWrite;

use crate::object::{ObjectId, ObjectRegistry};

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "horizon_weave_core";
    /// Container orchestration and named-object registry.
    pub const CONTAINER: &str = "horizon_weave_core::container";
    /// Object instantiation and property configuration.
    pub const BUILDER: &str = "horizon_weave_core::builder";
    /// Deferred references and cycle handling.
    pub const PENDING: &str = "horizon_weave_core::pending";
    /// Service start/stop.
    pub const LIFECYCLE: &str = "horizon_weave_core::lifecycle";
    /// Message routing.
    pub const ROUTER: &str = "horizon_weave_core::router";
    /// Configuration and type registry.
    pub const CONFIG: &str = "horizon_weave_core::config";
    /// Signal emission.
    pub const SIGNAL: &str = "horizon_weave_core::signal";
}

/// Style options for object tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact single-line representation.
    Compact,
}

/// Configuration for object tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show object IDs.
    pub show_ids: bool,
    /// Whether to show type names.
    pub show_types: bool,
    /// Whether to show configurable property names.
    pub show_properties: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_types: true,
            show_properties: false,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_properties: true,
            ..Default::default()
        }
    }

    /// Create options for minimal output.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_types: false,
            show_properties: false,
            ..Default::default()
        }
    }
}

/// Debug utility for visualizing a container's object graph.
///
/// Roots are the objects no other object's configuration created; children
/// are the nested objects built while configuring their owner.
#[derive(Debug, Clone, Default)]
pub struct ObjectTreeDebug {
    options: TreeFormatOptions,
}

impl ObjectTreeDebug {
    /// Create a new debug visualizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a debug visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format every object in the registry.
    pub fn format_all(&self, registry: &ObjectRegistry) -> String {
        let roots = registry.root_objects();

        let mut output = String::new();
        let _ = writeln!(output, "Object Tree ({} total objects):", registry.object_count());

        if roots.is_empty() {
            output.push_str("  (empty)\n");
        } else {
            let root_count = roots.len();
            for (i, root_id) in roots.into_iter().enumerate() {
                self.format_subtree_into(registry, root_id, 0, i + 1 == root_count, &mut output);
            }
        }
        output
    }

    /// Format a subtree starting from a specific object.
    pub fn format_subtree(&self, registry: &ObjectRegistry, root: ObjectId) -> String {
        let mut output = String::new();
        self.format_subtree_into(registry, root, 0, true, &mut output);
        output
    }

    fn format_subtree_into(
        &self,
        registry: &ObjectRegistry,
        id: ObjectId,
        depth: usize,
        is_last: bool,
        output: &mut String,
    ) {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return;
        }
        let Some(object) = registry.get(id) else {
            return;
        };

        output.push_str(&self.build_prefix(depth, is_last));
        output.push_str(registry.name_of(id).unwrap_or("(anonymous)"));

        if self.options.show_ids {
            let _ = write!(output, " [{id:?}]");
        }

        if self.options.show_types {
            let type_name = object.type_name();
            let short_type = type_name.rsplit("::").next().unwrap_or(type_name);
            let _ = write!(output, " ({short_type})");
        }

        output.push('\n');

        if self.options.show_properties {
            let prop_prefix = self.build_property_prefix(depth);
            for prop_name in object.property_names() {
                let _ = writeln!(output, "{prop_prefix}  .{prop_name}");
            }
        }

        let children = registry.children(id);
        let child_count = children.len();
        for (i, child_id) in children.iter().enumerate() {
            self.format_subtree_into(registry, *child_id, depth + 1, i + 1 == child_count, output);
        }
    }

    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, corner, last) = match self.options.style {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500}", "\u{2514}\u{2500}\u{2500}"),
            TreeStyle::Compact => ("", "-", "-"),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            prefix.push_str(&" ".repeat(self.options.indent_size));
        }
        prefix.push_str(if is_last { last } else { corner });
        prefix.push(' ');
        prefix
    }

    fn build_property_prefix(&self, depth: usize) -> String {
        let branch = match self.options.style {
            TreeStyle::Ascii => "|",
            TreeStyle::Unicode => "\u{2502}",
            TreeStyle::Compact => "",
        };
        let mut prefix = String::new();
        for _ in 0..depth {
            prefix.push_str(branch);
            prefix.push_str(&" ".repeat(self.options.indent_size));
        }
        prefix
    }
}

/// A guard that keeps a tracing span entered until dropped.
///
/// This is useful for tracking the duration of operations.
#[derive(Debug)]
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "horizon_weave::perf", "perf", operation = name);
        Self {
            _span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Object;
    use std::sync::Arc;

    struct Window;
    impl Object for Window {
        fn property_names(&self) -> &'static [&'static str] {
            &["title"]
        }
    }

    struct Button;
    impl Object for Button {}

    fn sample() -> (ObjectRegistry, ObjectId) {
        let mut registry = ObjectRegistry::new();
        let window = registry.register(Arc::new(Window), None);
        registry.bind_name("window", window);
        registry.register(Arc::new(Button), Some(window));
        registry.register(Arc::new(Button), Some(window));
        (registry, window)
    }

    #[test]
    fn test_tree_format_empty() {
        let output = ObjectTreeDebug::new().format_all(&ObjectRegistry::new());
        assert!(output.contains("Object Tree (0 total objects)"));
        assert!(output.contains("(empty)"));
    }

    #[test]
    fn test_tree_format_hierarchy() {
        let (registry, window) = sample();
        let output = ObjectTreeDebug::new().format_subtree(&registry, window);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("window ["));
        assert!(lines[0].ends_with("(Window)"));
        assert!(lines[1].starts_with("\u{251c}\u{2500}\u{2500} (anonymous)"));
        assert!(lines[2].starts_with("\u{2514}\u{2500}\u{2500} (anonymous)"));
    }

    #[test]
    fn test_tree_format_minimal_with_depth() {
        let (registry, _) = sample();
        let options = TreeFormatOptions {
            max_depth: Some(0),
            style: TreeStyle::Ascii,
            ..TreeFormatOptions::minimal()
        };
        let output = ObjectTreeDebug::with_options(options).format_all(&registry);
        assert!(output.contains("window\n"));
        assert!(!output.contains("(anonymous)"));
        assert!(!output.contains("Window)"));
    }

    #[test]
    fn test_tree_format_properties() {
        let (registry, window) = sample();
        let output = ObjectTreeDebug::with_options(TreeFormatOptions::detailed())
            .format_subtree(&registry, window);
        assert!(output.contains("  .title"));
    }

    #[test]
    fn test_targets_match_module_paths() {
        assert_eq!(targets::CORE, module_path!().trim_end_matches("::logging"));
        for target in [targets::CONTAINER, targets::BUILDER, targets::PENDING, targets::ROUTER] {
            assert!(target.starts_with(targets::CORE));
        }
    }

    #[test]
    fn test_perf_span() {
        let _span = PerfSpan::new("test_operation");
    }
}
