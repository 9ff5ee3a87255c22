pub mod collector;
pub mod graph;
pub mod options;
pub mod template;
pub mod toggles;
pub mod workspace;

pub use options::{CustomOptions, OptionScope, SetupReport};
pub use workspace::TemplateWorkspace;
