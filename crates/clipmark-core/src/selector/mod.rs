//! CSS selectors: parsing, matching, escaping, and building stable selectors
//! for nodes.

pub mod builder;
pub mod escape;
pub mod matcher;
pub mod parser;
pub mod resolver;

pub use builder::{build_selector, node_selector};
pub use escape::css_escape;
pub use parser::{SelectorError, SelectorList, parse_selector};
pub use resolver::SelectorResolver;
