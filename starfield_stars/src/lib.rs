//! Star instances and the manager that keeps them in step with a record feed.

mod error;
mod manager;
mod record;
mod source;
mod star;
mod style;

pub use error::{StarError, StarsError, TemplateError};
pub use manager::{StarsManager, StarsOptions, TemplateStatus, UpdateReport};
pub use record::{RecordError, RecordIssue, StarRecord, parse_star_feed};
pub use source::{FileTemplateSource, StaticTemplateSource, TemplateSource};
pub use star::{Star, StarSpec};
pub use style::StarStyle;
