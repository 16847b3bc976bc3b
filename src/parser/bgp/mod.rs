mod attributes;

pub use attributes::{parse_as_path, parse_attributes};
