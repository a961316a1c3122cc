//! Rendering of finalized pages to JSON.

mod json;
mod result;

pub use json::{page_to_value, to_json, value_to_string, JsonFormat, DATA_FORMAT_VERSION};
pub use result::{ConversionStats, RenderResult};
