// baton/src/core/keys.rs

//! Conventional item keys shared by independently written steps.
//! The engine itself never reads or writes them.

pub const INPUT_STREAM: &str = "InputStream";
pub const OUTPUT_STREAM: &str = "OutputStream";
pub const INPUT_OBJECT: &str = "InputObject";
pub const OUTPUT_OBJECT: &str = "OutputObject";
pub const STATUS_CODE: &str = "StatusCode";
pub const REQUEST_HEADERS: &str = "RequestHeaders";
pub const RESPONSE_HEADERS: &str = "ResponseHeaders";
