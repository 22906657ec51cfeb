pub mod base64_bytes;
pub mod logging;
#[cfg(test)]
pub mod test_utils;
pub mod url;
