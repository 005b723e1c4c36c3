pub mod authz;
pub mod events;
pub mod extractor;
pub mod jwt;
pub mod test_utils;
