use super::*;

mod cancellation;
mod download;
mod resolve;
mod resume;
