mod caching;
mod common;
mod concurrency;
mod determinism;
mod errors;
mod properties;
mod routing;
