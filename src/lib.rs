//! ruff2bitbucket - publish ruff findings to Bitbucket Server code insights
//!
//! Runs `ruff check` and `ruff format --check` on a checkout, turns the
//! output into a code-insights report plus per-line annotations, and PUTs
//! both to the Bitbucket Server REST API using the first credential the
//! server accepts.

pub mod bitbucket;
pub mod cli;
pub mod credentials;
pub mod git;
pub mod linter;

#[cfg(test)]
pub(crate) mod test_support;
