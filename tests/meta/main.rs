//! Repository checks on the test suite itself
