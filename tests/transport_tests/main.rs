//! Transport test suite
