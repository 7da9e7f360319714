//! Device facade test suite

mod device_tests;
