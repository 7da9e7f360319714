//! Frame codec test suite

mod codec_tests;
