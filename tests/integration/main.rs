//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises the controller against
//! the scripted board in `mock_hw`.  All tests run on the host (x86_64)
//! with no real hardware required.

mod mock_hw;
