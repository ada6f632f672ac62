//! Integration tests of clustermon live in `tests/`.
