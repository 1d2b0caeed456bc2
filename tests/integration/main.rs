//! Integration tests against a loopback HR server stub.

mod helpers;

mod auth_test;
mod heartbeat_test;
mod permission_test;
