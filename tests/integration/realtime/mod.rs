//! WebSocket subscription tests against a live listener

mod subscription_test;
