//! Test suite for xfcanvas
//!
//! This module organizes all tests

pub mod integration;
pub mod property;
