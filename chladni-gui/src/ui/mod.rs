//! # UI Module
//!
//! Layout of the ChladniSketch window.

pub mod main_display;
