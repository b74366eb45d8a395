//! Canvas widgets drawn by the main view.

pub mod pattern_view;
