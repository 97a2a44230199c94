//! Stability-gated, depth-correlated frame correction pipeline.
//!
//! This library decides, per captured camera frame, whether the scene has
//! settled enough to trust for recognition, and extracts perspective-
//! corrected rectangular regions (book spines, covers) from skewed
//! quadrilaterals, optionally locating them in a depth map while cropping
//! from the color image.
//!
//! The per-frame path is one-directional:
//!
//! 1. [`stability`] gates on a sliding window of frame-to-frame
//!    translation estimates from a [`registration`] estimator
//! 2. [`depth`] packages the color image with its depth plane, converting
//!    between raw sensor buffers and float depth images on demand
//! 3. [`quad`] and [`deskew`] turn a detector-reported or user-adjusted
//!    quadrilateral into an axis-aligned crop
//! 4. [`pipeline`] orchestrates admission, busy-guarding and background
//!    dispatch to an external [`recognizer::Recognizer`]

pub mod cli;
pub mod config;
pub mod depth;
pub mod deskew;
pub mod error;
pub mod hunt;
pub mod image;
pub mod pipeline;
pub mod progress;
pub mod quad;
pub mod recognizer;
pub mod registration;
pub mod stability;
