//! Test Helper Utilities
//!
//! Shared utilities for testing vcd-detect
#![allow(dead_code)]

pub mod audio_generator;
pub mod fakes;

pub use audio_generator::{generate_test_wav, AudioConfig};
pub use fakes::{
    pipeline_with, test_settings, AcquirerMode, CountingClassifier, FailingClassifier,
    FakeAcquirer, FakeIsolator, IsolatorMode,
};
