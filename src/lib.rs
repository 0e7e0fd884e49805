//! Sound Annotator
//!
//! Walks a folder of audio files and records, for each one, an "entire"
//! region and a "point" region inside it. Decisions are kept in a persistent
//! processing log so an interrupted session resumes where it stopped.

pub mod annotation;
pub mod app;
pub mod cli;
pub mod config;
pub mod library;
pub mod paths;
pub mod queue;
pub mod sink;
pub mod state;
pub mod transport;
