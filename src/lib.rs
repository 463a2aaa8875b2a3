//! Learning Lab - lessons, quizzes and a lesson chatbot
//!
//! This library provides the HTTP API, storage and the text transforms
//! (markdown preview, answer extraction, autocomplete) behind Learning Lab.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
