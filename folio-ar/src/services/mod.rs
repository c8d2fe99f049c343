//! Archival services

pub mod archive_client;
pub mod concept_mapper;
pub mod controller;
pub mod dispatcher;
pub mod reconciler;
pub mod vocab_client;
pub mod worker;
