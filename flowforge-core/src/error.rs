//! Error types for topology loading and artifact generation

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ForgeError>;

#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("{side} endpoint could not be resolved: {kind} {name}")]
    EndpointNotResolved {
        side: &'static str,
        kind: String,
        name: String,
    },

    #[error("Failed to load topology from {path}: {source}")]
    TopologyLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse topology: {0}")]
    TopologyParse(#[from] serde_json::Error),

    #[error("Failed to save topology to {path}: {source}")]
    TopologySave {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Generator prerequisites not met: {missing}")]
    PrerequisitesMissing { missing: String },

    #[error("{field} must be set")]
    MissingField { field: &'static str },

    #[error("Unknown VLAN: {vlan}")]
    UnknownVlan { vlan: String },

    #[error("Unknown service: {service}")]
    UnknownService { service: String },

    #[error("Duplicate {kind} key: {key}")]
    DuplicateKey { kind: &'static str, key: String },

    #[error("VLAN {vlan} has more than one scope for {env_tag}/{zone_tag}")]
    DuplicateScope {
        vlan: String,
        env_tag: String,
        zone_tag: String,
    },

    #[error("Invalid endpoint: {value} (expected server:<name> or vlan:<name>)")]
    InvalidEndpoint { value: String },

    #[error("Invalid protocol: {proto}")]
    InvalidProtocol { proto: String },
}
