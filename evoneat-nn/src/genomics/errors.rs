use crate::Innovation;

use std::error::Error;
use std::fmt;

/// Edits that would leave a genome malformed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StructureError {
    /// A gene with this innovation number already exists.
    /// Holds the endpoints of the rejected gene, if any.
    DuplicateGene(Innovation, Option<(Innovation, Innovation)>),
    /// Another gene already links the same endpoints.
    DuplicateEndpoints(Innovation, (Innovation, Innovation)),
    /// At least one endpoint is not a node of the genome.
    MissingEndpoints(Innovation, Innovation),
    /// Genes may not lead into sensors.
    SensorOutput(Innovation),
    /// A node with this innovation number already exists.
    DuplicateNode(Innovation),
}

/// Structural mutations with nowhere to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MutationError {
    /// Every allowed pair of nodes is already linked.
    FullyConnected,
    /// The allowed attempts ran out before an unlinked pair was found.
    NoViablePair,
    /// There is no enabled gene to split.
    NoEnabledGene,
}

impl fmt::Display for StructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateGene(id, Some((input, output))) => write!(
                f,
                "gene {} ({} -> {}) reuses an existing innovation number",
                id, input, output
            ),
            Self::DuplicateGene(id, None) => {
                write!(f, "gene {} reuses an existing innovation number", id)
            }
            Self::DuplicateEndpoints(id, (input, output)) => write!(
                f,
                "gene {} duplicates the existing link {} -> {}",
                id, input, output
            ),
            Self::MissingEndpoints(input, output) => {
                write!(f, "cannot link {} -> {}: missing endpoint node", input, output)
            }
            Self::SensorOutput(id) => write!(f, "sensor node {} cannot receive genes", id),
            Self::DuplicateNode(id) => write!(f, "node {} already exists", id),
        }
    }
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::FullyConnected => "genome is fully connected",
            Self::NoViablePair => "no unlinked node pair found",
            Self::NoEnabledGene => "genome has no enabled gene to split",
        };
        write!(f, "structural mutation failed: {}", reason)
    }
}

impl Error for StructureError {}
impl Error for MutationError {}
