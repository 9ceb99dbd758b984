use crate::GenomeId;

use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Errors found while validating a configuration
/// or the genomes used to seed a population.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// The species fitness function is not one of
    /// `max`, `min`, `mean` or `median`.
    UnknownSpeciesFitnessFunc(String),
    /// A parameter lies outside of its valid range.
    OutOfRange {
        parameter: &'static str,
        value: f64,
        expected: &'static str,
    },
    /// More seed genomes were supplied than fit in the population.
    TooManySeedGenomes { seeds: usize, size: usize },
    /// A seed genome does not conform to the genetic configuration.
    NonconformingSeedGenome(GenomeId),
}

impl ConfigurationError {
    /// Checks that `value` is a probability in `[0, 1]`.
    ///
    /// # Examples
    /// ```
    /// use evoneat::ConfigurationError;
    ///
    /// assert!(ConfigurationError::check_probability("chance", 0.5).is_ok());
    /// assert!(ConfigurationError::check_probability("chance", 1.5).is_err());
    /// assert!(ConfigurationError::check_probability("chance", f32::NAN).is_err());
    /// ```
    pub fn check_probability(parameter: &'static str, value: f32) -> Result<(), ConfigurationError> {
        if (0.0..=1.0).contains(&value) {
            Ok(())
        } else {
            Err(ConfigurationError::OutOfRange {
                parameter,
                value: value as f64,
                expected: "a probability in [0, 1]",
            })
        }
    }

    /// Checks that `value` is finite and not negative.
    pub fn check_non_negative(parameter: &'static str, value: f32) -> Result<(), ConfigurationError> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(ConfigurationError::OutOfRange {
                parameter,
                value: value as f64,
                expected: "a finite, non-negative number",
            })
        }
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSpeciesFitnessFunc(name) => write!(
                f,
                "unknown species fitness function {:?}, expected one of max, min, mean, median",
                name
            ),
            Self::OutOfRange {
                parameter,
                value,
                expected,
            } => write!(f, "{} = {} is out of range: expected {}", parameter, value, expected),
            Self::TooManySeedGenomes { seeds, size } => write!(
                f,
                "{} seed genomes do not fit in a population of size {}",
                seeds, size
            ),
            Self::NonconformingSeedGenome(id) => write!(
                f,
                "seed genome {} does not conform to the genetic configuration",
                id
            ),
        }
    }
}

impl Error for ConfigurationError {}

/// Reasons why a genome could not be given a fitness value.
///
/// These never abort a run: the affected genome
/// receives the [floor fitness] instead.
///
/// [floor fitness]: crate::FLOOR_FITNESS
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// The evaluator reported a failure.
    Failed(String),
    /// The evaluation did not finish in time.
    TimedOut(Duration),
    /// The evaluator returned NaN, an infinity, or a negative value.
    InvalidFitness(f32),
    /// The evaluator returned no result for the genome.
    Missing,
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "evaluation failed: {}", reason),
            Self::TimedOut(timeout) => write!(f, "evaluation timed out after {:?}", timeout),
            Self::InvalidFitness(value) => write!(f, "invalid fitness value {}", value),
            Self::Missing => write!(f, "evaluator returned no result"),
        }
    }
}

impl Error for EvaluationError {}

/// Errors that abort an evolutionary run.
#[derive(Debug, Clone, PartialEq)]
pub enum EvolutionError {
    Configuration(ConfigurationError),
    /// Every species was removed for stagnation.
    Extinction { generation: usize },
    /// Internal state that should be impossible was observed.
    InvariantViolation(String),
}

impl fmt::Display for EvolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(e) => write!(f, "invalid configuration: {}", e),
            Self::Extinction { generation } => write!(
                f,
                "all species went extinct during generation {}",
                generation
            ),
            Self::InvariantViolation(what) => write!(f, "invariant violated: {}", what),
        }
    }
}

impl Error for EvolutionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Configuration(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigurationError> for EvolutionError {
    fn from(e: ConfigurationError) -> Self {
        EvolutionError::Configuration(e)
    }
}
