use tetrabot_harness::EpisodeError;
use tetrabot_policy::NetworkBuildError;

use crate::{checkpoint::PersistError, genome::GenomeId};

/// Failure of a training run; `E` is the environment's error type.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum TrainingError<E> {
    /// The genomes were built for a different state width than the
    /// environment produces.
    #[display("genomes take {found} inputs but the environment produces {expected}")]
    StateSize { expected: usize, found: usize },
    #[display("genome {id} does not decode into a network")]
    Network {
        id: GenomeId,
        source: NetworkBuildError,
    },
    #[display("evaluation episode failed")]
    #[from]
    Episode(EpisodeError<E>),
    #[display("failed to save training state")]
    #[from]
    Persist(PersistError),
}

#[cfg(test)]
mod tests {
    use std::{error::Error as _, fmt, path::PathBuf};

    use tetrabot_harness::{SelectionMismatch, StateVector};

    use super::*;

    #[test]
    fn messages_and_sources() {
        let error = TrainingError::<fmt::Error>::StateSize {
            expected: 4,
            found: 5,
        };
        assert_eq!(
            error.to_string(),
            "genomes take 5 inputs but the environment produces 4"
        );
        assert!(error.source().is_none());

        let episode = EpisodeError::<fmt::Error>::from(SelectionMismatch {
            candidates: 1,
            chosen: StateVector::from([0.5]),
        });
        let error = TrainingError::from(episode);
        assert!(matches!(error, TrainingError::Episode(_)));
        assert_eq!(error.to_string(), "evaluation episode failed");
        assert_eq!(
            error.source().map(ToString::to_string).as_deref(),
            Some("policy selection could not be mapped to an action")
        );

        let persist = crate::Checkpoint::load(PathBuf::from("/nonexistent/ckpt-1.json"))
            .expect_err("missing checkpoint must fail");
        let error = TrainingError::<fmt::Error>::from(persist);
        assert!(matches!(error, TrainingError::Persist(_)));
        assert!(error.source().is_some());
    }
}
