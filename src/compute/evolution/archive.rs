//! Champion archive for storing and reloading trained controllers.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::compute::{ArchitectureError, ControlNetwork};
use crate::schema::{CandidateSnapshot, EvolutionHistory, EvolutionResult, LanderConfig};

/// Export format for a trained controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChampionExport {
    /// Format version.
    pub version: u32,
    /// The winning candidate.
    pub snapshot: CandidateSnapshot,
    /// Environment it was trained in.
    pub environment: LanderConfig,
    /// Per-generation statistics of the run that produced it.
    #[serde(default)]
    pub history: EvolutionHistory,
}

impl ChampionExport {
    pub const VERSION: u32 = 1;

    /// Package the result of a run.
    pub fn from_result(result: &EvolutionResult, environment: &LanderConfig) -> Self {
        Self {
            version: Self::VERSION,
            snapshot: result.best.clone(),
            environment: environment.clone(),
            history: result.history.clone(),
        }
    }

    /// Rebuild the controller, validating tensor shapes against the lander's
    /// observation and action sizes.
    pub fn network(&self) -> Result<ControlNetwork, ArchitectureError> {
        ControlNetwork::for_lander(self.snapshot.genome.clone())
    }
}

/// Save a champion as pretty-printed JSON, creating parent directories.
pub fn save_champion<P: AsRef<Path>>(path: P, export: &ChampionExport) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(export)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(path, json)?;
    log::info!("Saved champion #{} to {}", export.snapshot.id, path.display());
    Ok(())
}

/// Load a champion export from file.
///
/// Files whose genome does not describe a valid network are rejected with
/// `InvalidData`.
pub fn load_champion<P: AsRef<Path>>(path: P) -> io::Result<ChampionExport> {
    let content = fs::read_to_string(path)?;
    let export: ChampionExport = serde_json::from_str(&content)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    export
        .network()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::Architecture;
    use crate::compute::evolution::GenomeRng;
    use crate::schema::{Genome, Matrix};
    use tempfile::tempdir;

    fn test_export() -> ChampionExport {
        let mut rng = GenomeRng::new(42);
        let network = rng.random_network(Architecture::lander(10).unwrap());
        ChampionExport {
            version: ChampionExport::VERSION,
            snapshot: CandidateSnapshot {
                id: 17,
                fitness: 512.5,
                landing_rate: 2.0 / 3.0,
                generation: 9,
                parents: vec![3, 5],
                genome: network.into_genome(),
            },
            environment: LanderConfig::default(),
            history: EvolutionHistory {
                best_fitness: vec![-150.0, 512.5],
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("runs").join("champion.json");

        let export = test_export();
        save_champion(&path, &export).unwrap();
        assert!(path.exists());

        let loaded = load_champion(&path).unwrap();
        assert_eq!(loaded.snapshot.id, 17);
        assert_eq!(loaded.snapshot.genome, export.snapshot.genome);
        assert_eq!(loaded.environment, export.environment);
        assert_eq!(loaded.history.best_fitness, vec![-150.0, 512.5]);
        assert_eq!(
            loaded.network().unwrap().architecture(),
            Architecture::lander(10).unwrap()
        );
    }

    #[test]
    fn test_load_rejects_inconsistent_genome() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");

        let mut export = test_export();
        export.snapshot.genome = Genome {
            b2: Matrix::zeros(1, 2),
            ..export.snapshot.genome
        };
        save_champion(&path, &export).unwrap();

        let err = load_champion(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_load_rejects_non_lander_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wide.json");

        // Internally consistent, but expects 5 inputs instead of 8
        let mut rng = GenomeRng::new(8);
        let mut export = test_export();
        export.snapshot.genome = rng
            .random_network(Architecture::new(5, 10, 4).unwrap())
            .into_genome();
        save_champion(&path, &export).unwrap();

        let err = load_champion(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(export.network().is_err());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_champion(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_champion(dir.path().join("missing.json")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
