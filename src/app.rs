use camino::Utf8PathBuf;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::domain::{QueryKind, Record};
use crate::error::CensusError;
use crate::index::RelationshipIndex;
use crate::metadata::{MetadataClient, fetch_documents};
use crate::query::{
    self, Extinction, Fertility, GENERATION_LEADERBOARD_LIMIT, GenerationPopulation, HealthRisk,
    LEADERBOARD_LIMIT, OneOfOne,
};
use crate::reconcile::{IdRange, missing_ids, normalize_documents, reconcile};
use crate::snapshot::write_snapshot;
use crate::supply::SupplyClient;

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotResult {
    pub path: String,
    pub bound: u64,
    pub records: usize,
    pub missing: Vec<u64>,
}

pub struct App<M: MetadataClient> {
    metadata: M,
    snapshot_dir: Utf8PathBuf,
}

impl<M: MetadataClient> App<M> {
    pub fn new(metadata: M, snapshot_dir: Utf8PathBuf) -> Self {
        Self {
            metadata,
            snapshot_dir,
        }
    }

    /// Snapshot of every token from 0 through `end_id`.
    pub fn snapshot_through(&self, end_id: u64, date: NaiveDate) -> Result<SnapshotResult, CensusError> {
        self.snapshot(IdRange::through(end_id), date)
    }

    /// Snapshot of every token below the collection's current total supply.
    pub fn snapshot_supply<S: SupplyClient>(
        &self,
        supply: &S,
        date: NaiveDate,
    ) -> Result<SnapshotResult, CensusError> {
        let total = supply.total_supply()?;
        info!(total_supply = total, "total supply resolved");
        self.snapshot(IdRange::below(total), date)
    }

    /// Bulk fetch, one targeted re-fetch of the gaps, then write.
    pub fn snapshot(&self, range: IdRange, date: NaiveDate) -> Result<SnapshotResult, CensusError> {
        let ids: Vec<u64> = range.ids().collect();
        info!(count = ids.len(), bound = range.bound(), "fetching metadata");
        let documents = fetch_documents(&self.metadata, &ids);
        let records = normalize_documents(&documents)?;

        let records = reconcile(&self.metadata, range, records)?;
        let missing = missing_ids(range, &records);
        let count = records.len();
        let path = write_snapshot(&self.snapshot_dir, date, range.bound(), records)?;

        Ok(SnapshotResult {
            path: path.to_string(),
            bound: range.bound(),
            records: count,
            missing,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub watch_list: Vec<u64>,
    pub lineage_checks: Vec<u64>,
    pub focus_generation: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "query", content = "result", rename_all = "kebab-case")]
pub enum QueryOutcome<'a> {
    Population(Vec<GenerationPopulation>),
    HealthRisk(HealthRisk<'a>),
    MitosisLeaderboard(Vec<&'a Record>),
    BodyTypesByGen {
        generation: String,
        bodies: Vec<String>,
    },
    Extinction(Extinction),
    DeFactoRarity(Vec<OneOfOne<'a>>),
    Rarity(Vec<OneOfOne<'a>>),
    Fertility(Fertility<'a>),
    FertilityByGen {
        generation: String,
        ranking: Fertility<'a>,
    },
}

/// A loaded snapshot with its relationship index.
pub struct Analyzer<'a> {
    records: &'a [Record],
    index: RelationshipIndex<'a>,
}

impl<'a> Analyzer<'a> {
    pub fn new(records: &'a [Record]) -> Self {
        Self {
            records,
            index: RelationshipIndex::build(records),
        }
    }

    pub fn index(&self) -> &RelationshipIndex<'a> {
        &self.index
    }

    pub fn run(&self, kind: QueryKind, options: &AnalyzeOptions) -> QueryOutcome<'a> {
        let index = &self.index;
        match kind {
            QueryKind::Population => QueryOutcome::Population(query::population_distribution(index)),
            QueryKind::HealthRisk => {
                QueryOutcome::HealthRisk(query::health_risk(self.records, &options.watch_list))
            }
            QueryKind::MitosisLeaderboard => QueryOutcome::MitosisLeaderboard(
                query::top_mitosis_credits(self.records, LEADERBOARD_LIMIT),
            ),
            QueryKind::BodyTypesByGen => QueryOutcome::BodyTypesByGen {
                generation: options.focus_generation.clone(),
                bodies: query::body_types_by_generation(index, &options.focus_generation),
            },
            QueryKind::Extinction => {
                QueryOutcome::Extinction(query::extinct_body_types(index, &options.lineage_checks))
            }
            QueryKind::DeFactoRarity => QueryOutcome::DeFactoRarity(query::de_facto_one_of_ones(index)),
            QueryKind::Rarity => QueryOutcome::Rarity(query::one_of_ones(index)),
            QueryKind::Fertility => {
                QueryOutcome::Fertility(query::fertility(self.records, index, LEADERBOARD_LIMIT))
            }
            QueryKind::FertilityByGen => QueryOutcome::FertilityByGen {
                generation: options.focus_generation.clone(),
                ranking: query::fertility_by_generation(
                    index,
                    &options.focus_generation,
                    GENERATION_LEADERBOARD_LIMIT,
                ),
            },
        }
    }
}
