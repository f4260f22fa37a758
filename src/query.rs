//! Read-only queries over a loaded snapshot.

use serde::Serialize;

use crate::domain::Record;
use crate::index::{RelationshipIndex, group_by_body};
use crate::lineage::{has_living_descendant, is_effectively_alive};

pub const LEADERBOARD_LIMIT: usize = 24;
pub const GENERATION_LEADERBOARD_LIMIT: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationPopulation {
    pub generation: String,
    pub alive: usize,
    pub dead: usize,
    pub total: usize,
    pub percent_alive: u32,
}

pub fn population_distribution(index: &RelationshipIndex<'_>) -> Vec<GenerationPopulation> {
    index
        .by_generation
        .iter()
        .map(|(generation, members)| {
            let dead = members.iter().filter(|record| record.is_deceased()).count();
            let total = members.len();
            let alive = total - dead;
            GenerationPopulation {
                generation: generation.to_string(),
                alive,
                dead,
                total,
                percent_alive: percent(alive, total),
            }
        })
        .collect()
}

fn percent(part: usize, total: usize) -> u32 {
    if part == 0 || total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round() as u32
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthRisk<'a> {
    pub unburied_dead: Vec<&'a Record>,
    pub almost_dead: Vec<&'a Record>,
    pub almost_maybe_dead: Vec<&'a Record>,
    /// Watch-list tokens found in any bucket.
    pub watch_alerts: Vec<&'a Record>,
}

pub fn is_unburied_dead(record: &Record) -> bool {
    record.health.as_deref() == Some("0") && record.is_buried.as_deref() == Some("false")
}

pub fn is_almost_dead(record: &Record) -> bool {
    matches!(record.health_value(), Some(health) if health > 0 && health < 7)
}

pub fn is_almost_maybe_dead(record: &Record) -> bool {
    matches!(record.health_value(), Some(health) if health > 6 && health < 11)
}

pub fn health_risk<'a>(records: &'a [Record], watch_list: &[u64]) -> HealthRisk<'a> {
    let mut unburied_dead: Vec<&Record> = records.iter().filter(|r| is_unburied_dead(r)).collect();
    unburied_dead.sort_by_key(|record| {
        let generation = record.generation_value();
        (generation.is_none(), generation)
    });
    let almost_dead: Vec<&Record> = records.iter().filter(|r| is_almost_dead(r)).collect();
    let almost_maybe_dead: Vec<&Record> =
        records.iter().filter(|r| is_almost_maybe_dead(r)).collect();

    let watch_alerts = almost_maybe_dead
        .iter()
        .chain(&almost_dead)
        .chain(&unburied_dead)
        .filter(|record| watch_list.contains(&record.token_id))
        .copied()
        .collect();

    HealthRisk {
        unburied_dead,
        almost_dead,
        almost_maybe_dead,
        watch_alerts,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OneOfOne<'a> {
    pub body: String,
    pub record: &'a Record,
}

/// Body types held by exactly one record, dead or alive.
pub fn one_of_ones<'a>(index: &RelationshipIndex<'a>) -> Vec<OneOfOne<'a>> {
    index
        .by_body
        .iter()
        .filter_map(|(body, members)| match members {
            [only] => Some(OneOfOne {
                body: body.to_string(),
                record: *only,
            }),
            _ => None,
        })
        .collect()
}

fn effective_members<'a>(index: &RelationshipIndex<'a>, members: &[&'a Record]) -> Vec<&'a Record> {
    members
        .iter()
        .copied()
        .filter(|record| is_effectively_alive(index, record))
        .collect()
}

/// Body types held by several records of which only one is still a living
/// representative (alive, or dead with a living descendant). Natural
/// one-of-ones are left to [`one_of_ones`].
pub fn de_facto_one_of_ones<'a>(index: &RelationshipIndex<'a>) -> Vec<OneOfOne<'a>> {
    index
        .by_body
        .iter()
        .filter(|(_, members)| members.len() > 1)
        .filter_map(|(body, members)| match effective_members(index, members).as_slice() {
            [only] => Some(OneOfOne {
                body: body.to_string(),
                record: *only,
            }),
            _ => None,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineageCheck {
    pub token_id: u64,
    pub has_living_descendant: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extinction {
    pub extinct: Vec<String>,
    pub checks: Vec<LineageCheck>,
}

/// Body types with no living representative and no living descendant of one.
pub fn extinct_body_types(index: &RelationshipIndex<'_>, checks: &[u64]) -> Extinction {
    let extinct = index
        .by_body
        .iter()
        .filter(|(_, members)| effective_members(index, members).is_empty())
        .map(|(body, _)| body.to_string())
        .collect();
    let checks = checks
        .iter()
        .map(|&token_id| LineageCheck {
            token_id,
            has_living_descendant: has_living_descendant(index, token_id),
        })
        .collect();
    Extinction { extinct, checks }
}

#[derive(Debug, Clone, Serialize)]
pub struct OffspringRank<'a> {
    pub record: &'a Record,
    pub offspring: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Fertility<'a> {
    pub by_offspring: Vec<OffspringRank<'a>>,
    pub by_credits: Vec<&'a Record>,
}

pub fn fertility<'a, I>(members: I, index: &RelationshipIndex<'a>, limit: usize) -> Fertility<'a>
where
    I: IntoIterator<Item = &'a Record>,
{
    let members: Vec<&'a Record> = members.into_iter().collect();

    let mut by_offspring: Vec<OffspringRank<'a>> = members
        .iter()
        .map(|&record| OffspringRank {
            record,
            offspring: index.children_of(record.token_id).len(),
        })
        .filter(|rank| rank.offspring > 0)
        .collect();
    by_offspring.sort_by(|a, b| b.offspring.cmp(&a.offspring));
    by_offspring.truncate(limit);

    let mut by_credits: Vec<&'a Record> = members
        .into_iter()
        .filter(|record| matches!(record.mitosis_credits_value(), Some(credits) if credits != 0))
        .collect();
    by_credits.sort_by(|a, b| b.mitosis_credits_value().cmp(&a.mitosis_credits_value()));
    by_credits.truncate(limit);

    Fertility {
        by_offspring,
        by_credits,
    }
}

/// Fertility rankings restricted to one generation; an unknown generation
/// ranks nothing.
pub fn fertility_by_generation<'a>(
    index: &RelationshipIndex<'a>,
    generation: &str,
    limit: usize,
) -> Fertility<'a> {
    fertility(index.generation(generation).iter().copied(), index, limit)
}

/// Highest mitosis credit holders; unparseable credits sort last.
pub fn top_mitosis_credits(records: &[Record], limit: usize) -> Vec<&Record> {
    let mut ranked: Vec<&Record> = records.iter().collect();
    ranked.sort_by(|a, b| b.mitosis_credits_value().cmp(&a.mitosis_credits_value()));
    ranked.truncate(limit);
    ranked
}

/// Distinct body types of one generation, in first-seen order.
pub fn body_types_by_generation(index: &RelationshipIndex<'_>, generation: &str) -> Vec<String> {
    group_by_body(index.generation(generation).iter().copied())
        .keys()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_and_handles_empty() {
        assert_eq!(percent(3, 4), 75);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(0, 5), 0);
    }

    #[test]
    fn unparseable_health_matches_nothing() {
        let mut record = Record::bare(1);
        record.health = Some("n/a".to_string());
        record.is_buried = Some("false".to_string());
        assert!(!is_unburied_dead(&record));
        assert!(!is_almost_dead(&record));
        assert!(!is_almost_maybe_dead(&record));
    }

    #[test]
    fn bucket_edges() {
        let with_health = |health: &str| {
            let mut record = Record::bare(1);
            record.health = Some(health.to_string());
            record
        };
        assert!(!is_almost_dead(&with_health("0")));
        assert!(is_almost_dead(&with_health("6")));
        assert!(!is_almost_dead(&with_health("7")));
        assert!(is_almost_maybe_dead(&with_health("7")));
        assert!(is_almost_maybe_dead(&with_health("10")));
        assert!(!is_almost_maybe_dead(&with_health("11")));
    }
}
