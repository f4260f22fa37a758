use std::io::{self, Write};

use serde::Serialize;

use crate::app::{QueryOutcome, SnapshotResult};
use crate::domain::Record;
use crate::query::{Fertility, HealthRisk, OneOfOne};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_snapshot(result: &SnapshotResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_outcomes(outcomes: &[QueryOutcome<'_>]) -> io::Result<()> {
        Self::print_json(&outcomes)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_snapshot(result: &SnapshotResult) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{} file has been created", result.path)?;
        writeln!(stdout, "{} records up to #{}", result.records, result.bound)?;
        if !result.missing.is_empty() {
            writeln!(stdout, "still missing after re-fetch: {}", id_list(&result.missing))?;
        }
        Ok(())
    }

    pub fn print_outcomes(outcomes: &[QueryOutcome<'_>]) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        for outcome in outcomes {
            Self::write_outcome(&mut stdout, outcome)?;
            writeln!(stdout)?;
        }
        Ok(())
    }

    pub fn write_outcome<W: Write>(out: &mut W, outcome: &QueryOutcome<'_>) -> io::Result<()> {
        match outcome {
            QueryOutcome::Population(generations) => {
                for entry in generations {
                    writeln!(
                        out,
                        "Gen {}: {} left alive, {} dead out of {} tokens: {}%",
                        entry.generation, entry.alive, entry.dead, entry.total, entry.percent_alive
                    )?;
                }
            }
            QueryOutcome::HealthRisk(risk) => write_health_risk(out, risk)?,
            QueryOutcome::MitosisLeaderboard(ranked) => {
                writeln!(out, "TOP {} BY MITOSIS CREDITS", ranked.len())?;
                for record in ranked {
                    writeln!(out, "#{}: {} credits", record.token_id, field(&record.mitosis_credits))?;
                }
            }
            QueryOutcome::BodyTypesByGen { generation, bodies } => {
                writeln!(out, "Body types in Gen {generation}: {} found", bodies.len())?;
                for body in bodies {
                    writeln!(out, "  {body}")?;
                }
            }
            QueryOutcome::Extinction(extinction) => {
                for check in &extinction.checks {
                    writeln!(
                        out,
                        "#{} has living kids? => {}",
                        check.token_id, check.has_living_descendant
                    )?;
                }
                writeln!(
                    out,
                    "Searching for extinct lineages: {} found",
                    extinction.extinct.len()
                )?;
                for body in &extinction.extinct {
                    writeln!(out, "  {body}")?;
                }
            }
            QueryOutcome::DeFactoRarity(unique) => {
                writeln!(
                    out,
                    "Searching for body types with only 1 living instance: {} found",
                    unique.len()
                )?;
                write_one_of_ones(out, unique)?;
            }
            QueryOutcome::Rarity(unique) => {
                writeln!(out, "Searching for 1/1 body types: {} found", unique.len())?;
                write_one_of_ones(out, unique)?;
            }
            QueryOutcome::Fertility(ranking) => {
                writeln!(out, "LEADERBOARDS FOR OVERALL FERTILITY")?;
                write_fertility(out, ranking)?;
            }
            QueryOutcome::FertilityByGen {
                generation,
                ranking,
            } => {
                writeln!(out, "LEADERBOARDS FOR Gen {generation}")?;
                write_fertility(out, ranking)?;
            }
        }
        Ok(())
    }
}

fn write_health_risk<W: Write>(out: &mut W, risk: &HealthRisk<'_>) -> io::Result<()> {
    if risk.almost_maybe_dead.is_empty() {
        writeln!(out, "No almost maybe dead found.")?;
    } else {
        writeln!(
            out,
            "Found tokens that MIGHT die tomorrow unless fed: {}",
            record_ids(&risk.almost_maybe_dead)
        )?;
    }
    if risk.almost_dead.is_empty() {
        writeln!(out, "No almost dead found.")?;
    } else {
        writeln!(
            out,
            "Found tokens that WILL die tomorrow unless fed: {}",
            record_ids(&risk.almost_dead)
        )?;
    }
    if risk.unburied_dead.is_empty() {
        writeln!(out, "No unburied dead found.")?;
    } else {
        writeln!(
            out,
            "Found {} unburied dead: {}",
            risk.unburied_dead.len(),
            record_ids(&risk.unburied_dead)
        )?;
    }
    for record in &risk.watch_alerts {
        writeln!(out, "!!! LOW HEALTH WATCHED #{}: {}", record.token_id, record.body)?;
    }
    Ok(())
}

fn write_one_of_ones<W: Write>(out: &mut W, unique: &[OneOfOne<'_>]) -> io::Result<()> {
    for entry in unique {
        writeln!(out, "  {}: {}", entry.record.token_id, entry.body)?;
    }
    Ok(())
}

fn write_fertility<W: Write>(out: &mut W, ranking: &Fertility<'_>) -> io::Result<()> {
    writeln!(out, "TOP {} BY OFFSPRING", ranking.by_offspring.len())?;
    for rank in &ranking.by_offspring {
        writeln!(
            out,
            "{} offspring: #{} {}",
            rank.offspring, rank.record.token_id, rank.record.body
        )?;
    }
    writeln!(out, "TOP {} BY MITOSIS CREDITS", ranking.by_credits.len())?;
    for record in &ranking.by_credits {
        writeln!(
            out,
            "{} mitosis credits: #{} {}",
            field(&record.mitosis_credits),
            record.token_id,
            record.body
        )?;
    }
    Ok(())
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

fn record_ids(records: &[&Record]) -> String {
    id_list(&records.iter().map(|record| record.token_id).collect::<Vec<_>>())
}

fn id_list(ids: &[u64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
