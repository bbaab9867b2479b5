//! Detection of simultaneous plays of the same song across stations.
//!
//! A station's log only records when each song started, so a play is assumed
//! to stay on air until the station's next logged play begins. The last play
//! of a station never ends. Plays of one `(song, artist)` whose airtimes chain
//! together form an [`OverlapGroup`].

use crate::error::Result;
use crate::play::PlayEvent;
use crate::station::Station;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Interval end of a station's last play.
const OPEN_END: NaiveDateTime = NaiveDateTime::MAX;

/// Plays of one song that were on air at the same time, chained by overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapGroup {
    /// Date of the earliest play in the group.
    pub date: NaiveDate,
    pub song: String,
    pub artist: String,
    /// Contributing stations in order of play start. A station may repeat.
    pub radios: Vec<Station>,
    /// Logged time of each play, aligned with `radios`.
    pub times: Vec<String>,
}

impl OverlapGroup {
    pub fn radio_count(&self) -> usize {
        self.radios.len()
    }

    fn from_chain(chain: &[Airing<'_>]) -> Self {
        let first = chain[0].event;
        OverlapGroup {
            date: first.date,
            song: first.song.clone(),
            artist: first.artist.clone(),
            radios: chain.iter().map(|a| a.event.radio).collect(),
            times: chain.iter().map(|a| a.event.time.clone()).collect(),
        }
    }
}

/// A play together with its approximated airtime `[start, end)`.
#[derive(Debug, Clone, Copy)]
struct Airing<'a> {
    event: &'a PlayEvent,
    /// Position in the caller's slice, the last tie-breaker.
    order: usize,
    start: NaiveDateTime,
    end: NaiveDateTime,
}

/// Find every group of two or more chained plays of the same song.
///
/// Groups are ordered by `(song, artist)` and then by start time. Fails on the
/// first play whose timestamp cannot be parsed, since one bad timestamp would
/// shift the airtime of every play around it on that station.
pub fn detect_overlaps(events: &[PlayEvent]) -> Result<Vec<OverlapGroup>> {
    let airings = assign_intervals(events)?;
    let partitions = partition_by_identity(airings);
    let identities = partitions.len();

    let groups: Vec<OverlapGroup> = partitions
        .into_values()
        .flat_map(merge_chains)
        .collect();

    info!(
        "Overlap detection: {} plays, {} distinct songs, {} groups",
        events.len(),
        identities,
        groups.len()
    );
    Ok(groups)
}

/// Give every play an airtime ending where the station's next play starts.
fn assign_intervals(events: &[PlayEvent]) -> Result<Vec<Airing<'_>>> {
    let starts = events
        .iter()
        .map(PlayEvent::timestamp)
        .collect::<Result<Vec<_>>>()?;

    let mut by_station: BTreeMap<Station, Vec<usize>> = BTreeMap::new();
    for (i, event) in events.iter().enumerate() {
        by_station.entry(event.radio).or_default().push(i);
    }

    let mut airings = Vec::with_capacity(events.len());
    for (station, mut indices) in by_station {
        // Stable: plays logged at the same minute keep their input order.
        indices.sort_by_key(|&i| starts[i]);
        debug!("{}: {} plays", station, indices.len());

        let ends = indices
            .iter()
            .skip(1)
            .map(|&i| starts[i])
            .chain(std::iter::once(OPEN_END));
        for (&i, end) in indices.iter().zip(ends) {
            airings.push(Airing {
                event: &events[i],
                order: i,
                start: starts[i],
                end,
            });
        }
    }
    Ok(airings)
}

fn partition_by_identity(airings: Vec<Airing<'_>>) -> BTreeMap<(&str, &str), Vec<Airing<'_>>> {
    let mut partitions: BTreeMap<(&str, &str), Vec<Airing<'_>>> = BTreeMap::new();
    for airing in airings {
        partitions
            .entry(airing.event.identity())
            .or_default()
            .push(airing);
    }
    partitions
}

/// Split one song's plays into chains and keep those with more than one play.
///
/// A play joins the running chain unless it starts strictly after the end of
/// the play right before it. Comparing with the previous play, and not with
/// the furthest end seen so far, is what lets A-B-C chain through B while a
/// long A alone does not pull in a later, unrelated C.
fn merge_chains(mut partition: Vec<Airing<'_>>) -> Vec<OverlapGroup> {
    // Same-minute plays: station tag first, then input order.
    partition.sort_by_key(|a| (a.start, a.event.radio, a.order));

    let mut chains: Vec<Vec<Airing<'_>>> = Vec::new();
    let mut previous_end: Option<NaiveDateTime> = None;
    for airing in partition {
        let extends = previous_end.is_some_and(|end| airing.start <= end);
        match chains.last_mut() {
            Some(chain) if extends => chain.push(airing),
            _ => chains.push(vec![airing]),
        }
        previous_end = Some(airing.end);
    }

    chains
        .iter()
        .filter(|chain| chain.len() > 1)
        .map(|chain| OverlapGroup::from_chain(chain))
        .collect()
}

/// Number of groups per `(song, artist)`, most frequent first, ties by identity.
pub fn count_by_identity(groups: &[OverlapGroup]) -> Vec<((String, String), usize)> {
    let mut counts: BTreeMap<(String, String), usize> = BTreeMap::new();
    for group in groups {
        *counts
            .entry((group.song.clone(), group.artist.clone()))
            .or_default() += 1;
    }
    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    counts
}

/// Number of groups per date.
pub fn count_by_date(groups: &[OverlapGroup]) -> BTreeMap<NaiveDate, usize> {
    let mut counts = BTreeMap::new();
    for group in groups {
        *counts.entry(group.date).or_default() += 1;
    }
    counts
}
