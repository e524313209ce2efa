//! Dashboard summary counts.

use crate::registry::StatusRegistry;
use serde::Serialize;
use std::collections::BTreeMap;
use trade_types::{Entity, EntityKind};

/// Counts per dashboard bucket for one entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
	pub kind: EntityKind,
	pub total: usize,
	/// Every bucket of the kind, zero-filled.
	pub by_status: BTreeMap<String, usize>,
	/// Entities not yet in a terminal status.
	pub open: usize,
	pub closed: usize,
}

/// Pure, single-pass aggregation over entity collections.
pub struct AggregateStatsCalculator;

impl AggregateStatsCalculator {
	/// Summarizes the entities of `kind` in `entities`; others are skipped.
	pub fn summarize<'a, I>(kind: EntityKind, entities: I) -> Summary
	where
		I: IntoIterator<Item = &'a Entity>,
	{
		let mut by_status: BTreeMap<String, usize> = StatusRegistry::buckets(kind)
			.into_iter()
			.map(|bucket| (bucket.to_string(), 0))
			.collect();
		let mut total = 0;
		let mut closed = 0;

		for entity in entities {
			if entity.kind != kind {
				continue;
			}
			total += 1;
			if StatusRegistry::is_terminal(kind, entity.status) {
				closed += 1;
			}
			*by_status
				.entry(StatusRegistry::bucket(entity.status).to_string())
				.or_insert(0) += 1;
		}

		Summary {
			kind,
			total,
			by_status,
			open: total - closed,
			closed,
		}
	}
}
